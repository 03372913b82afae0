use std::io::Read;

use crate::error::{Error, ParseError, ParseErrorKind};
use crate::model::EnvMap;

/// Parse dotenv entries from text into a fresh map.
pub fn parse_str(input: &str) -> Result<EnvMap, ParseError> {
    parse_bytes(input.as_bytes())
}

/// Parse dotenv entries from raw bytes into a fresh map.
///
/// Nothing is returned on failure, even if earlier statements were valid.
pub fn parse_bytes(input: &[u8]) -> Result<EnvMap, ParseError> {
    let mut env = EnvMap::new();
    parse_into(input, &mut env)?;
    Ok(env)
}

/// Parse dotenv entries from a reader. The whole input is buffered first.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<EnvMap, Error> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(parse_bytes(&buf)?)
}

/// Parse one file's contents into an existing session map.
///
/// References resolve against everything already in `env`, so files parsed
/// earlier into the same map are visible to this one. Duplicate keys are
/// overwritten. On failure, statements committed before the failing one stay
/// in `env`.
pub fn parse_into(input: &[u8], env: &mut EnvMap) -> Result<(), ParseError> {
    Scanner::new(input, env).run()
}

/// Forward-only cursor over one input buffer with a single byte of lookback.
///
/// `current` is `None` once the input is exhausted.
struct Scanner<'a> {
    input: &'a [u8],
    env: &'a mut EnvMap,
    position: usize,
    current: Option<u8>,
    previous: Option<u8>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a [u8], env: &'a mut EnvMap) -> Self {
        Self {
            input,
            env,
            position: 0,
            current: None,
            previous: None,
        }
    }

    fn run(mut self) -> Result<(), ParseError> {
        self.next();
        self.skip_space(true);

        while let Some(byte) = self.current {
            if byte == b'#' {
                self.skip_comment();
                self.skip_space(true);
                continue;
            }

            let key = self.read_key();
            if key.is_empty() && self.current == Some(b'=') {
                return Err(self.unexpected("key"));
            }
            self.skip_space(false);
            if self.current != Some(b'=') {
                return Err(self.unexpected("="));
            }
            self.next();
            self.skip_space(false);

            let value = self.read_value()?;
            self.env.insert(key, value);
            self.skip_space(true);
        }

        Ok(())
    }

    fn next(&mut self) {
        self.previous = self.current;
        self.current = self.input.get(self.position).copied();
        if self.current.is_some() {
            self.position += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    /// Byte offset of `current`, or the input length at end of input.
    fn offset(&self) -> usize {
        match self.current {
            Some(_) => self.position - 1,
            None => self.input.len(),
        }
    }

    fn skip_space(&mut self, newlines: bool) {
        while let Some(byte) = self.current {
            match byte {
                b' ' | b'\t' => {}
                b'\r' if self.peek() == Some(b'\n') => {}
                b'\n' if newlines => {}
                _ => return,
            }
            self.next();
        }
    }

    fn skip_comment(&mut self) {
        while !matches!(self.current, None | Some(b'\n')) {
            self.next();
        }
    }

    fn read_key(&mut self) -> String {
        let mut key = String::new();
        while let Some(byte) = self.current.filter(|byte| is_name_byte(*byte)) {
            key.push(char::from(byte));
            self.next();
        }
        key
    }

    fn read_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.current {
            Some(delimiter @ (b'"' | b'\'')) => {
                self.next();
                Some(delimiter)
            }
            _ => None,
        };

        let mut value = Vec::new();
        while let Some(byte) = self.current {
            match byte {
                b'\n' => break,
                b'\\' => match self.peek() {
                    None | Some(b'\n') => {
                        value.push(byte);
                        self.next();
                    }
                    Some(escaped) => {
                        self.next();
                        value.push(escaped);
                        self.next();
                    }
                },
                b'#' if quote.is_none() && matches!(self.previous, Some(b' ' | b'=')) => break,
                b'$' => {
                    self.next();
                    self.read_reference(&mut value);
                }
                _ if Some(byte) == quote => {
                    self.next();
                    return Ok(decode(&value));
                }
                _ => {
                    value.push(byte);
                    self.next();
                }
            }
        }

        if quote.is_some() {
            return Err(self.error(ParseErrorKind::UnterminatedQuote {
                partial: decode(&value),
            }));
        }
        Ok(decode(trim_blank(&value)))
    }

    /// Expand a reference whose `$` was just consumed.
    ///
    /// A `${` that never closes is written back as literal text and scanning
    /// resumes at the byte that failed to close it.
    fn read_reference(&mut self, value: &mut Vec<u8>) {
        let braced = self.current == Some(b'{');
        if braced {
            self.next();
        }

        let name = self.read_key();
        if braced {
            if self.current != Some(b'}') {
                tracing::trace!(
                    reference = %name,
                    offset = self.offset(),
                    "unclosed variable reference kept as literal text"
                );
                value.extend_from_slice(b"${");
                value.extend_from_slice(name.as_bytes());
                return;
            }
            self.next();
        }

        if let Some(resolved) = self.env.get(&name) {
            value.extend_from_slice(resolved.as_bytes());
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        self.error(ParseErrorKind::UnexpectedSymbol {
            expected,
            found: self.current,
        })
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let offset = self.offset();
        let consumed = &self.input[..offset];
        let line = consumed.iter().filter(|byte| **byte == b'\n').count() + 1;
        let line_start = consumed
            .iter()
            .rposition(|byte| *byte == b'\n')
            .map_or(0, |idx| idx + 1);

        ParseError::new(to_u32(line), to_u32(offset - line_start + 1), kind)
    }
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn trim_blank(value: &[u8]) -> &[u8] {
    let is_blank = |byte: &u8| matches!(byte, b' ' | b'\t' | b'\r');
    let start = value
        .iter()
        .position(|byte| !is_blank(byte))
        .unwrap_or(value.len());
    let end = value
        .iter()
        .rposition(|byte| !is_blank(byte))
        .map_or(start, |idx| idx + 1);
    &value[start..end]
}

fn decode(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
