use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error reading file [{}], {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error parsing file [{}], {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Syntax(#[from] ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The parser error behind this failure, if any.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse { source, .. } => Some(source),
            Self::Syntax(err) => Some(err),
            Self::Read { .. } | Self::Io(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}, line {line}:{column}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: u32, column: u32, kind: ParseErrorKind) -> Self {
        Self { line, column, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A statement is missing its key or `=`. `found` is `None` at end of input.
    UnexpectedSymbol {
        expected: &'static str,
        found: Option<u8>,
    },
    /// A quote was opened but the line or input ended before it closed.
    UnterminatedQuote { partial: String },
}

impl Display for ParseErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedSymbol { expected, found } => {
                write!(f, "expected \"{expected}\", found ")?;
                match found {
                    Some(byte) => write!(f, "\"{}\"", char::from(*byte).escape_default()),
                    None => write!(f, "end of file"),
                }
            }
            Self::UnterminatedQuote { partial } => {
                write!(f, "unterminated quoted value \"{partial}\"")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_symbol_message_names_both_symbols() {
        let err = ParseError::new(
            1,
            7,
            ParseErrorKind::UnexpectedSymbol {
                expected: "=",
                found: Some(b'v'),
            },
        );
        assert_eq!(err.to_string(), "expected \"=\", found \"v\", line 1:7");
    }

    #[test]
    fn unexpected_end_of_file_message() {
        let kind = ParseErrorKind::UnexpectedSymbol {
            expected: "=",
            found: None,
        };
        assert_eq!(kind.to_string(), "expected \"=\", found end of file");
    }

    #[test]
    fn file_context_wraps_parser_message() {
        let err = Error::Parse {
            path: PathBuf::from("./.env-file"),
            source: ParseError::new(
                1,
                7,
                ParseErrorKind::UnexpectedSymbol {
                    expected: "=",
                    found: Some(b'v'),
                },
            ),
        };
        assert_eq!(
            err.to_string(),
            "error parsing file [./.env-file], expected \"=\", found \"v\", line 1:7"
        );
        assert!(err.parse_error().is_some());
    }
}
