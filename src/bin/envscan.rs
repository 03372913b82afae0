use std::env;
use std::ffi::OsString;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{self, Command};

use envscan::{EnvLoader, EnvMap, Error};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILE: &str = ".env";

const HELP: &str = "\
envscan - scan dotenv files and use the resolved variables

Usage:
  envscan run [OPTIONS] -- COMMAND [ARGS...]
  envscan run [OPTIONS] COMMAND [ARGS...]
  envscan print [OPTIONS]
  envscan --help
  envscan --version

Commands:
  run       Load dotenv files and execute a command
  print     Print the resolved variables as dotenv lines
";

const RUN_HELP: &str = "\
envscan run - load dotenv files and execute a command

Usage:
  envscan run [OPTIONS] -- COMMAND [ARGS...]
  envscan run [OPTIONS] COMMAND [ARGS...]

Options:
  -f, --file <PATHS>      Dotenv file path(s), read in order. Repeat or pass
                          comma-separated paths. Defaults to .env.
  -o, --override          Override existing environment variables.
  -v, --verbose           Print loader diagnostics to stderr.
  -q, --quiet             Suppress loader diagnostics.
  -h, --help              Show this help text.
";

const PRINT_HELP: &str = "\
envscan print - print the resolved variables as dotenv lines

Usage:
  envscan print [OPTIONS]

Options:
  -f, --file <PATHS>      Dotenv file path(s), read in order. Repeat or pass
                          comma-separated paths. Defaults to .env.
  -v, --verbose           Print loader diagnostics to stderr.
  -q, --quiet             Suppress loader diagnostics.
  -h, --help              Show this help text.
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Parsed<T> {
    Help,
    Execute(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct RunOptions {
    files: Vec<PathBuf>,
    override_existing: bool,
    verbosity: Verbosity,
    command: OsString,
    args: Vec<OsString>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct PrintOptions {
    files: Vec<PathBuf>,
    verbosity: Verbosity,
}

fn main() {
    process::exit(run(env::args_os()));
}

fn run(args: impl IntoIterator<Item = OsString>) -> i32 {
    let mut args = args.into_iter();
    let _bin = args.next();

    let Some(subcommand) = args.next() else {
        print_help();
        return 0;
    };

    let subcommand = subcommand.to_string_lossy();
    match subcommand.as_ref() {
        "-h" | "--help" | "help" => {
            print_help();
            0
        }
        "-V" | "--version" | "version" => {
            print_version();
            0
        }
        "run" => match parse_run_options(args.collect()) {
            Ok(Parsed::Help) => {
                println!("{RUN_HELP}");
                0
            }
            Ok(Parsed::Execute(options)) => {
                init_tracing(options.verbosity);
                report(execute_run(options))
            }
            Err(err) => usage_error(&err, "run"),
        },
        "print" => match parse_print_options(args.collect()) {
            Ok(Parsed::Help) => {
                println!("{PRINT_HELP}");
                0
            }
            Ok(Parsed::Execute(options)) => {
                init_tracing(options.verbosity);
                report(execute_print(options))
            }
            Err(err) => usage_error(&err, "print"),
        },
        unknown => {
            eprintln!("envscan: unknown subcommand `{unknown}`");
            eprintln!("Try `envscan --help`.");
            1
        }
    }
}

fn report(result: Result<i32, String>) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("envscan: {err}");
            1
        }
    }
}

fn usage_error(err: &str, subcommand: &str) -> i32 {
    eprintln!("envscan: {err}");
    eprintln!("Try `envscan {subcommand} --help`.");
    1
}

fn init_tracing(verbosity: Verbosity) {
    let filter = match verbosity {
        Verbosity::Quiet => EnvFilter::new("error"),
        Verbosity::Normal => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        }
        Verbosity::Verbose => EnvFilter::new("debug"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn parse_run_options(args: Vec<OsString>) -> Result<Parsed<RunOptions>, String> {
    let mut options = RunOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        let token = args[index].to_string_lossy();
        match token.as_ref() {
            "--" => {
                index += 1;
                break;
            }
            "-h" | "--help" => return Ok(Parsed::Help),
            "-f" | "--file" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    return Err("missing value for `-f/--file`".to_owned());
                };
                parse_file_text(&value.to_string_lossy(), &mut options.files)?;
                index += 1;
            }
            value if value.starts_with("--file=") => {
                parse_file_text(&value["--file=".len()..], &mut options.files)?;
                index += 1;
            }
            "-o" | "--override" => {
                options.override_existing = true;
                index += 1;
            }
            "-v" | "--verbose" => {
                options.verbosity = Verbosity::Verbose;
                index += 1;
            }
            "-q" | "--quiet" => {
                options.verbosity = Verbosity::Quiet;
                index += 1;
            }
            unknown if unknown.starts_with('-') => {
                return Err(format!("unknown option `{unknown}`"));
            }
            _ => break,
        }
    }

    let remaining = &args[index..];
    let Some((command, command_args)) = remaining.split_first() else {
        return Err("missing command after `run`".to_owned());
    };

    default_files(&mut options.files);
    options.command = command.clone();
    options.args = command_args.to_vec();
    Ok(Parsed::Execute(options))
}

fn parse_print_options(args: Vec<OsString>) -> Result<Parsed<PrintOptions>, String> {
    let mut options = PrintOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        let token = args[index].to_string_lossy();
        match token.as_ref() {
            "-h" | "--help" => return Ok(Parsed::Help),
            "-f" | "--file" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    return Err("missing value for `-f/--file`".to_owned());
                };
                parse_file_text(&value.to_string_lossy(), &mut options.files)?;
            }
            value if value.starts_with("--file=") => {
                parse_file_text(&value["--file=".len()..], &mut options.files)?;
            }
            "-v" | "--verbose" => options.verbosity = Verbosity::Verbose,
            "-q" | "--quiet" => options.verbosity = Verbosity::Quiet,
            unexpected => return Err(format!("unexpected argument `{unexpected}`")),
        }
        index += 1;
    }

    default_files(&mut options.files);
    Ok(Parsed::Execute(options))
}

fn parse_file_text(raw: &str, files: &mut Vec<PathBuf>) -> Result<(), String> {
    let mut added = 0usize;
    for segment in raw.split(',') {
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            continue;
        }
        files.push(PathBuf::from(trimmed));
        added += 1;
    }
    if added == 0 {
        return Err("`-f/--file` requires at least one path".to_owned());
    }
    Ok(())
}

fn default_files(files: &mut Vec<PathBuf>) {
    if files.is_empty() {
        files.push(PathBuf::from(DEFAULT_FILE));
    }
}

fn read_session(files: &[PathBuf]) -> Result<EnvMap, Error> {
    EnvLoader::new().paths(files).read()
}

fn execute_run(options: RunOptions) -> Result<i32, String> {
    let vars = read_session(&options.files).map_err(|err| err.to_string())?;
    let mut command = Command::new(&options.command);
    command.args(&options.args);

    for (key, value) in vars {
        let inherited = env::var_os(&key).is_some_and(|inherited| !inherited.is_empty());
        if !options.override_existing && inherited {
            tracing::debug!(key = %key, "keeping inherited value");
            continue;
        }
        command.env(key, value);
    }

    execute_command(command, &options.command)
}

fn execute_print(options: PrintOptions) -> Result<i32, String> {
    let vars = read_session(&options.files).map_err(|err| err.to_string())?;
    print!("{}", render(&vars));
    Ok(0)
}

/// Render variables as double-quoted dotenv lines that scan back to the same map.
fn render(env: &EnvMap) -> String {
    let mut out = String::new();
    for (key, value) in env {
        out.push_str(key);
        out.push_str("=\"");
        for ch in value.chars() {
            if matches!(ch, '\\' | '"' | '$') {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push_str("\"\n");
    }
    out
}

#[cfg(unix)]
fn execute_command(mut command: Command, program: &OsString) -> Result<i32, String> {
    let err = command.exec();
    Err(format!(
        "failed to execute `{}`: {err}",
        program.to_string_lossy()
    ))
}

#[cfg(not(unix))]
fn execute_command(mut command: Command, program: &OsString) -> Result<i32, String> {
    let status = command
        .status()
        .map_err(|err| format!("failed to execute `{}`: {err}", program.to_string_lossy()))?;
    Ok(status.code().unwrap_or(1))
}

fn print_help() {
    println!("{HELP}");
}

fn print_version() {
    println!("envscan {}", env!("CARGO_PKG_VERSION"));
}
