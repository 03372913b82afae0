//! Scan `.env` files into a map of resolved variables.
//!
//! Values may reference variables defined earlier in the same file or in a
//! file read earlier in the same session, as `$NAME` or `${NAME}`.
//!
//! [`parse_str`], [`parse_bytes`] and [`EnvLoader::read`] are side-effect free.
//! [`load`] and [`dotenv`] export into the process environment and are
//! `unsafe`, because callers must guarantee no concurrent process-environment
//! access.

mod env;
mod error;
mod loader;
mod model;
mod parser;

pub use env::TargetEnv;
pub use error::{Error, ParseError, ParseErrorKind};
pub use loader::{EnvLoader, dotenv, load, read};
pub use model::{EnvMap, LoadReport};
pub use parser::{parse_bytes, parse_into, parse_reader, parse_str};
