// I don't really care, and it's not important for this project
#![allow(clippy::result_large_err)]

pub mod api;
pub mod cache;
pub mod config;
mod error;
pub mod session;
pub mod studio;

pub use studio::display::deserialize_result;
pub use studio::serializer::serialize;

pub use error::{Action, Error, ErrorKind, InternalError, ValidationError};
