//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad credentials, unknown task)
//! - 4: Operation failed (I/O, corrupt storage)

use std::path::PathBuf;
use thiserror::Error;

pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task id prefix '{0}' matches more than one task")]
    AmbiguousTask(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration in {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidCredentials
            | Error::NotLoggedIn
            | Error::TaskNotFound(_)
            | Error::AmbiguousTask(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig { .. } => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::Csv(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_exit_with_two() {
        assert_eq!(Error::InvalidCredentials.exit_code(), exit_codes::USER_ERROR);
        assert_eq!(Error::NotLoggedIn.exit_code(), exit_codes::USER_ERROR);
        assert_eq!(
            Error::TaskNotFound("abc".into()).exit_code(),
            exit_codes::USER_ERROR
        );
    }

    #[test]
    fn corrupt_storage_is_an_operation_failure() {
        let err: Error = serde_json::from_str::<Vec<u8>>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn login_failure_message_is_user_facing() {
        assert_eq!(Error::InvalidCredentials.to_string(), "Invalid credentials");
    }
}
