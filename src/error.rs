//! Error types for the to-do manager.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Operation failed (I/O, malformed data, bad input)
//! - 2: Usage error (reported by clap before we run)
//! - 3: Authentication failure

use std::path::PathBuf;

use thiserror::Error;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const OPERATION_FAILED: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH_FAILED: i32 = 3;
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse {}: {source}", path.display())]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid recurrence expression '{expr}': {reason}")]
    InvalidRecurrence { expr: String, reason: String },

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Input closed")]
    InputClosed,
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::AuthenticationFailed => exit_codes::AUTH_FAILED,
            _ => exit_codes::OPERATION_FAILED,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
