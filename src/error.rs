//! Error taxonomy for storepack.
//!
//! Core modules return these typed errors; the command layer converts them
//! into `anyhow` for reporting. Every error here is fatal for the package
//! being built — nothing is retried and no partial spec is ever written.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The package description could not be read, parsed, or validated.
    #[error("invalid package description: {0}")]
    Config(String),

    /// An archive could not be opened or a member header is corrupt.
    #[error("failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required spec field had no value at finalize time.
    #[error("required spec field `{0}` has no value")]
    MissingField(&'static str),

    /// An external tool ran but exited non-zero.
    #[error("`{tool}` exited with code {code}")]
    Tool { tool: String, code: i32 },

    /// An external tool could not be launched at all.
    #[error("failed to launch `{tool}`: {source}")]
    ToolMissing {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
