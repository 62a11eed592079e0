// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Root error type for every kernel failure.
///
/// All variants are fatal for the run that produced them. Windowing
/// underflow is deliberately absent: a trajectory that is too short for
/// the requested windows yields an empty plan, not an error.
#[derive(Error, Debug)]
pub enum L96Error {
    /// Invalid or mutually inconsistent parameters.
    #[error("config error: {0}")]
    Config(String),

    /// State left the finite/bounded envelope during integration.
    #[error("numerical instability at step {step}: {detail}")]
    Unstable { step: u64, detail: String },

    /// Filesystem failure, always tagged with the offending path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed binary array file on read.
    #[error("format error: {0}")]
    Format(String),

    /// Malformed caller input (length mismatch, index out of range).
    #[error("validation error: {0}")]
    Validation(String),
}

impl L96Error {
    /// Wrap an `io::Error` with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type L96Result<T> = Result<T, L96Error>;
