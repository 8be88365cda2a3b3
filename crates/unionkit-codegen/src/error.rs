//! Errors raised by the manifest loader and the output writers.
//!
//! Problems found while evaluating declarations are not errors; they are
//! reported as [`Diagnostic`](crate::Diagnostic)s on the generation output.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to scan `{}`: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid declaration manifest {origin}: {source}")]
    Manifest {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
