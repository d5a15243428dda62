use std::path::PathBuf;

use thiserror::Error;

/// Error surface for instance provisioning.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("download of {url} failed with HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("cannot derive a file name from {url}")]
    JarName { url: String },

    #[error("unpacking {jar} exited with {status}")]
    Unpack { jar: PathBuf, status: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> InstallError {
    InstallError::Io {
        path: path.into(),
        source,
    }
}
