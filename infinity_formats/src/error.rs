use thiserror::Error;

use crate::cre::CreVersion;

/// Failures raised while decoding or encoding on-disk records.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The stream does not start with a signature this crate understands.
    #[error("unsupported format signature {signature:?}")]
    UnsupportedFormat { signature: String },

    /// The record was recognised but no encoder exists for the requested layout.
    #[error("no encoder mapping for {version:?} in {mode} mode")]
    UnsupportedVersion {
        version: CreVersion,
        mode: &'static str,
    },

    /// A declared section reaches past the end of the stream.
    #[error(
        "{section} truncated: needs bytes {start:#x}..{end:#x} but stream holds {len:#x}"
    )]
    TruncatedRecord {
        section: &'static str,
        start: u64,
        end: u64,
        len: u64,
    },

    /// Text tables (IDS/2DA) that cannot be parsed.
    #[error("malformed {kind} table: {reason}")]
    MalformedTable { kind: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FormatError>;
