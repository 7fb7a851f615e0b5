use thiserror::Error;

/// The errors that may occur while decrypting a container.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream is not a well formed container (bad magic, truncated or
    /// misaligned blocks, invalid padding).
    #[error("invalid ncm container: {0}")]
    Format(String),

    /// The metadata block decrypted but could not be decoded.
    #[error("invalid ncm metadata: {0}")]
    Metadata(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn format<T: Into<String>>(reason: T) -> Self {
        Self::Format(reason.into())
    }

    pub(crate) fn metadata<T: Into<String>>(reason: T) -> Self {
        Self::Metadata(reason.into())
    }

    /// Returns true if the error is a container format error.
    pub fn is_format_err(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Returns true if the error is a metadata decoding error.
    pub fn is_metadata_err(&self) -> bool {
        matches!(self, Self::Metadata(_))
    }
}
