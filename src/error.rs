//! Error type shared by every stage of the codec.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HuffmanError {
    /// Reading the source or writing the sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The compressed stream is malformed or truncated.
    #[error("corrupt archive: {message}")]
    CorruptArchive { message: String },

    /// The source did not yield the same bytes on both compression passes.
    #[error("source changed between passes: {message}")]
    SourceChanged { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl HuffmanError {
    pub fn corrupt(message: impl Into<String>) -> Self {
        HuffmanError::CorruptArchive {
            message: message.into(),
        }
    }

    /// Maps an unexpected end of input to a corrupt archive; other I/O errors pass through.
    pub fn from_read(err: std::io::Error, what: &str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            HuffmanError::corrupt(format!("truncated {}", what))
        } else {
            HuffmanError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, HuffmanError>;
