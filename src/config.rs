use crate::error::{HuffmanError, Result};

/// Default size of every I/O staging buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Per-call tuning of the stream driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    buffer_size: usize,
}

impl CodecConfig {
    /// `buffer_size` is the capacity in bytes of the read buffer and of the
    /// bit packer / unpacker buffers.
    pub fn new(buffer_size: usize) -> Result<Self> {
        if buffer_size == 0 {
            return Err(HuffmanError::InvalidConfig {
                message: "buffer size must be at least one byte".to_string(),
            });
        }
        Ok(Self { buffer_size })
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}
