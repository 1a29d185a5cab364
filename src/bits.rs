//! Fixed-capacity bit buffers between codes and byte-oriented I/O.

use std::io::{self, ErrorKind, Read, Write};

use log::trace;

use crate::code::Code;
use crate::error::{HuffmanError, Result};

/// Packs codes MSB-first into a fixed byte buffer, flushing it to `sink`
/// each time it fills.
pub struct BitWriter<W: Write> {
    sink: W,
    buffer: Vec<u8>,
    /// Bits used in `buffer`; always below `buffer.len() * 8` between calls.
    bit_len: usize,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(sink: W, capacity: usize) -> Result<Self> {
        check_capacity(capacity)?;
        Ok(Self {
            sink,
            buffer: vec![0; capacity],
            bit_len: 0,
            bits_written: 0,
        })
    }

    /// Appends every bit of `code`.
    pub fn pack(&mut self, code: &Code) -> Result<()> {
        let mut remaining = code.len() as usize;
        for &byte in code.bytes() {
            let take = remaining.min(8);
            self.put(byte, take)?;
            remaining -= take;
        }
        self.bits_written += code.len() as u64;
        Ok(())
    }

    /// Writes the `take` high bits of `byte` at the current offset. A byte
    /// boundary crossing costs exactly two stores.
    fn put(&mut self, byte: u8, take: usize) -> Result<()> {
        let byte = byte & !(0xFFu8.checked_shr(take as u32).unwrap_or(0));
        let offset = self.bit_len % 8;
        let room = 8 - offset;

        self.buffer[self.bit_len / 8] |= byte >> offset;
        if take <= room {
            self.bit_len += take;
            return self.flush_if_full();
        }
        self.bit_len += room;
        self.flush_if_full()?;

        self.buffer[self.bit_len / 8] |= byte << room;
        self.bit_len += take - room;
        self.flush_if_full()
    }

    fn flush_if_full(&mut self) -> Result<()> {
        if self.bit_len == self.buffer.len() * 8 {
            trace!("Bit buffer full, flushing {} bytes", self.buffer.len());
            self.sink.write_all(&self.buffer)?;
            self.buffer.fill(0);
            self.bit_len = 0;
        }
        Ok(())
    }

    /// Total bits packed so far.
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Writes the whole bytes plus the partially filled last byte, whose
    /// unused low bits stay zero, and hands back the sink.
    pub fn finish(mut self) -> Result<W> {
        let tail = self.bit_len.div_ceil(8);
        self.sink.write_all(&self.buffer[..tail])?;
        self.sink.flush()?;
        self.buffer.fill(0);
        self.bit_len = 0;
        Ok(self.sink)
    }
}

/// Replays a byte source one bit at a time, MSB-first, refilling a fixed
/// buffer as it drains.
pub struct BitReader<R: Read> {
    source: R,
    buffer: Vec<u8>,
    filled: usize,
    /// Next bit to hand out, in `0..=filled * 8`.
    position: usize,
}

impl<R: Read> BitReader<R> {
    pub fn new(source: R, capacity: usize) -> Result<Self> {
        check_capacity(capacity)?;
        Ok(Self {
            source,
            buffer: vec![0; capacity],
            filled: 0,
            position: 0,
        })
    }

    /// Next bit, or `None` once the source is exhausted.
    pub fn next_bit(&mut self) -> Result<Option<bool>> {
        if self.position == self.filled * 8 && !self.refill()? {
            return Ok(None);
        }
        let byte = self.buffer[self.position / 8];
        let bit = byte & (0x80 >> (self.position % 8)) != 0;
        self.position += 1;
        Ok(Some(bit))
    }

    fn refill(&mut self) -> Result<bool> {
        self.filled = read_chunk(&mut self.source, &mut self.buffer)?;
        self.position = 0;
        Ok(self.filled > 0)
    }
}

pub(crate) fn check_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(HuffmanError::InvalidConfig {
            message: "bit buffer capacity must be non-zero".to_string(),
        });
    }
    Ok(())
}

/// Reads up to `buffer.len()` bytes, retrying interrupted reads. Zero means end of stream.
pub(crate) fn read_chunk<R: Read + ?Sized>(source: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    loop {
        match source.read(buffer) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}
