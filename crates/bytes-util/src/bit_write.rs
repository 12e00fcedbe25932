use std::io;

/// A writer that packs bits MSB first into an [`io::Write`].
///
/// Whole bytes are forwarded to the inner writer as soon as they are complete,
/// so wrapping an emulation prevention writer works byte by byte.
#[derive(Debug)]
#[must_use]
pub struct BitWriter<W> {
    writer: W,
    /// Pending bits, right aligned.
    cache: u8,
    bits_in_cache: u8,
    bits_written: u64,
}

impl<W: Default> Default for BitWriter<W> {
    fn default() -> Self {
        Self::new(W::default())
    }
}

impl<W: io::Write> BitWriter<W> {
    /// Writes a single bit.
    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.write_bits(bit as u64, 1)
    }

    /// Writes the low `count` bits of `bits`, most significant first.
    ///
    /// Fails if `bits` does not fit in `count` bits.
    pub fn write_bits(&mut self, bits: u64, count: u8) -> io::Result<()> {
        let count = count.min(64);

        if count != 64 && bits >> count != 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bits too large to write"));
        }

        let mut left = count;
        while left > 0 {
            let free = 8 - self.bits_in_cache;
            let take = free.min(left);
            let chunk = ((bits >> (left - take)) & ((1u64 << take) - 1)) as u8;

            // take <= 8, and take == 8 only when the cache is empty
            self.cache = if take == 8 { chunk } else { (self.cache << take) | chunk };
            self.bits_in_cache += take;
            left -= take;

            if self.bits_in_cache == 8 {
                self.writer.write_all(&[self.cache])?;
                self.cache = 0;
                self.bits_in_cache = 0;
            }
        }

        self.bits_written += count as u64;
        Ok(())
    }

    /// Writes `rbsp_trailing_bits()`: a stop bit followed by zero bits up to
    /// the byte boundary.
    pub fn write_rbsp_trailing_bits(&mut self) -> io::Result<()> {
        self.write_bit(true)?;
        self.align()
    }

    /// Pads with zero bits up to the byte boundary.
    pub fn align(&mut self) -> io::Result<()> {
        if !self.is_aligned() {
            self.write_bits(0, 8 - self.bit_pos())?;
        }

        Ok(())
    }

    /// Aligns the writer and returns the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.align()?;
        Ok(self.writer)
    }
}

impl<W> BitWriter<W> {
    /// Creates a new BitWriter from a writer
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            cache: 0,
            bits_in_cache: 0,
            bits_written: 0,
        }
    }

    /// Bit offset inside the current byte (0-7)
    #[inline(always)]
    #[must_use]
    pub const fn bit_pos(&self) -> u8 {
        self.bits_in_cache
    }

    /// Total number of bits written so far
    #[inline(always)]
    #[must_use]
    pub const fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Checks if the writer is aligned to the byte boundary
    #[inline(always)]
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bits_in_cache == 0
    }

    /// Returns a reference to the underlying writer
    #[inline(always)]
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: io::Write> io::Write for BitWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.is_aligned() {
            let written = self.writer.write(buf)?;
            self.bits_written += written as u64 * 8;
            return Ok(written);
        }

        for byte in buf {
            self.write_bits(*byte as u64, 8)?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
