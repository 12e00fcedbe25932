use std::io;

/// A cached bit reader over a byte slice.
///
/// Bits are consumed MSB first. When created with [`BitReader::new_rbsp`] the
/// reader drops emulation prevention bytes (the `0x03` in `0x00 0x00 0x03`)
/// from the logical bitstream while it refills its cache, so callers always see
/// the RBSP.
///
/// The reader is cheap to clone, which is how look-ahead operations such as
/// [`BitReader::peek_bits`] and [`BitReader::has_more_rbsp_data`] are
/// implemented.
#[derive(Debug, Clone)]
#[must_use]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Index of the next raw byte to load into the cache.
    byte: usize,
    bits_in_cache: u32,
    cache: u64,
    /// Last three raw bytes seen, used to spot `00 00 03`.
    epb_cache: u32,
    n_epb: usize,
    strip_emulation_prevention: bool,
}

impl<'a> BitReader<'a> {
    /// Creates a reader that returns every byte of `data` as is.
    pub const fn new(data: &'a [u8]) -> Self {
        Self::with_emulation_prevention(data, false)
    }

    /// Creates a reader that removes emulation prevention bytes from `data`.
    pub const fn new_rbsp(data: &'a [u8]) -> Self {
        Self::with_emulation_prevention(data, true)
    }

    const fn with_emulation_prevention(data: &'a [u8], strip_emulation_prevention: bool) -> Self {
        Self {
            data,
            byte: 0,
            bits_in_cache: 0,
            cache: 0,
            epb_cache: 0xff,
            n_epb: 0,
            strip_emulation_prevention,
        }
    }

    fn insufficient_data(nbits: u32) -> io::Error {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("insufficient data to read {nbits} bits"),
        )
    }

    /// Pulls raw bytes into the cache until it holds at least `nbits` bits.
    fn refill(&mut self, nbits: u32) -> io::Result<()> {
        if nbits > self.bits_in_cache
            && self.byte * 8 + (nbits - self.bits_in_cache) as usize > self.data.len() * 8
        {
            return Err(Self::insufficient_data(nbits));
        }

        while self.bits_in_cache < nbits {
            let mut check_three_byte = true;

            loop {
                let Some(&byte) = self.data.get(self.byte) else {
                    return Err(Self::insufficient_data(nbits));
                };
                self.byte += 1;
                self.epb_cache = (self.epb_cache << 8) | byte as u32;

                if self.strip_emulation_prevention
                    && check_three_byte
                    && self.byte >= 3
                    && (self.epb_cache & 0x00ff_ffff) == 0x03
                {
                    // the byte after an emulation prevention byte is always kept
                    check_three_byte = false;
                    self.n_epb += 1;
                    continue;
                }

                self.cache = (self.cache << 8) | byte as u64;
                self.bits_in_cache += 8;
                break;
            }
        }

        Ok(())
    }

    /// Reads up to 32 bits and returns them right aligned.
    pub fn read_bits(&mut self, count: u8) -> io::Result<u32> {
        if count > 32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot read {count} bits at once"),
            ));
        }

        let nbits = count as u32;
        self.refill(nbits)?;

        let shift = self.bits_in_cache - nbits;
        let mask = if nbits == 0 { 0 } else { u64::MAX >> (64 - nbits) };
        let value = (self.cache >> shift) & mask;
        self.bits_in_cache = shift;

        Ok(value as u32)
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> io::Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads 8 bits.
    pub fn read_u8(&mut self) -> io::Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Returns the next `count` bits without consuming them.
    pub fn peek_bits(&self, count: u8) -> io::Result<u32> {
        self.clone().read_bits(count)
    }

    /// Skips up to 32 bits.
    pub fn skip(&mut self, count: u8) -> io::Result<()> {
        self.read_bits(count).map(|_| ())
    }

    /// Skips an arbitrary number of bits, 32 bits at a time.
    pub fn skip_long(&mut self, count: usize) -> io::Result<()> {
        const CHUNK: usize = 32;

        let mut remaining = count;
        let mut nbits = count % CHUNK;
        while remaining > 0 {
            self.skip(nbits as u8)?;
            remaining -= nbits;
            nbits = CHUNK;
        }

        Ok(())
    }

    /// Checks if the reader sits on a byte boundary.
    #[inline(always)]
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bits_in_cache % 8 == 0
    }

    /// Drops the bits left in the current byte.
    pub fn align(&mut self) -> io::Result<()> {
        let partial = self.bits_in_cache % 8;
        self.skip(partial as u8)
    }

    /// Position in bits from the start of the raw data.
    ///
    /// Emulation prevention bytes consumed so far are included, see
    /// [`BitReader::emulation_prevention_bytes`].
    #[inline(always)]
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.byte * 8 - self.bits_in_cache as usize
    }

    /// Bits left in the raw data, emulation prevention bytes included.
    #[inline(always)]
    #[must_use]
    pub const fn remaining_bits(&self) -> usize {
        (self.data.len() - self.byte) * 8 + self.bits_in_cache as usize
    }

    /// Number of emulation prevention bytes removed so far.
    #[inline(always)]
    #[must_use]
    pub const fn emulation_prevention_bytes(&self) -> usize {
        self.n_epb
    }

    /// Returns the underlying raw data.
    #[inline(always)]
    #[must_use]
    pub const fn get_ref(&self) -> &'a [u8] {
        self.data
    }

    /// Implements `more_rbsp_data()`.
    ///
    /// Returns false only when the next bit is the `rbsp_stop_one_bit` and every
    /// bit after it is zero.
    #[must_use]
    pub fn has_more_rbsp_data(&self) -> bool {
        let mut remaining = self.remaining_bits();
        if remaining == 0 {
            return false;
        }

        let mut reader = self.clone();
        match reader.read_bit() {
            Ok(true) => {}
            Ok(false) => return true,
            Err(_) => return false,
        }

        remaining -= 1;
        let mut nbits = remaining % 8;
        while remaining > 0 {
            match reader.read_bits(nbits as u8) {
                Ok(0) => {}
                Ok(_) => return true,
                Err(_) => return false,
            }
            remaining -= nbits;
            nbits = 8;
        }

        false
    }
}
