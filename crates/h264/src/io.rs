use std::io;

/// Wraps an [`io::Write`] to insert emulation prevention bytes, or an
/// [`io::Read`] to drop them.
///
/// Works one byte at a time, so the inner reader or writer should be buffered.
#[derive(Debug)]
pub struct EmulationPreventionIo<I> {
    inner: I,
    zeros: u8,
    last: Option<u8>,
}

impl<I> EmulationPreventionIo<I> {
    /// Wraps `inner`.
    pub const fn new(inner: I) -> Self {
        Self {
            inner,
            zeros: 0,
            last: None,
        }
    }

    /// Tracks the raw byte that was just passed through.
    fn push(&mut self, byte: u8) {
        self.zeros = if byte == 0x00 { self.zeros.saturating_add(1) } else { 0 };
        self.last = Some(byte);
    }
}

impl<I: io::Write> EmulationPreventionIo<I> {
    /// Terminates the payload and returns the inner writer.
    ///
    /// A payload ending in `0x00` gets a final `0x03` (ISO/IEC-14496-10-2022 - 7.4.1).
    pub fn finish(mut self) -> io::Result<I> {
        if self.last == Some(0x00) {
            self.inner.write_all(&[0x03])?;
        }

        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<I: io::Write> io::Write for EmulationPreventionIo<I> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            if self.zeros >= 2 && byte <= 0x03 {
                self.inner.write_all(&[0x03])?;
                self.push(0x03);
            }

            self.inner.write_all(&[byte])?;
            self.push(byte);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<I: io::Read> io::Read for EmulationPreventionIo<I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        let mut byte = [0u8; 1];

        while filled < buf.len() {
            if self.inner.read(&mut byte)? == 0 {
                break;
            }

            let emulation_prevention = self.zeros >= 2 && byte[0] == 0x03;
            self.push(byte[0]);
            if emulation_prevention {
                continue;
            }

            buf[filled] = byte[0];
            filled += 1;
        }

        Ok(filled)
    }
}
