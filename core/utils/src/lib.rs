use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Extension trait for the sequential little-endian reads shared by the bank and package codecs.
pub trait BinReadExt: Read {
    /// Read exactly `len` bytes. Running out of input is an `UnexpectedEof` error.
    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a null-terminated string (reads until 0x00)
    fn read_null_term_string(&mut self) -> io::Result<String> {
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read a string prefixed by a single length byte (no terminator).
    fn read_u8_prefixed_string(&mut self) -> io::Result<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read a UTF-16LE string terminated by a 0x0000 code unit.
    fn read_wide_string(&mut self) -> io::Result<String> {
        let mut units = Vec::new();
        loop {
            let unit = self.read_u16::<LE>()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        Ok(String::from_utf16_lossy(&units))
    }

    /// Skip `len` bytes without keeping them.
    fn skip_bytes(&mut self, len: u64) -> io::Result<()> {
        let copied = io::copy(&mut Read::take(&mut *self, len), &mut io::sink())?;
        if copied != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected to skip {} bytes, only {} available", len, copied),
            ));
        }
        Ok(())
    }
}

/// Extension trait for writing binary data
pub trait BinWriteExt: Write {
    /// Write a string followed by a null terminator
    fn write_null_term_string(&mut self, s: &str) -> io::Result<()> {
        self.write_all(s.as_bytes())?;
        self.write_all(&[0u8])?;
        Ok(())
    }

    /// Write a string prefixed by a single length byte. Longer strings are rejected.
    fn write_u8_prefixed_string(&mut self, s: &str) -> io::Result<()> {
        let bytes = s.as_bytes();
        let len = u8::try_from(bytes.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("string of {} bytes does not fit a u8 length", bytes.len()),
            )
        })?;
        self.write_u8(len)?;
        self.write_all(bytes)?;
        Ok(())
    }

    /// Write a UTF-16LE string followed by a 0x0000 terminator.
    fn write_wide_string(&mut self, s: &str) -> io::Result<()> {
        for unit in s.encode_utf16() {
            self.write_u16::<LE>(unit)?;
        }
        self.write_u16::<LE>(0)?;
        Ok(())
    }

    fn write_zeros(&mut self, len: usize) -> io::Result<()> {
        self.write_all(&vec![0u8; len])
    }

    /// Write padding bytes to align to the given boundary
    fn align(&mut self, pos: u64, alignment: u64) -> io::Result<usize> {
        let padding = padding_for(pos, alignment);
        self.write_zeros(padding as usize)?;
        Ok(padding as usize)
    }
}

// Implement for all types that implement Read/Write
impl<R: Read + ?Sized> BinReadExt for R {}
impl<W: Write + ?Sized> BinWriteExt for W {}

/// Number of bytes needed to move `pos` up to the next multiple of `alignment`.
/// An alignment of 0 or 1 never pads.
pub fn padding_for(pos: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return 0;
    }
    let remainder = pos % alignment;
    if remainder == 0 { 0 } else { alignment - remainder }
}

/// Round `pos` up to the next multiple of `alignment`.
pub fn align_up(pos: u64, alignment: u64) -> u64 {
    pos + padding_for(pos, alignment)
}

/// Total length of a seekable stream, restoring the current position afterwards.
pub fn stream_len<S: Seek>(stream: &mut S) -> io::Result<u64> {
    let current = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(current))?;
    Ok(end)
}

/// Write `value` as a little-endian u32 at `pos` and return to the original position.
pub fn patch_u32_at<W: Write + Seek>(writer: &mut W, pos: u64, value: u32) -> io::Result<()> {
    let current = writer.stream_position()?;
    writer.seek(SeekFrom::Start(pos))?;
    writer.write_u32::<LE>(value)?;
    writer.seek(SeekFrom::Start(current))?;
    Ok(())
}
