use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{BnkError, Result};

/// Symmetric little-endian codec for a fixed-layout bank structure.
pub trait BinCodec: Sized {
    fn read<R: Read>(reader: &mut R) -> Result<Self>;
    fn write<W: Write>(&self, writer: &mut W) -> Result<()>;
}

pub(crate) fn read_bool<R: Read>(reader: &mut R) -> Result<bool> {
    Ok(reader.read_u8()? != 0)
}

pub(crate) fn write_bool<W: Write>(writer: &mut W, value: bool) -> Result<()> {
    writer.write_u8(u8::from(value))?;
    Ok(())
}

pub(crate) fn read_vec<T: BinCodec, R: Read>(reader: &mut R, count: usize) -> Result<Vec<T>> {
    let mut items = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        items.push(T::read(reader)?);
    }
    Ok(items)
}

pub(crate) fn write_slice<T: BinCodec, W: Write>(writer: &mut W, items: &[T]) -> Result<()> {
    for item in items {
        item.write(writer)?;
    }
    Ok(())
}

pub(crate) fn read_ids<R: Read>(reader: &mut R, count: usize) -> Result<Vec<u32>> {
    let mut ids = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        ids.push(reader.read_u32::<LE>()?);
    }
    Ok(ids)
}

pub(crate) fn write_ids<W: Write>(writer: &mut W, ids: &[u32]) -> Result<()> {
    for id in ids {
        writer.write_u32::<LE>(*id)?;
    }
    Ok(())
}

/// `u32` count followed by that many ids.
pub(crate) fn read_id_list<R: Read>(reader: &mut R) -> Result<Vec<u32>> {
    let count = reader.read_u32::<LE>()? as usize;
    read_ids(reader, count)
}

pub(crate) fn write_id_list<W: Write>(writer: &mut W, ids: &[u32]) -> Result<()> {
    writer.write_u32::<LE>(count_u32(ids.len(), "id list")?)?;
    write_ids(writer, ids)
}

pub(crate) fn count_u8(len: usize, what: &str) -> Result<u8> {
    u8::try_from(len).map_err(|_| BnkError::OutOfRange(format!("{} has {} entries (max 255)", what, len)))
}

pub(crate) fn count_u16(len: usize, what: &str) -> Result<u16> {
    u16::try_from(len)
        .map_err(|_| BnkError::OutOfRange(format!("{} has {} entries (max 65535)", what, len)))
}

pub(crate) fn count_u32(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| BnkError::OutOfRange(format!("{} has {} entries", what, len)))
}
