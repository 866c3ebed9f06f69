//! The linearization protocol: a size/pack/unpack contract that lets any
//! per-patch payload be written to, and restored from, a flat byte buffer.
//! A transport layer (or a checkpoint writer) allocates exactly
//! `linear_size` bytes, calls `linear_out`, ships the bytes, and the peer
//! calls `linear_in` with the same region and component interval.
//!
//! Scalars are written in native byte order, with no padding.

use core::mem::size_of;
use core::ops::Range;
use bytemuck::Pod;
use crate::index_space::IndexSpace;




/**
 * Interface for types that can be packed into and unpacked from a byte
 * buffer, restricted to a region and a component interval. For identical
 * `(region, comps)` arguments, `linear_out` must write exactly
 * `linear_size` bytes, and `linear_in` must consume exactly as many.
 *
 * The trait is object safe, so heterogeneous payloads can be handled by a
 * transport layer through `&dyn Linearize`.
 */
pub trait Linearize {

    /// Return the number of bytes `linear_out` will write.
    fn linear_size(&self, region: &IndexSpace, comps: Range<usize>) -> usize;

    /// Write the data in the region to the front of the buffer, and return
    /// the number of bytes written.
    fn linear_out(&self, buffer: &mut [u8], region: &IndexSpace, comps: Range<usize>) -> usize;

    /// Read data written by `linear_out` from the front of the buffer, and
    /// return the number of bytes read.
    fn linear_in(&mut self, buffer: &[u8], region: &IndexSpace, comps: Range<usize>) -> usize;
}




/**
 * Pack the region of a payload into a freshly allocated buffer of exactly
 * the advertised size.
 */
pub fn pack(item: &dyn Linearize, region: &IndexSpace, comps: Range<usize>) -> Vec<u8> {
    let size = item.linear_size(region, comps.clone());
    let mut buffer = vec![0; size];
    let written = item.linear_out(&mut buffer, region, comps);

    assert_eq!(
        written,
        size,
        "linear_out wrote {} bytes but linear_size promised {}", written, size);

    buffer
}




/**
 * Unpack a buffer produced by `pack` into the region of a payload.
 */
pub fn unpack(item: &mut dyn Linearize, buffer: &[u8], region: &IndexSpace, comps: Range<usize>) -> usize {
    let read = item.linear_in(buffer, region, comps);

    assert_eq!(
        read,
        buffer.len(),
        "linear_in consumed {} of {} bytes", read, buffer.len());

    read
}




/**
 * A write cursor over a byte buffer.
 */
pub struct ByteWriter<'a> {
    buffer: &'a mut [u8],
    cursor: usize,
}

impl<'a> ByteWriter<'a> {

    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn put<T: Pod>(&mut self, value: T) {
        let bytes = bytemuck::bytes_of(&value);
        self.buffer[self.cursor..self.cursor + bytes.len()].copy_from_slice(bytes);
        self.cursor += bytes.len();
    }

    pub fn put_slice<T: Pod>(&mut self, values: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        self.buffer[self.cursor..self.cursor + bytes.len()].copy_from_slice(bytes);
        self.cursor += bytes.len();
    }

    pub fn position(&self) -> usize {
        self.cursor
    }
}




/**
 * A read cursor over a byte buffer.
 */
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {

    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn get<T: Pod>(&mut self) -> T {
        let n = size_of::<T>();
        let value = bytemuck::pod_read_unaligned(&self.buffer[self.cursor..self.cursor + n]);
        self.cursor += n;
        value
    }

    pub fn position(&self) -> usize {
        self.cursor
    }
}




/// Encode an optional slot index, using -1 for the absent case.
pub(crate) fn encode_slot(slot: Option<usize>) -> i64 {
    slot.map_or(-1, |s| s as i64)
}

/// Inverse of `encode_slot`.
pub(crate) fn decode_slot(code: i64) -> Option<usize> {
    if code < 0 { None } else { Some(code as usize) }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{decode_slot, encode_slot, ByteReader, ByteWriter};

    #[test]
    fn cursors_agree_on_mixed_scalars() {
        let mut buffer = vec![0u8; 8 + 4 + 8 * 3];
        let mut writer = ByteWriter::new(&mut buffer);
        writer.put(-7i64);
        writer.put(2.5f32);
        writer.put_slice(&[1.0f64, 2.0, 3.0]);
        assert_eq!(writer.position(), 36);

        let mut reader = ByteReader::new(&buffer);
        assert_eq!(reader.get::<i64>(), -7);
        assert_eq!(reader.get::<f32>(), 2.5);
        assert_eq!(reader.get::<f64>(), 1.0);
        assert_eq!(reader.get::<f64>(), 2.0);
        assert_eq!(reader.get::<f64>(), 3.0);
        assert_eq!(reader.position(), 36);
    }

    #[test]
    fn absent_slots_survive_encoding() {
        assert_eq!(decode_slot(encode_slot(None)), None);
        assert_eq!(decode_slot(encode_slot(Some(3))), Some(3));
    }
}
