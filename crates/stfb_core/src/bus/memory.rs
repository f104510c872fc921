/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    bus::memory.rs

    Guest RAM with video dirty logging

*/

use super::{u32_from_bus_bytes, u32_to_bus_bytes, DirtyBitmap, DirtySnapshot, FramebufferMemory};

/// Flat guest RAM starting at physical address 0.
///
/// Every CPU-side write marks the touched bytes in a [DirtyBitmap], which the
/// framebuffer device drains once per redraw cycle.
pub struct GuestMemory {
    data:  Vec<u8>,
    dirty: DirtyBitmap,
}

impl GuestMemory {
    pub fn new(size: usize) -> Self {
        Self {
            data:  vec![0; size],
            dirty: DirtyBitmap::new(size),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn contains(&self, address: u32) -> bool {
        (address as usize) < self.data.len()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn read_u8(&self, address: u32) -> u8 {
        self.data.get(address as usize).copied().unwrap_or(0)
    }

    pub fn read_u16(&self, address: u32) -> u16 {
        (self.read_u8(address) as u16) << 8 | self.read_u8(address.wrapping_add(1)) as u16
    }

    pub fn read_u32(&self, address: u32) -> u32 {
        let mut bytes = [0u8; 4];
        self.read_bytes(address, &mut bytes);
        u32_from_bus_bytes(bytes)
    }

    pub fn write_u8(&mut self, address: u32, data: u8) {
        self.write_bytes(address, &[data]);
    }

    pub fn write_u16(&mut self, address: u32, data: u16) {
        self.write_bytes(address, &data.to_be_bytes());
    }

    pub fn write_u32(&mut self, address: u32, data: u32) {
        self.write_bytes(address, &u32_to_bus_bytes(data));
    }

    /// Write a run of bytes, clipped to the end of RAM.
    pub fn write_bytes(&mut self, address: u32, bytes: &[u8]) {
        let offset = address as usize;
        if offset >= self.data.len() || bytes.is_empty() {
            return;
        }
        let write_len = bytes.len().min(self.data.len() - offset);
        self.data[offset..offset + write_len].copy_from_slice(&bytes[..write_len]);
        self.dirty.mark(offset, write_len);
    }

    /// Fill a run of bytes with a single value, clipped to the end of RAM.
    pub fn fill(&mut self, address: u32, len: usize, value: u8) {
        let offset = address as usize;
        if offset >= self.data.len() {
            return;
        }
        let fill_len = len.min(self.data.len() - offset);
        self.data[offset..offset + fill_len].fill(value);
        self.dirty.mark(offset, fill_len);
    }

    /// Mark all of RAM dirty, as if every byte had been rewritten.
    pub fn mark_all_dirty(&mut self) {
        self.dirty.mark_all();
    }
}

impl FramebufferMemory for GuestMemory {
    fn read_bytes(&self, address: u32, buf: &mut [u8]) {
        let offset = address as usize;
        let avail = self.data.len().saturating_sub(offset).min(buf.len());
        if avail > 0 {
            buf[..avail].copy_from_slice(&self.data[offset..offset + avail]);
        }
        buf[avail..].fill(0);
    }

    fn snapshot_and_clear_dirty(&mut self, address: u32, len: usize) -> DirtySnapshot {
        let bits = self.dirty.snapshot_and_clear(address as usize, len);
        DirtySnapshot::from_bits(address, len, bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_stored_big_endian() {
        let mut mem = GuestMemory::new(64);
        mem.write_u32(8, 0x1122_3344);
        assert_eq!(mem.read_u8(8), 0x11);
        assert_eq!(mem.read_u8(11), 0x44);
        assert_eq!(mem.read_u16(10), 0x3344);
        assert_eq!(mem.read_u32(8), 0x1122_3344);
    }

    #[test]
    fn reads_past_end_are_zero() {
        let mut mem = GuestMemory::new(16);
        mem.fill(0, 16, 0xAA);

        let mut buf = [0xFFu8; 8];
        mem.read_bytes(12, &mut buf);
        assert_eq!(buf, [0xAA, 0xAA, 0xAA, 0xAA, 0, 0, 0, 0]);
        assert_eq!(mem.read_u32(100), 0);
    }

    #[test]
    fn writes_are_logged_dirty() {
        let mut mem = GuestMemory::new(256);
        let _ = mem.snapshot_and_clear_dirty(0, 256);

        mem.write_u16(100, 0xBEEF);
        let snap = mem.snapshot_and_clear_dirty(64, 64);
        assert!(snap.is_dirty(36, 2));
        assert!(!snap.is_dirty(0, 36));
        assert_eq!(snap.dirty_bytes(), 2);

        let snap = mem.snapshot_and_clear_dirty(64, 64);
        assert_eq!(snap.dirty_bytes(), 0);
    }

    #[test]
    fn write_past_end_is_clipped() {
        let mut mem = GuestMemory::new(8);
        mem.write_u32(6, 0xAABB_CCDD);
        assert_eq!(mem.read_u8(6), 0xAA);
        assert_eq!(mem.read_u8(7), 0xBB);
        mem.write_u32(8, 0x1234_5678);
        assert_eq!(mem.size(), 8);
    }
}
