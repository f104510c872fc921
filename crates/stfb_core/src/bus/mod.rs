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

    bus::mod.rs

    Memory-mapped device interface and the memory contract consumed by video devices

*/

//! The bus module defines the seams between the framebuffer adapter and the rest of
//! the machine.
//!
//! The adapter exposes its register and palette blocks through [MemoryMappedDevice].
//! It never owns video memory; it only reads it and queries its dirty log through
//! [FramebufferMemory]. [GuestMemory] is a plain RAM implementation of that contract
//! used by the [Machine](crate::machine::Machine) harness.

mod dirty;
mod memory;

pub use dirty::{DirtyBitmap, DirtySnapshot};
pub use memory::GuestMemory;

/// The value returned by a read from an address that no device or memory decodes.
pub const OPEN_BUS_U32: u32 = 0;

pub trait MemoryMappedDevice {
    /// Read a 32-bit big-endian word. Side-effect free reads should go through
    /// [MemoryMappedDevice::mmio_peek_u32].
    fn mmio_read_u32(&mut self, address: u32) -> u32;
    /// Read a 32-bit word without logging or device side effects.
    fn mmio_peek_u32(&self, address: u32) -> u32;
    /// Write a 32-bit word. `now_ns` is the current virtual time, for devices that
    /// schedule timers relative to the write.
    fn mmio_write_u32(&mut self, address: u32, data: u32, now_ns: u64);

    fn get_mapping(&self) -> Vec<MemRangeDescriptor>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemRangeDescriptor {
    pub address: u32,
    pub size: u32,
    pub read_only: bool,
    pub name: &'static str,
}

impl MemRangeDescriptor {
    pub fn new(address: u32, size: u32, read_only: bool, name: &'static str) -> Self {
        Self {
            address,
            size,
            read_only,
            name,
        }
    }

    #[inline]
    pub fn contains(&self, address: u32) -> bool {
        address >= self.address && (address - self.address) < self.size
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.address as u64 + self.size as u64
    }

    pub fn overlaps(&self, other: &MemRangeDescriptor) -> bool {
        (self.address as u64) < other.end() && (other.address as u64) < self.end()
    }
}

/// The memory subsystem contract a framebuffer device depends on.
pub trait FramebufferMemory {
    /// Copy `buf.len()` bytes starting at `address` into `buf`. Bytes outside of backed
    /// memory read as zero.
    fn read_bytes(&self, address: u32, buf: &mut [u8]);

    /// Capture which bytes of `[address, address + len)` were written since the last
    /// capture over that range, and clear the live dirty state for the range.
    ///
    /// Memory without dirty logging may keep the default, which reports every byte
    /// dirty. That degrades every redraw to a full repaint but is otherwise equivalent.
    fn snapshot_and_clear_dirty(&mut self, address: u32, len: usize) -> DirtySnapshot {
        DirtySnapshot::all_dirty(address, len)
    }
}

/// Split a big-endian bus word into bytes.
#[inline]
pub fn u32_to_bus_bytes(data: u32) -> [u8; 4] {
    data.to_be_bytes()
}

/// Assemble a big-endian bus word from bytes.
#[inline]
pub fn u32_from_bus_bytes(bytes: [u8; 4]) -> u32 {
    u32::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_descriptor_contains_and_overlaps() {
        let regs = MemRangeDescriptor::new(0xFFFF_C000, 0x400, false, "regs");
        let pal = MemRangeDescriptor::new(0xFFFF_C400, 0x400, false, "palette");

        assert!(regs.contains(0xFFFF_C000));
        assert!(regs.contains(0xFFFF_C3FF));
        assert!(!regs.contains(0xFFFF_C400));
        assert!(!regs.overlaps(&pal));

        let top = MemRangeDescriptor::new(0xFFFF_FC00, 0x400, false, "top");
        assert_eq!(top.end(), 0x1_0000_0000);
        assert!(top.contains(0xFFFF_FFFF));
    }

    #[test]
    fn bus_bytes_are_big_endian() {
        assert_eq!(u32_to_bus_bytes(0x1234_5678), [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(u32_from_bus_bytes([0xDE, 0xAD, 0xBE, 0xEF]), 0xDEAD_BEEF);
    }
}
