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

    devices::stfb::mmio.rs

    Bus interface for the ST framebuffer register and palette blocks

*/

use super::StfbDevice;
use crate::bus::{MemRangeDescriptor, MemoryMappedDevice, OPEN_BUS_U32};

pub const REGS_BLOCK_SIZE: u32 = 0x400;
pub const PALETTE_BLOCK_SIZE: u32 = 0x400;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Block {
    Registers(usize),
    Palette(usize),
}

impl StfbDevice {
    /// Decode a bus address into a block and word index. Misaligned and unmapped
    /// addresses decode to nothing.
    fn decode_address(&self, address: u32) -> Option<Block> {
        let (offset, block): (u32, fn(usize) -> Block) = if self.config.regs_range().contains(address) {
            (address - self.config.regs_base, Block::Registers)
        }
        else if self.config.palette_range().contains(address) {
            (address - self.config.palette_base, Block::Palette)
        }
        else {
            log::warn!("STFB: access to unmapped address {:#010X}", address);
            return None;
        };

        if offset & 0x03 != 0 {
            log::warn!("STFB: misaligned access at {:#010X} ignored", address);
            return None;
        }
        Some(block((offset >> 2) as usize))
    }
}

impl MemoryMappedDevice for StfbDevice {
    fn mmio_read_u32(&mut self, address: u32) -> u32 {
        match self.decode_address(address) {
            Some(Block::Registers(index)) => self.read_register(index),
            Some(Block::Palette(index)) => self.read_palette(index),
            None => OPEN_BUS_U32,
        }
    }

    fn mmio_peek_u32(&self, address: u32) -> u32 {
        let base = self.config.regs_base;
        let pal_base = self.config.palette_base;
        if address & 0x03 != 0 {
            return OPEN_BUS_U32;
        }
        if self.config.regs_range().contains(address) {
            self.regs.read(((address - base) >> 2) as usize)
        }
        else if self.config.palette_range().contains(address) {
            self.palette.read(((address - pal_base) >> 2) as usize)
        }
        else {
            OPEN_BUS_U32
        }
    }

    fn mmio_write_u32(&mut self, address: u32, data: u32, now_ns: u64) {
        match self.decode_address(address) {
            Some(Block::Registers(index)) => self.write_register(index, data, now_ns),
            Some(Block::Palette(index)) => self.write_palette(index, data),
            None => {}
        }
    }

    fn get_mapping(&self) -> Vec<MemRangeDescriptor> {
        vec![self.config.regs_range(), self.config.palette_range()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        devices::stfb::{StfbConfig, StfbRegister},
        display::HeadlessSurface,
    };

    const REGS: u32 = 0xFFFF_C000;
    const PALETTE: u32 = 0xFFFF_C400;

    fn device() -> StfbDevice {
        StfbDevice::attach(StfbConfig::default(), &HeadlessSurface::default()).unwrap()
    }

    #[test]
    fn mapping_reports_both_blocks() {
        let dev = device();
        let mapping = dev.get_mapping();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[0].address, REGS);
        assert_eq!(mapping[1].address, PALETTE);
        assert!(!mapping[0].overlaps(&mapping[1]));
    }

    #[test]
    fn register_block_decodes_by_word() {
        let mut dev = device();
        dev.mmio_write_u32(REGS + StfbRegister::Width.offset(), 640, 0);
        dev.mmio_write_u32(REGS + StfbRegister::Height.offset(), 400, 0);
        assert_eq!(dev.register(StfbRegister::Width), 640);
        assert_eq!(dev.mmio_read_u32(REGS + 0x0C), 640);
        assert_eq!(dev.mmio_peek_u32(REGS + 0x10), 400);

        // Past the last register, still inside the block.
        dev.mmio_write_u32(REGS + 0x18, 0xFFFF, 0);
        assert_eq!(dev.mmio_read_u32(REGS + 0x18), 0);
        assert_eq!(dev.mmio_read_u32(REGS + 0x3FC), 0);
    }

    #[test]
    fn misaligned_access_is_a_no_op() {
        let mut dev = device();
        dev.mmio_write_u32(REGS + 0x0E, 640, 0);
        assert_eq!(dev.register(StfbRegister::Width), 0);
        assert_eq!(dev.register(StfbRegister::Height), 0);

        dev.mmio_write_u32(REGS + 0x0C, 640, 0);
        assert_eq!(dev.mmio_read_u32(REGS + 0x0D), 0);
        assert_eq!(dev.mmio_peek_u32(REGS + 0x0D), 0);

        let before = dev.read_palette(1);
        dev.mmio_write_u32(PALETTE + 0x05, 0x0012_3456, 0);
        assert_eq!(dev.read_palette(1), before);
    }

    #[test]
    fn palette_round_trips_every_index() {
        let mut dev = device();
        for index in 0..256u32 {
            let color = 0x0100_0000u32.wrapping_mul(index) ^ (index * 0x0001_0203);
            dev.mmio_write_u32(PALETTE + index * 4, color, 0);
            assert_eq!(dev.mmio_read_u32(PALETTE + index * 4), color);
        }
    }

    #[test]
    fn unmapped_address_reads_open_bus() {
        let mut dev = device();
        assert_eq!(dev.mmio_read_u32(0x1000), OPEN_BUS_U32);
        dev.mmio_write_u32(0x1000, 1, 0);
        assert_eq!(dev.mmio_peek_u32(0x1000), OPEN_BUS_U32);
    }
}
