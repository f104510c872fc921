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

    devices::stfb::registers.rs

    Register bank and display mode validation for the ST framebuffer

*/

use strum::EnumCount;
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, FromRepr};

use super::draw::PlaneDepth;

pub const MIN_WIDTH: u32 = 320;
pub const MAX_WIDTH: u32 = 2048;
pub const MAX_HEIGHT: u32 = 2048;
/// Width must cover a whole number of 16-pixel plane word groups.
pub const WIDTH_ALIGN: u32 = 16;

/// Adapter registers, in block order. Each register is one 32-bit word.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumIter, EnumCountMacro, FromRepr)]
#[repr(usize)]
pub enum StfbRegister {
    #[strum(serialize = "VBL_ACK")]
    VblAck = 0,
    #[strum(serialize = "VBL_PERIOD")]
    VblPeriod,
    #[strum(serialize = "DEPTH")]
    Depth,
    #[strum(serialize = "WIDTH")]
    Width,
    #[strum(serialize = "HEIGHT")]
    Height,
    #[strum(serialize = "VADDR")]
    Vaddr,
}

impl StfbRegister {
    /// Byte offset of the register from the start of the register block.
    #[inline]
    pub fn offset(&self) -> u32 {
        (*self as u32) * 4
    }

    #[inline]
    pub fn from_offset(offset: u32) -> Option<Self> {
        if offset & 0x03 != 0 {
            return None;
        }
        StfbRegister::from_repr((offset >> 2) as usize)
    }
}

pub const NUM_REGS: usize = StfbRegister::COUNT;

/// Raw register storage. Holds exactly what the guest wrote, or what validation
/// normalized it to.
#[derive(Clone, Debug, Default)]
pub struct RegisterBank {
    regs: [u32; NUM_REGS],
}

impl RegisterBank {
    #[inline]
    pub fn get(&self, reg: StfbRegister) -> u32 {
        self.regs[reg as usize]
    }

    #[inline]
    pub fn set(&mut self, reg: StfbRegister, value: u32) {
        self.regs[reg as usize] = value;
    }

    /// Read by index. Out-of-range indices read as 0.
    pub fn read(&self, index: usize) -> u32 {
        self.regs.get(index).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.regs
    }

    /// Turn the display off: zero the geometry and park VADDR on the off sentinel.
    pub fn clear_geometry(&mut self) {
        self.set(StfbRegister::Depth, 0);
        self.set(StfbRegister::Width, 0);
        self.set(StfbRegister::Height, 0);
        self.set(StfbRegister::Vaddr, 0);
    }

    pub fn clear(&mut self) {
        self.regs = [0; NUM_REGS];
    }
}

/// Reasons a display configuration is rejected. These never reach the guest; the
/// device logs them and turns the display off.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModeRejection {
    UnsupportedDepth(u32),
    WidthOutOfRange(u32),
    WidthUnaligned(u32),
    HeightOutOfRange(u32),
    OddAddress(u32),
}

/// A validated display configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DisplayMode {
    pub depth:  PlaneDepth,
    pub width:  u32,
    pub height: u32,
    pub vaddr:  u32,
}

impl DisplayMode {
    /// Validate a candidate configuration. `vaddr` must be non-zero; a zero VADDR means
    /// the display is off and is not a mode at all.
    pub fn validate(depth: u32, width: u32, height: u32, vaddr: u32) -> Result<Self, ModeRejection> {
        let depth = PlaneDepth::from_bits(depth).ok_or(ModeRejection::UnsupportedDepth(depth))?;

        if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
            return Err(ModeRejection::WidthOutOfRange(width));
        }
        if width % WIDTH_ALIGN != 0 {
            return Err(ModeRejection::WidthUnaligned(width));
        }
        if !(1..=MAX_HEIGHT).contains(&height) {
            return Err(ModeRejection::HeightOutOfRange(height));
        }
        if vaddr & 1 != 0 {
            return Err(ModeRejection::OddAddress(vaddr));
        }

        Ok(DisplayMode {
            depth,
            width,
            height,
            vaddr,
        })
    }

    /// Bytes per scanline.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.depth.planes() / 8
    }

    /// Total size of the frame in bytes.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.stride() * self.height as usize
    }

    pub fn view(&self) -> FrameView {
        FrameView {
            base:   self.vaddr,
            len:    self.frame_len(),
            stride: self.stride(),
        }
    }
}

/// The window of system memory a mode displays.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameView {
    pub base:   u32,
    pub len:    usize,
    pub stride: usize,
}

impl FrameView {
    /// Address of the first byte of scanline `y`.
    #[inline]
    pub fn line_address(&self, y: u32) -> u32 {
        self.base.wrapping_add((y as usize * self.stride) as u32)
    }
}
