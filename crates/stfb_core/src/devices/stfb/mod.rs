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

    devices::stfb::mod.rs

    Implementation of the ST planar framebuffer adapter

*/

//! The ST framebuffer is a simple bitmap display adapter. It scans a window of system
//! memory laid out as interleaved bit-planes, decodes it through a 256-entry palette,
//! and signals a vertical blank interrupt at a programmable rate.
//!
//! The adapter has two MMIO blocks: a register block and a palette block. Writing
//! VADDR commits DEPTH, WIDTH and HEIGHT as the new display mode. An invalid
//! configuration is never reported to the guest; the adapter just turns the display
//! off, which the guest can see by reading VADDR back as 0.

mod draw;
mod mmio;
mod palette;
mod redraw;
mod registers;
mod state;
mod vbl;

pub use draw::{
    draw_line_1bpp,
    draw_line_2bpp,
    draw_line_4bpp,
    draw_line_8bpp,
    DrawLineFn,
    PlaneDepth,
    PIXELS_PER_GROUP,
};
pub use mmio::{PALETTE_BLOCK_SIZE, REGS_BLOCK_SIZE};
pub use palette::{default_table, Palette, PaletteEntry, PALETTE_SIZE};
pub use redraw::RedrawStats;
pub use registers::{DisplayMode, FrameView, ModeRejection, RegisterBank, StfbRegister, MAX_HEIGHT, MAX_WIDTH, MIN_WIDTH, NUM_REGS};
pub use state::StfbState;
pub use vbl::{VblTimer, VBL_DEFAULT_PERIOD_NS, VBL_MIN_PERIOD_NS};

use serde_derive::Deserialize;
use strum::EnumCount;
use thiserror::Error;

use crate::{
    bus::MemRangeDescriptor,
    display::{DisplaySurface, PixelFormat},
    interrupt::IrqLine,
    updatable::Updatable,
};

pub const DEFAULT_REGS_BASE: u32 = 0xFFFF_C000;
pub const DEFAULT_PALETTE_BASE: u32 = 0xFFFF_C400;
pub const DEFAULT_IRQ_LEVEL: u8 = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StfbError {
    #[error("Unsupported host pixel format: {bpp} bits per pixel (only 32 is supported)")]
    UnsupportedPixelFormat { bpp: u32 },
    #[error("Register block at {regs:#010X} overlaps palette block at {palette:#010X}")]
    MappingOverlap { regs: u32, palette: u32 },
    #[error("MMIO block base {0:#010X} is not 4-byte aligned")]
    MisalignedBase(u32),
    #[error("MMIO block at {0:#010X} extends past the end of the address space")]
    BlockOutOfRange(u32),
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StfbConfig {
    pub regs_base: u32,
    pub palette_base: u32,
    pub irq_level: u8,
}

impl Default for StfbConfig {
    fn default() -> Self {
        Self {
            regs_base: DEFAULT_REGS_BASE,
            palette_base: DEFAULT_PALETTE_BASE,
            irq_level: DEFAULT_IRQ_LEVEL,
        }
    }
}

impl StfbConfig {
    pub fn regs_range(&self) -> MemRangeDescriptor {
        MemRangeDescriptor::new(self.regs_base, REGS_BLOCK_SIZE, false, "stfb-regs")
    }

    pub fn palette_range(&self) -> MemRangeDescriptor {
        MemRangeDescriptor::new(self.palette_base, PALETTE_BLOCK_SIZE, false, "stfb-palette")
    }

    pub fn validate(&self) -> Result<(), StfbError> {
        for base in [self.regs_base, self.palette_base] {
            if base & 0x03 != 0 {
                return Err(StfbError::MisalignedBase(base));
            }
        }
        for range in [self.regs_range(), self.palette_range()] {
            if range.end() > 1 << 32 {
                return Err(StfbError::BlockOutOfRange(range.address));
            }
        }
        if self.regs_range().overlaps(&self.palette_range()) {
            return Err(StfbError::MappingOverlap {
                regs: self.regs_base,
                palette: self.palette_base,
            });
        }
        Ok(())
    }
}

type RegisterSetter = fn(&mut StfbDevice, u32, u64);

/// Per-register write handlers, in [StfbRegister] order.
const REGISTER_SETTERS: [RegisterSetter; StfbRegister::COUNT] = [
    StfbDevice::set_vbl_ack,
    StfbDevice::set_vbl_period,
    StfbDevice::set_depth,
    StfbDevice::set_width,
    StfbDevice::set_height,
    StfbDevice::set_vaddr,
];

pub struct StfbDevice {
    config: StfbConfig,
    regs: RegisterBank,
    palette: Palette,
    /// The committed display mode. Dirty means the frame view must be re-derived.
    mode: Updatable<Option<DisplayMode>>,
    draw_line: DrawLineFn,
    view: Option<FrameView>,
    full_redraw: bool,
    vbl: VblTimer,
    irq: IrqLine,
    line_buf: Vec<u8>,
    stats: RedrawStats,
}

impl StfbDevice {
    /// Attach the adapter to a display surface. This is the only point where the
    /// device can fail: the host must present 32-bit pixels, and the MMIO blocks must
    /// be laid out sanely.
    pub fn attach(config: StfbConfig, surface: &dyn DisplaySurface) -> Result<Self, StfbError> {
        let format = surface.pixel_format();
        if format != PixelFormat::Xrgb8888 {
            log::error!("STFB: cannot attach to surface with format {:?}", format);
            return Err(StfbError::UnsupportedPixelFormat {
                bpp: format.bits_per_pixel(),
            });
        }
        config.validate()?;

        let mut device = StfbDevice {
            config,
            regs: RegisterBank::default(),
            palette: Palette::default(),
            mode: Updatable::new(None),
            draw_line: PlaneDepth::One.draw_fn(),
            view: None,
            full_redraw: true,
            vbl: VblTimer::default(),
            irq: IrqLine::new(config.irq_level),
            line_buf: Vec::new(),
            stats: RedrawStats::default(),
        };
        device.reset();

        log::debug!(
            "STFB: attached, registers at {:#010X}, palette at {:#010X}, IRQ level {}",
            config.regs_base,
            config.palette_base,
            config.irq_level
        );
        Ok(device)
    }

    /// Return the device to its power-on state: display off, timer idle, interrupt
    /// line low, default palette.
    pub fn reset(&mut self) {
        self.regs.clear();
        self.mode.set(None);
        self.vbl.disarm();
        self.irq.lower();
        self.palette.reset(self.regs.get(StfbRegister::Depth));
        self.full_redraw = true;
        log::debug!("STFB: reset");
    }

    #[inline]
    pub fn config(&self) -> &StfbConfig {
        &self.config
    }

    /// Write a register by index. Unknown indices are ignored.
    pub fn write_register(&mut self, index: usize, value: u32, now_ns: u64) {
        match StfbRegister::from_repr(index) {
            Some(reg) => {
                log::trace!("STFB: write {} <- {:#010X}", reg, value);
                REGISTER_SETTERS[reg as usize](self, value, now_ns);
            }
            None => {
                log::warn!("STFB: write to unknown register {} ignored", index);
            }
        }
    }

    /// Read a register by index. Unknown indices read as 0.
    pub fn read_register(&self, index: usize) -> u32 {
        let value = self.regs.read(index);
        log::trace!("STFB: read register {} -> {:#010X}", index, value);
        value
    }

    #[inline]
    pub fn register(&self, reg: StfbRegister) -> u32 {
        self.regs.get(reg)
    }

    pub fn write_palette(&mut self, index: usize, color: u32) {
        log::trace!("STFB: palette[{}] <- {:#010X}", index, color);
        if self.palette.write(index, color) {
            // Pixels already on the surface were decoded with the old entry.
            self.full_redraw = true;
        }
    }

    pub fn read_palette(&self, index: usize) -> u32 {
        self.palette.read(index)
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Force the next redraw to repaint every scanline, e.g. after the host lost the
    /// surface contents.
    pub fn invalidate_display(&mut self) {
        self.full_redraw = true;
    }

    #[inline]
    pub fn full_redraw_pending(&self) -> bool {
        self.full_redraw
    }

    #[inline]
    pub fn mode(&self) -> Option<DisplayMode> {
        *self.mode.get()
    }

    #[inline]
    pub fn irq(&self) -> &IrqLine {
        &self.irq
    }

    #[inline]
    pub fn irq_asserted(&self) -> bool {
        self.irq.is_asserted()
    }

    #[inline]
    pub fn vbl(&self) -> &VblTimer {
        &self.vbl
    }

    /// The next virtual time at which the device needs [StfbDevice::run] called.
    #[inline]
    pub fn next_deadline(&self) -> Option<u64> {
        self.vbl.deadline()
    }

    /// Bring timers up to `now_ns`. Returns the number of VBL firings.
    pub fn run(&mut self, now_ns: u64) -> u32 {
        self.vbl.run(now_ns, &mut self.irq)
    }

    #[inline]
    pub fn stats(&self) -> &RedrawStats {
        &self.stats
    }

    fn set_vbl_ack(&mut self, _value: u32, _now_ns: u64) {
        self.irq.lower();
    }

    fn set_vbl_period(&mut self, value: u32, now_ns: u64) {
        let period = self.vbl.program(value, now_ns);
        self.regs.set(StfbRegister::VblPeriod, period);
    }

    fn set_depth(&mut self, value: u32, _now_ns: u64) {
        self.regs.set(StfbRegister::Depth, value);
    }

    fn set_width(&mut self, value: u32, _now_ns: u64) {
        self.regs.set(StfbRegister::Width, value);
    }

    fn set_height(&mut self, value: u32, _now_ns: u64) {
        self.regs.set(StfbRegister::Height, value);
    }

    fn set_vaddr(&mut self, value: u32, _now_ns: u64) {
        self.regs.set(StfbRegister::Vaddr, value);
        self.commit_mode();
    }

    /// Validate the geometry registers against VADDR and make the result the active
    /// display mode.
    fn commit_mode(&mut self) {
        let vaddr = self.regs.get(StfbRegister::Vaddr);
        if vaddr == 0 {
            if self.mode.is_some() {
                log::debug!("STFB: display off");
            }
            self.mode.update(None);
            return;
        }

        let depth = self.regs.get(StfbRegister::Depth);
        let width = self.regs.get(StfbRegister::Width);
        let height = self.regs.get(StfbRegister::Height);

        match DisplayMode::validate(depth, width, height, vaddr) {
            Ok(mode) => {
                log::debug!(
                    "STFB: mode set {}x{}x{} at {:#010X}, stride {}",
                    mode.width,
                    mode.height,
                    mode.depth.planes(),
                    mode.vaddr,
                    mode.stride()
                );
                self.draw_line = mode.depth.draw_fn();
                self.mode.update(Some(mode));
                self.full_redraw = true;
            }
            Err(reason) => {
                log::warn!(
                    "STFB: rejected mode {}x{}x{} at {:#010X}: {:?}; display off",
                    width,
                    height,
                    depth,
                    vaddr,
                    reason
                );
                self.regs.clear_geometry();
                self.mode.update(None);
            }
        }
    }
}
