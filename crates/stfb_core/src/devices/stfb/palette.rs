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

    devices::stfb::palette.rs

    Color lookup table for the ST framebuffer

*/

//! The palette holds precomputed host pixels, one 32-bit `0x00RRGGBB` word per index.
//! Decoders look entries up directly, so a guest palette write is visible on the next
//! repaint with no conversion step.

use modular_bitfield::{bitfield, prelude::*};

pub const PALETTE_SIZE: usize = 256;

/// Layout of a palette word as seen by the guest.
#[bitfield]
#[derive(Copy, Clone, Debug, Default)]
pub struct PaletteEntry {
    pub blue: B8,
    pub green: B8,
    pub red: B8,
    #[skip]
    unused: B8,
}

impl PaletteEntry {
    #[inline]
    pub fn from_u32(value: u32) -> Self {
        PaletteEntry::from_bytes(value.to_le_bytes())
    }
}

/// Monochrome: a clear bit is paper (white), a set bit is ink (black).
const MONO_PALETTE: [u32; 2] = [0x00FF_FFFF, 0x0000_0000];

const ST_2_PALETTE: [u32; 4] = [0x00FF_FFFF, 0x00FF_0000, 0x0000_FF00, 0x0000_0000];

const ST_4_PALETTE: [u32; 16] = [
    0x00FF_FFFF, 0x00FF_0000, 0x0000_FF00, 0x00FF_FF00, 0x0000_00FF, 0x00FF_00FF, 0x0000_FFFF, 0x0040_4040,
    0x007F_7F7F, 0x00FF_7F7F, 0x007F_FF7F, 0x00FF_FF7F, 0x007F_7FFF, 0x00FF_7FFF, 0x007F_FFFF, 0x0000_0000,
];

#[rustfmt::skip]
const TT_8_PALETTE: [u32; PALETTE_SIZE] = [
    0x00FF_FFFF, 0x00FF_0000, 0x0000_FF00, 0x00FF_FF00, 0x0000_00FF, 0x00FF_00FF, 0x0000_FFFF, 0x00AA_AAAA,
    0x0066_6666, 0x00FF_9999, 0x0099_FF99, 0x00FF_FF99, 0x0099_99FF, 0x00FF_99FF, 0x0099_FFFF, 0x0000_0000,
    0x00FF_FFFF, 0x00EE_EEEE, 0x00DD_DDDD, 0x00CC_CCCC, 0x00BB_BBBB, 0x00AA_AAAA, 0x0099_9999, 0x0088_8888,
    0x0077_7777, 0x0066_6666, 0x0055_5555, 0x0044_4444, 0x0033_3333, 0x0022_2222, 0x0011_1111, 0x0000_0000,
    0x00FF_0000, 0x00FF_0011, 0x00FF_0022, 0x00FF_0033, 0x00FF_0044, 0x00FF_0055, 0x00FF_0066, 0x00FF_0077,
    0x00FF_0088, 0x00FF_0099, 0x00FF_00AA, 0x00FF_00BB, 0x00FF_00CC, 0x00FF_00DD, 0x00FF_00EE, 0x00FF_00FF,
    0x00EE_00FF, 0x00DD_00FF, 0x00CC_00FF, 0x00BB_00FF, 0x00AA_00FF, 0x0099_00FF, 0x0088_00FF, 0x0077_00FF,
    0x0066_00FF, 0x0055_00FF, 0x0044_00FF, 0x0033_00FF, 0x0022_00FF, 0x0011_00FF, 0x0000_00FF, 0x0000_11FF,
    0x0000_22FF, 0x0000_33FF, 0x0000_44FF, 0x0000_55FF, 0x0000_66FF, 0x0000_77FF, 0x0000_88FF, 0x0000_99FF,
    0x0000_AAFF, 0x0000_BBFF, 0x0000_CCFF, 0x0000_DDFF, 0x0000_EEFF, 0x0000_FFFF, 0x0000_FFEE, 0x0000_FFDD,
    0x0000_FFCC, 0x0000_FFBB, 0x0000_FFAA, 0x0000_FF99, 0x0000_FF88, 0x0000_FF77, 0x0000_FF66, 0x0000_FF55,
    0x0000_FF44, 0x0000_FF33, 0x0000_FF22, 0x0000_FF11, 0x0000_FF00, 0x0011_FF00, 0x0022_FF00, 0x0033_FF00,
    0x0044_FF00, 0x0055_FF00, 0x0066_FF00, 0x0077_FF00, 0x0088_FF00, 0x0099_FF00, 0x00AA_FF00, 0x00BB_FF00,
    0x00CC_FF00, 0x00DD_FF00, 0x00EE_FF00, 0x00FF_FF00, 0x00FF_EE00, 0x00FF_DD00, 0x00FF_CC00, 0x00FF_BB00,
    0x00FF_AA00, 0x00FF_9900, 0x00FF_8800, 0x00FF_7700, 0x00FF_6600, 0x00FF_5500, 0x00FF_4400, 0x00FF_3300,
    0x00FF_2200, 0x00FF_1100, 0x00BB_0000, 0x00BB_0011, 0x00BB_0022, 0x00BB_0033, 0x00BB_0044, 0x00BB_0055,
    0x00BB_0066, 0x00BB_0077, 0x00BB_0088, 0x00BB_0099, 0x00BB_00AA, 0x00BB_00BB, 0x00AA_00BB, 0x0099_00BB,
    0x0088_00BB, 0x0077_00BB, 0x0066_00BB, 0x0055_00BB, 0x0044_00BB, 0x0033_00BB, 0x0022_00BB, 0x0011_00BB,
    0x0000_00BB, 0x0000_11BB, 0x0000_22BB, 0x0000_33BB, 0x0000_44BB, 0x0000_55BB, 0x0000_66BB, 0x0000_77BB,
    0x0000_88BB, 0x0000_99BB, 0x0000_AABB, 0x0000_BBBB, 0x0000_BBAA, 0x0000_BB99, 0x0000_BB88, 0x0000_BB77,
    0x0000_BB66, 0x0000_BB55, 0x0000_BB44, 0x0000_BB33, 0x0000_BB22, 0x0000_BB11, 0x0000_BB00, 0x0011_BB00,
    0x0022_BB00, 0x0033_BB00, 0x0044_BB00, 0x0055_BB00, 0x0066_BB00, 0x0077_BB00, 0x0088_BB00, 0x0099_BB00,
    0x00AA_BB00, 0x00BB_BB00, 0x00BB_AA00, 0x00BB_9900, 0x00BB_8800, 0x00BB_7700, 0x00BB_6600, 0x00BB_5500,
    0x00BB_4400, 0x00BB_3300, 0x00BB_2200, 0x00BB_1100, 0x0077_0000, 0x0077_0011, 0x0077_0022, 0x0077_0033,
    0x0077_0044, 0x0077_0055, 0x0077_0066, 0x0077_0077, 0x0066_0077, 0x0055_0077, 0x0044_0077, 0x0033_0077,
    0x0022_0077, 0x0011_0077, 0x0000_0077, 0x0000_1177, 0x0000_2277, 0x0000_3377, 0x0000_4477, 0x0000_5577,
    0x0000_6677, 0x0000_7777, 0x0000_7766, 0x0000_7755, 0x0000_7744, 0x0000_7733, 0x0000_7722, 0x0000_7711,
    0x0000_7700, 0x0011_7700, 0x0022_7700, 0x0033_7700, 0x0044_7700, 0x0055_7700, 0x0066_7700, 0x0077_7700,
    0x0077_6600, 0x0077_5500, 0x0077_4400, 0x0077_3300, 0x0077_2200, 0x0077_1100, 0x0044_0000, 0x0044_0011,
    0x0044_0022, 0x0044_0033, 0x0044_0044, 0x0033_0044, 0x0022_0044, 0x0011_0044, 0x0000_0044, 0x0000_1144,
    0x0000_2244, 0x0000_3344, 0x0000_4444, 0x0000_4433, 0x0000_4422, 0x0000_4411, 0x0000_4400, 0x0011_4400,
    0x0022_4400, 0x0033_4400, 0x0044_4400, 0x0044_3300, 0x0044_2200, 0x0044_1100, 0x00FF_FFFF, 0x0000_0000,
];

/// The built-in table for a depth. Unsupported depths (including the display-off
/// depth 0) get the full 256-entry table.
pub fn default_table(depth: u32) -> &'static [u32] {
    match depth {
        1 => &MONO_PALETTE,
        2 => &ST_2_PALETTE,
        4 => &ST_4_PALETTE,
        _ => &TT_8_PALETTE,
    }
}

#[derive(Clone, Debug)]
pub struct Palette {
    entries: [u32; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        let mut palette = Self {
            entries: [0; PALETTE_SIZE],
        };
        palette.reset(0);
        palette
    }
}

impl Palette {
    /// Store `color` at `index`. Out-of-range indices are ignored. Returns true if the
    /// stored entry changed.
    pub fn write(&mut self, index: usize, color: u32) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) if *entry != color => {
                *entry = color;
                true
            }
            _ => false,
        }
    }

    /// Read the entry at `index`, or 0 if out of range.
    pub fn read(&self, index: usize) -> u32 {
        self.entries.get(index).copied().unwrap_or(0)
    }

    /// Overwrite the live table with the built-in table for `depth`. Entries the
    /// built-in table does not define are cleared.
    pub fn reset(&mut self, depth: u32) {
        let table = default_table(depth);
        self.entries = [0; PALETTE_SIZE];
        self.entries[..table.len()].copy_from_slice(table);
    }

    #[inline]
    pub fn entries(&self) -> &[u32; PALETTE_SIZE] {
        &self.entries
    }
}
