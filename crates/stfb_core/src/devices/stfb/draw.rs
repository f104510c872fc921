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

    devices::stfb::draw.rs

    Planar scanline decoders for the ST framebuffer

*/

//! Scanline decoders for interleaved bit-plane video memory.
//!
//! Memory is organized in groups of 16 horizontal pixels. Each group is stored as one
//! big-endian 16-bit word per plane, plane 0 first. Within a word, bit 15 is the
//! leftmost pixel. Plane `p` supplies bit `p` of the palette index, so plane 0 is the
//! least significant bit.
//!
//! ```text
//!  depth 4, one group:   [ plane0 ][ plane1 ][ plane2 ][ plane3 ]   (4 x u16 BE)
//!  pixel 0 index     =   p3.b15  p2.b15  p1.b15  p0.b15
//! ```
//!
//! There is one decoder per supported depth. They share a body and differ only in the
//! number of planes gathered per bit, so each one compiles to a fixed-width gather.
//! The device picks one when the display mode changes, not per pixel.

use super::palette::PALETTE_SIZE;

pub const PIXELS_PER_GROUP: usize = 16;

/// Decode one scanline. `src` holds the packed plane words for the line, `dst`
/// receives `width` pixels. `width` is always a multiple of 16.
pub type DrawLineFn = fn(src: &[u8], dst: &mut [u32], width: usize, palette: &[u32; PALETTE_SIZE]);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaneDepth {
    One,
    Two,
    Four,
    Eight,
}

const DRAW_LINE_TABLE: [DrawLineFn; 4] = [draw_line_1bpp, draw_line_2bpp, draw_line_4bpp, draw_line_8bpp];

impl PlaneDepth {
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            1 => Some(PlaneDepth::One),
            2 => Some(PlaneDepth::Two),
            4 => Some(PlaneDepth::Four),
            8 => Some(PlaneDepth::Eight),
            _ => None,
        }
    }

    /// Bits per pixel, which is also the number of planes.
    #[inline]
    pub fn planes(&self) -> usize {
        match self {
            PlaneDepth::One => 1,
            PlaneDepth::Two => 2,
            PlaneDepth::Four => 4,
            PlaneDepth::Eight => 8,
        }
    }

    /// Number of distinct palette indices this depth can produce.
    #[inline]
    pub fn colors(&self) -> usize {
        1 << self.planes()
    }

    #[inline]
    fn table_index(&self) -> usize {
        match self {
            PlaneDepth::One => 0,
            PlaneDepth::Two => 1,
            PlaneDepth::Four => 2,
            PlaneDepth::Eight => 3,
        }
    }

    pub fn draw_fn(&self) -> DrawLineFn {
        DRAW_LINE_TABLE[self.table_index()]
    }
}

#[inline(always)]
fn draw_line_planar<const PLANES: usize>(src: &[u8], dst: &mut [u32], width: usize, palette: &[u32; PALETTE_SIZE]) {
    debug_assert!(width % PIXELS_PER_GROUP == 0);

    let groups = src.chunks_exact(PLANES * 2);
    let spans = dst[..width].chunks_exact_mut(PIXELS_PER_GROUP);

    for (group, span) in groups.zip(spans) {
        let mut words = [0u16; PLANES];
        for (p, word) in words.iter_mut().enumerate() {
            *word = u16::from_be_bytes([group[p * 2], group[p * 2 + 1]]);
        }

        for (bit, pixel) in span.iter_mut().enumerate() {
            let shift = 15 - bit;
            let mut index = 0usize;
            for (p, word) in words.iter().enumerate() {
                index |= (((*word >> shift) & 1) as usize) << p;
            }
            *pixel = palette[index];
        }
    }
}

pub fn draw_line_1bpp(src: &[u8], dst: &mut [u32], width: usize, palette: &[u32; PALETTE_SIZE]) {
    draw_line_planar::<1>(src, dst, width, palette);
}

pub fn draw_line_2bpp(src: &[u8], dst: &mut [u32], width: usize, palette: &[u32; PALETTE_SIZE]) {
    draw_line_planar::<2>(src, dst, width, palette);
}

pub fn draw_line_4bpp(src: &[u8], dst: &mut [u32], width: usize, palette: &[u32; PALETTE_SIZE]) {
    draw_line_planar::<4>(src, dst, width, palette);
}

pub fn draw_line_8bpp(src: &[u8], dst: &mut [u32], width: usize, palette: &[u32; PALETTE_SIZE]) {
    draw_line_planar::<8>(src, dst, width, palette);
}
