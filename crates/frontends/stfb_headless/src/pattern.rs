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

    stfb_headless::pattern.rs

    Test patterns painted into planar video memory

*/

//! Patterns are described as a palette index per pixel and then packed into the
//! interleaved plane layout the adapter scans: one big-endian word per plane per
//! 16-pixel group, plane 0 first.

use stfb_config::DemoPattern;
use stfb_core::{
    bus::GuestMemory,
    devices::stfb::{PlaneDepth, PIXELS_PER_GROUP},
};

/// Geometry of the frame to paint.
#[derive(Copy, Clone, Debug)]
pub struct PatternTarget {
    pub depth: PlaneDepth,
    pub width: u32,
    pub height: u32,
    pub vaddr: u32,
}

fn pattern_index(pattern: DemoPattern, target: &PatternTarget, x: u32, y: u32) -> usize {
    let colors = target.depth.colors() as u32;
    let index = match pattern {
        DemoPattern::Bars => {
            let bar_width = (target.width / colors).max(1);
            x / bar_width
        }
        DemoPattern::Checker => (x / 16 + y / 16) & 1,
        DemoPattern::Gradient => y * colors / target.height.max(1),
    };
    (index % colors) as usize
}

/// Pack 16 palette indices into one plane word per plane.
pub fn pack_group(indices: &[usize; PIXELS_PER_GROUP], planes: usize) -> Vec<u16> {
    let mut words = vec![0u16; planes];
    for (i, index) in indices.iter().enumerate() {
        for (p, word) in words.iter_mut().enumerate() {
            if index & (1 << p) != 0 {
                *word |= 0x8000 >> i;
            }
        }
    }
    words
}

pub fn paint(ram: &mut GuestMemory, pattern: DemoPattern, target: &PatternTarget) {
    let planes = target.depth.planes();
    let stride = target.width as usize * planes / 8;
    let mut line = vec![0u8; stride];

    for y in 0..target.height {
        for (group, chunk) in line.chunks_exact_mut(planes * 2).enumerate() {
            let mut indices = [0usize; PIXELS_PER_GROUP];
            for (i, index) in indices.iter_mut().enumerate() {
                let x = (group * PIXELS_PER_GROUP + i) as u32;
                *index = pattern_index(pattern, target, x, y);
            }
            for (word, bytes) in pack_group(&indices, planes).iter().zip(chunk.chunks_exact_mut(2)) {
                bytes.copy_from_slice(&word.to_be_bytes());
            }
        }
        ram.write_bytes(target.vaddr + y * stride as u32, &line);
    }

    log::debug!(
        "Painted {:?} pattern: {}x{}x{} at {:#010X}",
        pattern,
        target.width,
        target.height,
        planes,
        target.vaddr
    );
}
