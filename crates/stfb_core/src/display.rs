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

    display.rs

    Display surface interface consumed by video devices, and a headless implementation

*/

//! A video device draws decoded scanlines directly into a [DisplaySurface] and then
//! tells the surface which rectangle changed. A frontend turns those notifications
//! into texture uploads or window repaints. [HeadlessSurface] just records them.

use std::fmt;

use crate::devices::stfb::PaletteEntry;

/// Host pixel formats a surface may present.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 32 bits per pixel, `0x00RRGGBB` in a native-endian u32.
    Xrgb8888,
    /// 16 bits per pixel, 5-6-5.
    Rgb565,
    /// 8 bits per pixel, indexed.
    Indexed8,
}

impl PixelFormat {
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Xrgb8888 => 32,
            PixelFormat::Rgb565 => 16,
            PixelFormat::Indexed8 => 8,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl UpdateRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// The half-open row range `[y, y + h)` covered by this rect.
    pub fn rows(&self) -> std::ops::Range<u32> {
        self.y..self.y + self.h
    }
}

impl fmt::Display for UpdateRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.w, self.h, self.x, self.y)
    }
}

pub trait DisplaySurface {
    fn pixel_format(&self) -> PixelFormat;
    /// Current (width, height) in pixels.
    fn size(&self) -> (u32, u32);
    /// Reallocate the surface. Contents after a resize are undefined.
    fn resize(&mut self, width: u32, height: u32);
    /// Mutable access to one row of 32-bit pixels. Returns at least `width` pixels.
    fn row_mut(&mut self, y: u32) -> &mut [u32];
    /// Notify the host that the given rectangle changed.
    fn update(&mut self, rect: UpdateRect);
}

/// A surface backed by a plain pixel vector, used by the headless frontend and tests.
///
/// Update notifications are queued until drained with [HeadlessSurface::take_updates].
#[derive(Clone, Debug)]
pub struct HeadlessSurface {
    format:  PixelFormat,
    width:   u32,
    height:  u32,
    pixels:  Vec<u32>,
    updates: Vec<UpdateRect>,
    resizes: usize,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_format(width, height, PixelFormat::Xrgb8888)
    }

    pub fn with_format(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            format,
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            updates: Vec::new(),
            resizes: 0,
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn row(&self, y: u32) -> &[u32] {
        let start = (y * self.width) as usize;
        &self.pixels[start..start + self.width as usize]
    }

    pub fn take_updates(&mut self) -> Vec<UpdateRect> {
        std::mem::take(&mut self.updates)
    }

    pub fn pending_updates(&self) -> &[UpdateRect] {
        &self.updates
    }

    pub fn resize_count(&self) -> usize {
        self.resizes
    }

    /// Convert the surface to packed 8-bit RGB, for screenshots.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in &self.pixels {
            let entry = PaletteEntry::from_u32(*pixel);
            out.extend_from_slice(&[entry.red(), entry.green(), entry.blue()]);
        }
        out
    }
}

impl DisplaySurface for HeadlessSurface {
    fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize];
        self.resizes += 1;
    }

    fn row_mut(&mut self, y: u32) -> &mut [u32] {
        let start = (y * self.width) as usize;
        &mut self.pixels[start..start + self.width as usize]
    }

    fn update(&mut self, rect: UpdateRect) {
        self.updates.push(rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_rgb8_splits_channels() {
        let mut surface = HeadlessSurface::new(2, 1);
        surface.row_mut(0).copy_from_slice(&[0x0012_3456, 0xFFAB_CDEF]);
        assert_eq!(surface.to_rgb8(), vec![0x12, 0x34, 0x56, 0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn updates_queue_until_taken() {
        let mut surface = HeadlessSurface::new(4, 4);
        surface.update(UpdateRect::new(0, 1, 4, 2));
        assert_eq!(surface.pending_updates(), &[UpdateRect::new(0, 1, 4, 2)]);
        assert_eq!(surface.take_updates().len(), 1);
        assert!(surface.pending_updates().is_empty());
    }
}
