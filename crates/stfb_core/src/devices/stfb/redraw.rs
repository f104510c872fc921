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

    devices::stfb::redraw.rs

    Dirty-scanline redraw for the ST framebuffer

*/

//! The redraw pass runs once per host refresh. It asks the memory subsystem which
//! bytes of the frame were written since the previous pass, repaints only scanlines
//! that touch a dirty byte, and reports each contiguous band of repainted scanlines to
//! the surface as one update rectangle.

use super::StfbDevice;
use crate::{
    bus::FramebufferMemory,
    display::{DisplaySurface, UpdateRect},
};

/// Running counters for redraw passes, reported by frontends.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RedrawStats {
    /// Passes run with the display on.
    pub passes: u64,
    /// Passes that repainted every scanline.
    pub full_redraws: u64,
    pub lines_drawn: u64,
    pub updates: u64,
    pub resizes: u64,
}

impl StfbDevice {
    /// Run one redraw pass. Returns the number of update notifications sent to
    /// `surface`.
    pub fn update_display(&mut self, mem: &mut dyn FramebufferMemory, surface: &mut dyn DisplaySurface) -> usize {
        let mode = match *self.mode.get() {
            Some(mode) => mode,
            None => return 0,
        };

        if self.mode.is_dirty() {
            self.view = Some(mode.view());
            self.mode.clean();
        }
        let view = match self.view {
            Some(view) => view,
            None => return 0,
        };

        if surface.size() != (mode.width, mode.height) {
            log::debug!(
                "STFB: resizing surface from {:?} to {}x{}",
                surface.size(),
                mode.width,
                mode.height
            );
            surface.resize(mode.width, mode.height);
            self.stats.resizes += 1;
            self.full_redraw = true;
        }

        let snapshot = mem.snapshot_and_clear_dirty(view.base, view.len);

        let width = mode.width as usize;
        let draw_line = self.draw_line;
        self.line_buf.resize(view.stride, 0);

        let mut updates = 0;
        let mut run_start: Option<u32> = None;

        for y in 0..mode.height {
            let offset = y as usize * view.stride;
            if self.full_redraw || snapshot.is_dirty(offset, view.stride) {
                mem.read_bytes(view.line_address(y), &mut self.line_buf);
                draw_line(&self.line_buf, surface.row_mut(y), width, self.palette.entries());
                self.stats.lines_drawn += 1;
                if run_start.is_none() {
                    run_start = Some(y);
                }
            }
            else if let Some(start) = run_start.take() {
                surface.update(UpdateRect::new(0, start, mode.width, y - start));
                updates += 1;
            }
        }
        if let Some(start) = run_start {
            surface.update(UpdateRect::new(0, start, mode.width, mode.height - start));
            updates += 1;
        }

        if self.full_redraw {
            self.stats.full_redraws += 1;
        }
        self.full_redraw = false;
        self.stats.passes += 1;
        self.stats.updates += updates as u64;

        log::trace!("STFB: redraw pass sent {} updates", updates);
        updates
    }
}
