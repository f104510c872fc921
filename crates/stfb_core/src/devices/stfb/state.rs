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

    devices::stfb::state.rs

    Save and restore of ST framebuffer device state

*/

//! Device state is the guest-visible register and palette contents plus the timer and
//! interrupt line. Derived state (the frame view, the selected decoder) is rebuilt on
//! load by validating the restored registers the same way a VADDR write does.

use serde_derive::{Deserialize, Serialize};

use super::{StfbDevice, StfbRegister, NUM_REGS, PALETTE_SIZE};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StfbState {
    pub regs: Vec<u32>,
    pub palette: Vec<u32>,
    pub vbl_deadline: Option<u64>,
    pub irq_asserted: bool,
}

impl StfbDevice {
    pub fn save_state(&self) -> StfbState {
        StfbState {
            regs: self.regs.as_slice().to_vec(),
            palette: self.palette.entries().to_vec(),
            vbl_deadline: self.vbl.deadline(),
            irq_asserted: self.irq.is_asserted(),
        }
    }

    /// Restore saved state. Short register or palette vectors leave the remaining
    /// entries at their reset values; extra entries are ignored.
    pub fn load_state(&mut self, state: &StfbState) {
        self.reset();

        for (index, value) in state.regs.iter().enumerate().take(NUM_REGS) {
            if let Some(reg) = StfbRegister::from_repr(index) {
                self.regs.set(reg, *value);
            }
        }
        for (index, color) in state.palette.iter().enumerate().take(PALETTE_SIZE) {
            self.palette.write(index, *color);
        }

        let period = self.regs.get(StfbRegister::VblPeriod);
        self.vbl.restore(period, state.vbl_deadline);
        if !self.vbl.is_armed() {
            self.regs.set(StfbRegister::VblPeriod, 0);
        }
        self.irq.set_asserted(state.irq_asserted);

        self.commit_mode();
        self.full_redraw = true;
        log::debug!("STFB: state loaded, mode {:?}", self.mode());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        devices::stfb::{PlaneDepth, StfbConfig},
        display::HeadlessSurface,
    };

    fn device() -> StfbDevice {
        StfbDevice::attach(StfbConfig::default(), &HeadlessSurface::default()).unwrap()
    }

    fn configured_device() -> StfbDevice {
        let mut dev = device();
        dev.write_register(StfbRegister::Depth as usize, 4, 0);
        dev.write_register(StfbRegister::Width as usize, 640, 0);
        dev.write_register(StfbRegister::Height as usize, 200, 0);
        dev.write_register(StfbRegister::Vaddr as usize, 0x7_8000, 0);
        dev.write_register(StfbRegister::VblPeriod as usize, 2_000_000, 1_000);
        dev.write_palette(3, 0x0012_3456);
        dev.run(2_001_000);
        dev
    }

    #[test]
    fn state_survives_json_round_trip() {
        let dev = configured_device();
        let state = dev.save_state();

        let json = serde_json::to_string(&state).unwrap();
        let decoded: StfbState = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, state);

        let mut restored = device();
        restored.load_state(&decoded);

        assert_eq!(restored.save_state(), state);
        let mode = restored.mode().unwrap();
        assert_eq!(mode.depth, PlaneDepth::Four);
        assert_eq!(mode.width, 640);
        assert_eq!(restored.read_palette(3), 0x0012_3456);
        assert!(restored.irq_asserted());
        assert_eq!(restored.next_deadline(), Some(4_001_000));
        assert!(restored.full_redraw_pending());
    }

    #[test]
    fn invalid_saved_geometry_loads_as_display_off() {
        let mut state = configured_device().save_state();
        state.regs[StfbRegister::Width as usize] = 100;

        let mut dev = device();
        dev.load_state(&state);
        assert!(dev.mode().is_none());
        assert_eq!(dev.register(StfbRegister::Vaddr), 0);
        assert_eq!(dev.register(StfbRegister::Depth), 0);
    }

    #[test]
    fn short_state_is_padded_with_reset_values() {
        let state = StfbState {
            regs: vec![0, 50],
            palette: vec![0x0000_0001],
            vbl_deadline: Some(10),
            irq_asserted: false,
        };
        let mut dev = device();
        dev.load_state(&state);

        assert_eq!(dev.register(StfbRegister::VblPeriod), 0);
        assert!(!dev.vbl().is_armed());
        assert_eq!(dev.read_palette(0), 0x0000_0001);
        assert_eq!(dev.read_palette(7), 0x00AA_AAAA);
        assert!(dev.mode().is_none());
    }

    #[test]
    fn saved_period_without_deadline_loads_idle() {
        let mut state = configured_device().save_state();
        state.vbl_deadline = None;

        let mut dev = device();
        dev.load_state(&state);
        assert_eq!(dev.register(StfbRegister::VblPeriod), 0);
        assert_eq!(dev.vbl().period(), 0);
        assert!(!dev.vbl().is_armed());
        assert_eq!(dev.next_deadline(), None);
    }
}
