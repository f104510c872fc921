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

    machine.rs

    A minimal machine hosting the ST framebuffer: guest RAM, the adapter and a virtual clock

*/

//! The [Machine] is the single execution context the framebuffer runs in. Bus accesses,
//! VBL timer firings and display refreshes are all driven from here, in virtual time
//! order, so the device never needs locking.
//!
//! There is no CPU. A frontend or test plays the part of guest software by issuing bus
//! reads and writes between calls to [Machine::run_for].

use serde_derive::Deserialize;

use crate::{
    bus::{GuestMemory, MemoryMappedDevice, OPEN_BUS_U32},
    devices::stfb::{StfbConfig, StfbDevice, StfbError, StfbRegister},
    display::HeadlessSurface,
};

pub const DEFAULT_RAM_SIZE: usize = 0x40_0000;
/// 60Hz host refresh.
pub const DEFAULT_REFRESH_PERIOD_NS: u64 = 16_666_667;

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MachineConfig {
    pub ram_size: usize,
    /// Host refresh period. 0 disables automatic refreshes; call [Machine::refresh]
    /// directly instead.
    pub refresh_period_ns: u64,
    pub framebuffer: StfbConfig,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            ram_size: DEFAULT_RAM_SIZE,
            refresh_period_ns: DEFAULT_REFRESH_PERIOD_NS,
            framebuffer: StfbConfig::default(),
        }
    }
}

/// Counts of events processed by one call to [Machine::run_for].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunResult {
    pub vbl_firings: u32,
    pub refreshes: u32,
    pub updates: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum MachineEvent {
    Vbl,
    Refresh,
}

pub struct Machine {
    config: MachineConfig,
    ram: GuestMemory,
    stfb: StfbDevice,
    surface: HeadlessSurface,
    now_ns: u64,
    next_refresh: Option<u64>,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Result<Self, StfbError> {
        let surface = HeadlessSurface::default();
        let stfb = StfbDevice::attach(config.framebuffer, &surface)?;

        for range in stfb.get_mapping() {
            if (range.address as usize) < config.ram_size {
                log::warn!(
                    "Machine: {} block at {:#010X} shadows guest RAM",
                    range.name,
                    range.address
                );
            }
        }

        log::debug!(
            "Machine: {} bytes of RAM, refresh every {}ns",
            config.ram_size,
            config.refresh_period_ns
        );

        Ok(Self {
            config,
            ram: GuestMemory::new(config.ram_size),
            stfb,
            surface,
            now_ns: 0,
            next_refresh: Self::first_refresh(config.refresh_period_ns, 0),
        })
    }

    fn first_refresh(period: u64, now_ns: u64) -> Option<u64> {
        if period > 0 {
            Some(now_ns + period)
        }
        else {
            None
        }
    }

    /// Reset the device and the clock. RAM contents are preserved, as on a warm reset.
    pub fn reset(&mut self) {
        self.stfb.reset();
        self.now_ns = 0;
        self.next_refresh = Self::first_refresh(self.config.refresh_period_ns, 0);
        self.ram.mark_all_dirty();
    }

    #[inline]
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    #[inline]
    pub fn stfb(&self) -> &StfbDevice {
        &self.stfb
    }

    #[inline]
    pub fn stfb_mut(&mut self) -> &mut StfbDevice {
        &mut self.stfb
    }

    #[inline]
    pub fn ram(&self) -> &GuestMemory {
        &self.ram
    }

    #[inline]
    pub fn ram_mut(&mut self) -> &mut GuestMemory {
        &mut self.ram
    }

    #[inline]
    pub fn surface(&self) -> &HeadlessSurface {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut HeadlessSurface {
        &mut self.surface
    }

    fn is_mmio(&self, address: u32) -> bool {
        let cfg = &self.config.framebuffer;
        cfg.regs_range().contains(address) || cfg.palette_range().contains(address)
    }

    pub fn read_u32(&mut self, address: u32) -> u32 {
        if self.is_mmio(address) {
            self.stfb.mmio_read_u32(address)
        }
        else if self.ram.contains(address) {
            self.ram.read_u32(address)
        }
        else {
            log::warn!("Machine: read from unmapped address {:#010X}", address);
            OPEN_BUS_U32
        }
    }

    pub fn write_u32(&mut self, address: u32, data: u32) {
        if self.is_mmio(address) {
            self.stfb.mmio_write_u32(address, data, self.now_ns);
        }
        else if self.ram.contains(address) {
            self.ram.write_u32(address, data);
        }
        else {
            log::warn!("Machine: write to unmapped address {:#010X}", address);
        }
    }

    /// Write a framebuffer register through its bus address.
    pub fn write_register(&mut self, reg: StfbRegister, data: u32) {
        let address = self.config.framebuffer.regs_base.wrapping_add(reg.offset());
        self.write_u32(address, data);
    }

    pub fn read_register(&mut self, reg: StfbRegister) -> u32 {
        let address = self.config.framebuffer.regs_base.wrapping_add(reg.offset());
        self.read_u32(address)
    }

    /// Acknowledge a pending VBL interrupt, as a guest interrupt handler would.
    pub fn ack_vbl(&mut self) {
        self.write_register(StfbRegister::VblAck, 0);
    }

    /// The earliest pending event and its deadline. VBL wins a tie, so a refresh at the
    /// same instant sees the interrupt already raised.
    fn next_event(&self) -> Option<(u64, MachineEvent)> {
        match (self.stfb.next_deadline(), self.next_refresh) {
            (Some(vbl), Some(refresh)) if vbl <= refresh => Some((vbl, MachineEvent::Vbl)),
            (_, Some(refresh)) => Some((refresh, MachineEvent::Refresh)),
            (Some(vbl), None) => Some((vbl, MachineEvent::Vbl)),
            (None, None) => None,
        }
    }

    /// Advance virtual time by `ns`, processing every event that falls due.
    pub fn run_for(&mut self, ns: u64) -> RunResult {
        let target = self.now_ns.saturating_add(ns);
        let mut result = RunResult::default();

        while let Some((deadline, event)) = self.next_event() {
            if deadline > target {
                break;
            }
            self.now_ns = deadline;
            match event {
                MachineEvent::Vbl => {
                    result.vbl_firings += self.stfb.run(self.now_ns);
                }
                MachineEvent::Refresh => {
                    result.updates += self.refresh();
                    result.refreshes += 1;
                    self.next_refresh = Some(deadline + self.config.refresh_period_ns);
                }
            }
        }

        self.now_ns = target;
        result
    }

    /// Run one display refresh immediately. Returns the number of update rectangles.
    pub fn refresh(&mut self) -> usize {
        self.stfb.update_display(&mut self.ram, &mut self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplaySurface, UpdateRect};

    const REGS: u32 = 0xFFFF_C000;
    const PALETTE: u32 = 0xFFFF_C400;

    fn machine() -> Machine {
        let config = MachineConfig {
            ram_size: 0x10_0000,
            refresh_period_ns: 1_000_000,
            ..Default::default()
        };
        Machine::new(config).unwrap()
    }

    fn set_mode(m: &mut Machine, depth: u32, width: u32, height: u32, vaddr: u32) {
        m.write_register(StfbRegister::Depth, depth);
        m.write_register(StfbRegister::Width, width);
        m.write_register(StfbRegister::Height, height);
        m.write_register(StfbRegister::Vaddr, vaddr);
    }

    #[test]
    fn vbl_holds_until_acknowledged() {
        let mut m = machine();
        m.write_u32(REGS + 0x04, 2_000_000);
        assert_eq!(m.read_u32(REGS + 0x04), 2_000_000);

        m.run_for(1_999_999);
        assert!(!m.stfb().irq_asserted());

        m.run_for(1);
        assert!(m.stfb().irq_asserted());
        assert_eq!(m.stfb().irq().edges(), 1);

        let result = m.run_for(2_000_000);
        assert_eq!(result.vbl_firings, 1);
        assert!(m.stfb().irq_asserted());
        assert_eq!(m.stfb().irq().edges(), 1);

        m.write_u32(REGS, 0);
        assert!(!m.stfb().irq_asserted());

        m.run_for(2_000_000);
        assert!(m.stfb().irq_asserted());
        assert_eq!(m.stfb().irq().edges(), 2);
    }

    #[test]
    fn tiny_period_disables_vbl() {
        let mut m = machine();
        m.write_register(StfbRegister::VblPeriod, 2_000_000);
        m.run_for(500_000);
        m.write_register(StfbRegister::VblPeriod, 1_000);
        assert_eq!(m.read_register(StfbRegister::VblPeriod), 0);

        let result = m.run_for(100_000_000);
        assert_eq!(result.vbl_firings, 0);
        assert!(!m.stfb().irq_asserted());
    }

    #[test]
    fn bad_width_turns_display_off() {
        let mut m = machine();
        m.write_register(StfbRegister::Depth, 1);
        m.write_register(StfbRegister::Height, 200);
        m.write_register(StfbRegister::Width, 321);
        m.write_register(StfbRegister::Vaddr, 100);

        assert_eq!(m.read_register(StfbRegister::Depth), 0);
        assert_eq!(m.read_register(StfbRegister::Width), 0);
        assert_eq!(m.read_register(StfbRegister::Height), 0);
        assert_eq!(m.read_register(StfbRegister::Vaddr), 0);

        let result = m.run_for(5_000_000);
        assert_eq!(result.refreshes, 5);
        assert_eq!(result.updates, 0);
    }

    #[test]
    fn refresh_cadence_redraws_only_changes() {
        let mut m = machine();
        set_mode(&mut m, 4, 320, 16, 0x1_0000);

        let result = m.run_for(1_000_000);
        assert_eq!(result.refreshes, 1);
        assert_eq!(result.updates, 1);
        assert_eq!(m.surface().size(), (320, 16));
        m.surface_mut().take_updates();

        assert_eq!(m.run_for(3_000_000).updates, 0);

        // Line 5 of a 4-plane, 320 pixel frame starts 160 * 5 bytes in.
        m.write_u32(0x1_0000 + 160 * 5, 0xFFFF_FFFF);
        let result = m.run_for(1_000_000);
        assert_eq!(result.updates, 1);
        assert_eq!(m.surface_mut().take_updates(), vec![UpdateRect::new(0, 5, 320, 1)]);

        // Planes 0 and 1 set: index 3.
        let expected = m.stfb().read_palette(3);
        assert_eq!(m.surface().pixel(0, 5), expected);
        assert_eq!(m.surface().pixel(15, 5), expected);
        assert_eq!(m.surface().pixel(16, 5), m.stfb().read_palette(0));
    }

    #[test]
    fn vbl_fires_before_refresh_at_same_instant() {
        let mut m = machine();
        m.write_register(StfbRegister::VblPeriod, 1_000_000);
        assert_eq!(m.next_event(), Some((1_000_000, MachineEvent::Vbl)));

        let result = m.run_for(1_000_000);
        assert_eq!(result.vbl_firings, 1);
        assert_eq!(result.refreshes, 1);
    }

    #[test]
    fn palette_round_trips_through_bus() {
        let mut m = machine();
        m.write_u32(PALETTE + 4 * 200, 0x00C0_FFEE);
        assert_eq!(m.read_u32(PALETTE + 4 * 200), 0x00C0_FFEE);
        assert_eq!(m.stfb().read_palette(200), 0x00C0_FFEE);
    }

    #[test]
    fn ram_and_unmapped_accesses() {
        let mut m = machine();
        m.write_u32(0x100, 0x1234_5678);
        assert_eq!(m.read_u32(0x100), 0x1234_5678);
        assert_eq!(m.ram().read_u8(0x100), 0x12);

        m.write_u32(0x8000_0000, 0xFFFF_FFFF);
        assert_eq!(m.read_u32(0x8000_0000), OPEN_BUS_U32);
    }

    #[test]
    fn zero_refresh_period_disables_refresh() {
        let config = MachineConfig {
            ram_size: 0x10_0000,
            refresh_period_ns: 0,
            ..Default::default()
        };
        let mut m = Machine::new(config).unwrap();
        set_mode(&mut m, 1, 320, 8, 0x2000);

        assert_eq!(m.run_for(100_000_000).refreshes, 0);
        assert_eq!(m.refresh(), 1);
    }

    #[test]
    fn reset_turns_display_off_and_restarts_clock() {
        let mut m = machine();
        set_mode(&mut m, 1, 320, 8, 0x2000);
        m.write_register(StfbRegister::VblPeriod, 2_000_000);
        m.run_for(5_000_000);

        m.reset();
        assert_eq!(m.now_ns(), 0);
        assert!(m.stfb().mode().is_none());
        assert!(!m.stfb().irq_asserted());
        assert_eq!(m.run_for(5_000_000).vbl_firings, 0);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: MachineConfig = serde_json::from_str(r#"{ "ram_size": 1048576 }"#).unwrap();
        assert_eq!(config.ram_size, 0x10_0000);
        assert_eq!(config.refresh_period_ns, DEFAULT_REFRESH_PERIOD_NS);
        assert_eq!(config.framebuffer, StfbConfig::default());
    }

    #[test]
    fn block_past_top_of_address_space_is_rejected() {
        let config = MachineConfig {
            framebuffer: StfbConfig {
                regs_base: 0xFFFF_FFF0,
                palette_base: 0x8000_0000,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(Machine::new(config).err(), Some(StfbError::BlockOutOfRange(0xFFFF_FFF0)));

        // A block ending exactly at the top is fine, and its registers are reachable.
        let config = MachineConfig {
            ram_size: 0x10_0000,
            framebuffer: StfbConfig {
                regs_base: 0xFFFF_FC00,
                palette_base: 0xFFFF_F800,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut m = Machine::new(config).unwrap();
        set_mode(&mut m, 1, 320, 8, 0x2000);
        assert_eq!(m.read_register(StfbRegister::Vaddr), 0x2000);
    }
}
