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

    stfb_headless::lib.rs

    Headless front-end for the ST framebuffer emulator

*/

//! Headless front-end main library component.
//!
//! The headless frontend stands in for guest software: it programs a display mode
//! through the adapter's registers, paints a test pattern into video memory, and then
//! runs frames, acknowledging each VBL interrupt the way a guest handler would. Each
//! frame it rewrites one scanline so the dirty tracking has something to find.

#![forbid(unsafe_code)]

mod pattern;

use std::{path::Path, time::Instant};

use anyhow::{anyhow, Context};

use stfb_config::ConfigFileParams;
use stfb_core::{
    devices::stfb::{PlaneDepth, StfbRegister, VBL_DEFAULT_PERIOD_NS},
    display::DisplaySurface,
    Machine,
};

use crate::pattern::PatternTarget;

pub const DEFAULT_CONFIG_PATH: &str = "./stfb.toml";

#[derive(Debug, Default)]
pub struct Counter {
    pub frames: u64,
    pub vbl_acks: u64,
    pub vbl_firings: u64,
    pub updates: u64,
}

fn load_config() -> Result<ConfigFileParams, anyhow::Error> {
    match stfb_config::read_config_file(DEFAULT_CONFIG_PATH) {
        Ok(config) => Ok(config),
        Err(e) => match e.downcast_ref::<std::io::Error>() {
            Some(io) if io.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Configuration file not found, using defaults.");
                stfb_config::read_config_string("")
            }
            _ => Err(e).context("Failed to read configuration file"),
        },
    }
}

/// Program the configured display mode and VBL rate through the register block.
pub fn program_mode(machine: &mut Machine, config: &ConfigFileParams) {
    machine.write_register(StfbRegister::VblPeriod, config.demo.vbl_period_ns);
    machine.write_register(StfbRegister::Depth, config.demo.depth);
    machine.write_register(StfbRegister::Width, config.demo.width);
    machine.write_register(StfbRegister::Height, config.demo.height);
    machine.write_register(StfbRegister::Vaddr, config.demo.vaddr);

    if machine.read_register(StfbRegister::Vaddr) == 0 {
        log::warn!(
            "Display mode {}x{}x{} at {:#010X} was rejected; display is off",
            config.demo.width,
            config.demo.height,
            config.demo.depth,
            config.demo.vaddr
        );
    }
    else {
        log::info!(
            "Display mode {}x{}x{} at {:#010X}",
            config.demo.width,
            config.demo.height,
            config.demo.depth,
            config.demo.vaddr
        );
    }
}

/// Invert one scanline of video memory in place.
fn touch_scanline(machine: &mut Machine, frame: u64) {
    let Some(mode) = machine.stfb().mode()
    else {
        return;
    };
    let stride = mode.stride() as u32;
    let y = (frame % mode.height as u64) as u32;
    let address = mode.vaddr.wrapping_add(y.wrapping_mul(stride));

    for offset in (0..stride).step_by(4) {
        let word_address = address.wrapping_add(offset);
        let word = machine.read_u32(word_address);
        machine.write_u32(word_address, !word);
    }
}

/// Run the configured number of frames. Returns frame and interrupt counters.
pub fn run_frames(machine: &mut Machine, frames: u32) -> Counter {
    let mut counter = Counter::default();
    let refresh_period = machine.config().refresh_period_ns;
    let frame_ns = if refresh_period > 0 {
        refresh_period
    }
    else {
        VBL_DEFAULT_PERIOD_NS as u64
    };

    for _ in 0..frames {
        let result = machine.run_for(frame_ns);
        counter.vbl_firings += result.vbl_firings as u64;
        counter.updates += result.updates as u64;
        if refresh_period == 0 {
            counter.updates += machine.refresh() as u64;
        }
        // Nothing presents the headless surface, so drop its update notifications.
        machine.surface_mut().take_updates();

        if machine.stfb().irq_asserted() {
            machine.ack_vbl();
            counter.vbl_acks += 1;
        }

        touch_scanline(machine, counter.frames);
        counter.frames += 1;
    }
    counter
}

pub fn save_screenshot(machine: &Machine, path: &Path) -> Result<(), anyhow::Error> {
    let surface = machine.surface();
    let (width, height) = surface.size();
    let image = image::RgbImage::from_raw(width, height, surface.to_rgb8())
        .ok_or_else(|| anyhow!("Surface buffer does not match {}x{}", width, height))?;
    image
        .save(path)
        .with_context(|| format!("Failed to write screenshot {}", path.display()))?;
    log::info!("Wrote screenshot to {}", path.display());
    Ok(())
}

pub fn run() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let mut machine = Machine::new(config.machine_config())?;

    match PlaneDepth::from_bits(config.demo.depth) {
        Some(depth) => {
            let target = PatternTarget {
                depth,
                width: config.demo.width,
                height: config.demo.height,
                vaddr: config.demo.vaddr,
            };
            pattern::paint(machine.ram_mut(), config.demo.pattern, &target);
        }
        None => {
            log::warn!("No test pattern for depth {}", config.demo.depth);
        }
    }

    program_mode(&mut machine, &config);

    let start = Instant::now();
    let counter = run_frames(&mut machine, config.emulator.frames);
    let elapsed = start.elapsed();

    let stats = machine.stfb().stats();
    log::info!(
        "Ran {} frames in {:.2?}: {} VBL firings, {} acknowledged, {} updates",
        counter.frames,
        elapsed,
        counter.vbl_firings,
        counter.vbl_acks,
        counter.updates
    );
    log::info!(
        "Redraw: {} passes, {} full, {} lines drawn, {} resizes",
        stats.passes,
        stats.full_redraws,
        stats.lines_drawn,
        stats.resizes
    );

    if let Some(path) = &config.emulator.screenshot {
        save_screenshot(&machine, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stfb_config::{read_config, CmdLineArgs};

    fn setup(toml: &str) -> (Machine, ConfigFileParams) {
        let config = read_config(toml, CmdLineArgs::default()).unwrap();
        let machine = Machine::new(config.machine_config()).unwrap();
        (machine, config)
    }

    #[test]
    fn default_demo_runs_and_acks_vbl() {
        let (mut machine, config) = setup("");
        program_mode(&mut machine, &config);
        assert!(machine.stfb().mode().is_some());

        let counter = run_frames(&mut machine, 10);
        assert_eq!(counter.frames, 10);
        // VBL runs slightly faster than the host refresh, one per frame.
        assert_eq!(counter.vbl_firings, 10);
        assert_eq!(counter.vbl_acks, 10);
        // One full redraw, then one touched scanline per frame.
        assert_eq!(counter.updates, 10);
        assert_eq!(machine.surface().size(), (320, 200));
        assert!(machine.surface().pending_updates().is_empty());
    }

    #[test]
    fn long_run_does_not_accumulate_updates() {
        let (mut machine, config) = setup("[machine]\nrefresh_period_ns = 1000000\n[demo]\ndepth = 1\nheight = 8");
        program_mode(&mut machine, &config);

        let counter = run_frames(&mut machine, 1000);
        assert_eq!(counter.updates, 1000);
        assert!(machine.surface().pending_updates().is_empty());
    }

    #[test]
    fn touch_scanline_wraps_at_top_of_memory() {
        let (mut machine, config) = setup("[demo]\ndepth = 1\nwidth = 320\nheight = 8\nvaddr = 0xFFFFFF00\nvbl_period_ns = 0");
        program_mode(&mut machine, &config);
        assert!(machine.stfb().mode().is_some());

        for frame in 0..8 {
            touch_scanline(&mut machine, frame);
        }
    }

    #[test]
    fn rejected_mode_runs_with_display_off() {
        let (mut machine, config) = setup("[demo]\nwidth = 100\nvbl_period_ns = 0");
        program_mode(&mut machine, &config);
        assert!(machine.stfb().mode().is_none());

        let counter = run_frames(&mut machine, 5);
        assert_eq!(counter.updates, 0);
        assert_eq!(counter.vbl_firings, 0);
    }

    #[test]
    fn manual_refresh_when_refresh_disabled() {
        let (mut machine, config) = setup("[machine]\nrefresh_period_ns = 0\n[demo]\ndepth = 1");
        program_mode(&mut machine, &config);

        let counter = run_frames(&mut machine, 3);
        assert_eq!(counter.updates, 3);
    }
}
