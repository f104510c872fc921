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

    stfb_config::lib.rs

    Configuration file and command line parsing for the ST framebuffer emulator

*/

//! The `stfb_config` crate parses the emulator's TOML configuration file and overlays
//! command line arguments on top of it. Command line arguments always take priority
//! over the configuration file.
//!
//! Features:
//! - `use_bpaf`: Enable BPAF support for command line argument parsing.

mod cmdline;

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use cfg_if::cfg_if;
use serde_derive::Deserialize;

pub use cmdline::CmdLineArgs;
#[cfg(feature = "use_bpaf")]
use cmdline::cli_args;

use stfb_core::{
    devices::stfb::{StfbConfig, VBL_DEFAULT_PERIOD_NS},
    machine::{MachineConfig, DEFAULT_RAM_SIZE, DEFAULT_REFRESH_PERIOD_NS},
};

/// Test patterns the headless frontend can paint into video memory.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DemoPattern {
    /// Vertical bars cycling through every palette index.
    #[default]
    Bars,
    /// A 16x16 checkerboard of the first two palette entries.
    Checker,
    /// Horizontal bands, one palette index per band.
    Gradient,
}

impl FromStr for DemoPattern {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "bars" => Ok(DemoPattern::Bars),
            "checker" => Ok(DemoPattern::Checker),
            "gradient" => Ok(DemoPattern::Gradient),
            _ => Err(format!("Bad value for pattern: {}", s)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Emulator {
    pub frames: u32,
    pub screenshot: Option<PathBuf>,
}

impl Default for Emulator {
    fn default() -> Self {
        Self {
            frames: 60,
            screenshot: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Machine {
    pub ram_size: usize,
    pub refresh_period_ns: u64,
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            ram_size: DEFAULT_RAM_SIZE,
            refresh_period_ns: DEFAULT_REFRESH_PERIOD_NS,
        }
    }
}

/// The display mode the headless frontend programs before running.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Demo {
    pub depth: u32,
    pub width: u32,
    pub height: u32,
    pub vaddr: u32,
    pub vbl_period_ns: u32,
    pub pattern: DemoPattern,
}

impl Default for Demo {
    fn default() -> Self {
        Self {
            depth: 4,
            width: 320,
            height: 200,
            vaddr: 0x7_8000,
            vbl_period_ns: VBL_DEFAULT_PERIOD_NS,
            pattern: DemoPattern::Bars,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFileParams {
    pub emulator: Emulator,
    pub machine: Machine,
    pub framebuffer: StfbConfig,
    pub demo: Demo,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(frames) = shell_args.frames {
            self.emulator.frames = frames;
        }
        if let Some(screenshot) = shell_args.screenshot {
            self.emulator.screenshot = Some(screenshot);
        }
        if let Some(depth) = shell_args.depth {
            self.demo.depth = depth;
        }
        if let Some(width) = shell_args.width {
            self.demo.width = width;
        }
        if let Some(height) = shell_args.height {
            self.demo.height = height;
        }
        if let Some(vbl_period) = shell_args.vbl_period {
            self.demo.vbl_period_ns = vbl_period;
        }
        if let Some(pattern) = shell_args.pattern {
            self.demo.pattern = pattern;
        }
    }

    /// Assemble the core machine configuration from the `[machine]` and
    /// `[framebuffer]` sections.
    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            ram_size: self.machine.ram_size,
            refresh_period_ns: self.machine.refresh_period_ns,
            framebuffer: self.framebuffer,
        }
    }
}

/// Parse a TOML configuration string and overlay the given command line arguments.
pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;

    log::debug!("toml_config: {:?}", toml_args);

    // Command line arguments override config file arguments
    toml_args.overlay(shell_args);
    Ok(toml_args)
}

fn shell_args() -> CmdLineArgs {
    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("Reading command line arguments...");
            cli_args().run()
        } else {
            log::debug!("Argument reading disabled...");
            CmdLineArgs::default()
        }
    }
}

/// Read the TOML configuration from a file path, parse and overlay command line arguments.
/// The path may be overridden with `--config_file`.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args = shell_args();

    let toml_string = if let Some(configfile_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(configfile_path)?
    }
    else {
        std::fs::read_to_string(default_path)?
    };

    read_config(toml_string, shell_args)
}

/// Read the TOML configuration from a string, parse and overlay command line arguments.
pub fn read_config_string(toml_string: impl AsRef<str>) -> Result<ConfigFileParams, anyhow::Error> {
    read_config(toml_string, shell_args())
}
