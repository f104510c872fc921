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

    stfb_config::cmdline.rs

    Command line arguments that overlay the configuration file

*/

use std::path::PathBuf;

#[cfg(feature = "use_bpaf")]
use bpaf::Bpaf;

use crate::DemoPattern;

#[cfg_attr(feature = "use_bpaf", derive(Bpaf))]
#[cfg_attr(feature = "use_bpaf", bpaf(options, version, generate(cli_args)))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    #[cfg_attr(feature = "use_bpaf", bpaf(long("config_file"), long("configfile")))]
    pub config_file: Option<PathBuf>,

    /// Number of host frames to run.
    #[cfg_attr(feature = "use_bpaf", bpaf(long("frames")))]
    pub frames: Option<u32>,

    /// Write the final surface to this PNG file.
    #[cfg_attr(feature = "use_bpaf", bpaf(long("screenshot")))]
    pub screenshot: Option<PathBuf>,

    // Display mode
    #[cfg_attr(feature = "use_bpaf", bpaf(long("depth")))]
    pub depth: Option<u32>,
    #[cfg_attr(feature = "use_bpaf", bpaf(long("width")))]
    pub width: Option<u32>,
    #[cfg_attr(feature = "use_bpaf", bpaf(long("height")))]
    pub height: Option<u32>,
    #[cfg_attr(feature = "use_bpaf", bpaf(long("vbl_period"), long("vblperiod")))]
    pub vbl_period: Option<u32>,
    #[cfg_attr(feature = "use_bpaf", bpaf(long("pattern")))]
    pub pattern: Option<DemoPattern>,
}
