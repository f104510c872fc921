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

    benches::stfb_bench.rs

    Benchmarks for the ST framebuffer device

*/

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use stfb_core::{
    bus::GuestMemory,
    devices::stfb::{PlaneDepth, StfbRegister, PALETTE_SIZE},
    display::HeadlessSurface,
    StfbConfig,
    StfbDevice,
};

const WIDTH: usize = 640;

pub fn stfb_decode_bench(c: &mut Criterion) {
    // One-time setup code goes here
    let mut palette = [0u32; PALETTE_SIZE];
    for (i, entry) in palette.iter_mut().enumerate() {
        *entry = (i as u32) * 0x0001_0101;
    }

    for depth in [PlaneDepth::One, PlaneDepth::Two, PlaneDepth::Four, PlaneDepth::Eight] {
        let src: Vec<u8> = (0..WIDTH * depth.planes() / 8).map(|i| (i * 37) as u8).collect();
        let mut dst = vec![0u32; WIDTH];
        let draw_line = depth.draw_fn();

        c.bench_function(&format!("stfb_bench_draw_line_{}bpp", depth.planes()), |b| {
            b.iter(|| {
                // Measured code goes here
                draw_line(black_box(&src), &mut dst, WIDTH, &palette);
            });
        });
    }
}

fn setup_device(depth: u32) -> (StfbDevice, GuestMemory, HeadlessSurface) {
    let surface = HeadlessSurface::new(640, 400);
    let mut stfb = StfbDevice::attach(StfbConfig::default(), &surface).unwrap();
    stfb.write_register(StfbRegister::Depth as usize, depth, 0);
    stfb.write_register(StfbRegister::Width as usize, 640, 0);
    stfb.write_register(StfbRegister::Height as usize, 400, 0);
    stfb.write_register(StfbRegister::Vaddr as usize, 0x1_0000, 0);
    (stfb, GuestMemory::new(0x10_0000), surface)
}

pub fn stfb_redraw_bench(c: &mut Criterion) {
    c.bench_function("stfb_bench_full_redraw_4bpp", |b| {
        // Per-sample (note that a sample can be many iterations) setup goes here
        let (mut stfb, mut mem, mut surface) = setup_device(4);

        b.iter(|| {
            stfb.invalidate_display();
            black_box(stfb.update_display(&mut mem, &mut surface));
            surface.take_updates();
        });
    });

    c.bench_function("stfb_bench_idle_redraw_4bpp", |b| {
        let (mut stfb, mut mem, mut surface) = setup_device(4);
        stfb.update_display(&mut mem, &mut surface);

        b.iter(|| {
            black_box(stfb.update_display(&mut mem, &mut surface));
            surface.take_updates();
        });
    });

    c.bench_function("stfb_bench_sparse_redraw_4bpp", |b| {
        let (mut stfb, mut mem, mut surface) = setup_device(4);
        stfb.update_display(&mut mem, &mut surface);
        let mut line = 0u32;

        b.iter(|| {
            // Touch every 16th scanline.
            for y in (line % 16..400).step_by(16) {
                mem.write_u16(0x1_0000 + y * 320, line as u16);
            }
            line = line.wrapping_add(1);
            black_box(stfb.update_display(&mut mem, &mut surface));
            surface.take_updates();
        });
    });
}

criterion_group!(benches, stfb_decode_bench, stfb_redraw_bench);
criterion_main!(benches);
