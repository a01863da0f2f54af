//! Headless capture: PNG screenshots.

#![allow(clippy::cast_possible_truncation)]

use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::Path;

use atari_tia::FRAME_WIDTH;

use crate::Machine;

/// Save the visible lines of the last frame as a PNG file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_screenshot(machine: &Machine, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    write_png(
        std::io::BufWriter::new(file),
        &machine.rgb_frame(),
        FRAME_WIDTH as u32,
        u32::from(machine.display_height()),
    )
}

/// Encode `0xRRGGBB` pixels as an RGB PNG.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write_png<W: Write>(
    w: W,
    pixels: &[u32],
    width: u32,
    height: u32,
) -> Result<(), Box<dyn Error>> {
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let mut rgb = Vec::with_capacity(pixels.len() * 3);
    for &pixel in pixels {
        rgb.push((pixel >> 16) as u8);
        rgb.push((pixel >> 8) as u8);
        rgb.push(pixel as u8);
    }

    writer.write_image_data(&rgb)?;
    Ok(())
}

/// Dump `num_frames` frames as numbered PNGs under `dir/frames`.
///
/// # Errors
///
/// Returns an error if emulation fails or frames cannot be saved.
pub fn record(machine: &mut Machine, dir: &Path, num_frames: u32) -> Result<(), Box<dyn Error>> {
    let frames_dir = dir.join("frames");
    fs::create_dir_all(&frames_dir)?;

    for i in 1..=num_frames {
        machine.process_frame()?;
        save_screenshot(machine, &frames_dir.join(format!("{i:06}.png")))?;
    }

    log::info!("captured {num_frames} frames to {}", frames_dir.display());
    Ok(())
}
