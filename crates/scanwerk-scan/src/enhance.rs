// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-profile page enhancement — brightness offset and contrast factor
// applied to scanned pages as they are materialised.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::settings::ScanProfile;

/// Whether the profile asks for any adjustment at all.
pub fn profile_adjusts(profile: &ScanProfile) -> bool {
    profile.brightness != 0 || (profile.contrast - 1.0).abs() > f32::EPSILON
}

/// Apply the profile's brightness/contrast settings to one encoded page,
/// returning re-encoded PNG bytes. A no-op profile returns the input
/// unchanged without a decode round-trip.
pub fn adjust_page(bytes: Vec<u8>, profile: &ScanProfile) -> Result<Vec<u8>> {
    if !profile_adjusts(profile) {
        return Ok(bytes);
    }

    let img = image::load_from_memory(&bytes)
        .map_err(|err| ScanwerkError::Image(format!("failed to decode scanned page: {err}")))?;

    let adjusted = adjust(img, profile.brightness, profile.contrast);

    let mut out = Vec::new();
    adjusted
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|err| ScanwerkError::Image(format!("failed to re-encode page: {err}")))?;
    Ok(out)
}

/// Brightness offset (-255..=255) then contrast factor around the midpoint.
fn adjust(img: DynamicImage, brightness: i32, contrast: f32) -> DynamicImage {
    let brightness = brightness.clamp(-255, 255);
    let rgba = img.to_rgba8();

    let adjusted = image::ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let channel = |c: u8| -> u8 {
            let brightened = (c as i32 + brightness).clamp(0, 255) as f32;
            let contrasted = contrast * (brightened - 128.0) + 128.0;
            contrasted.clamp(0.0, 255.0) as u8
        };
        image::Rgba([channel(r), channel(g), channel(b), a])
    });

    DynamicImage::ImageRgba8(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_page(level: u8) -> Vec<u8> {
        let buffer = image::GrayImage::from_pixel(8, 8, image::Luma([level]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn neutral_profile_is_passthrough() {
        let profile = ScanProfile::default();
        let bytes = gray_page(128);
        let out = adjust_page(bytes.clone(), &profile).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn brightness_shifts_pixels() {
        let profile = ScanProfile {
            brightness: 50,
            ..Default::default()
        };
        let out = adjust_page(gray_page(100), &profile).unwrap();
        let img = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0).0[0], 150);
    }

    #[test]
    fn contrast_pushes_away_from_midpoint() {
        let profile = ScanProfile {
            contrast: 2.0,
            ..Default::default()
        };
        let out = adjust_page(gray_page(160), &profile).unwrap();
        let img = image::load_from_memory(&out).unwrap().to_rgba8();
        // 2.0 * (160 - 128) + 128 = 192
        assert_eq!(img.get_pixel(0, 0).0[0], 192);
    }

    #[test]
    fn garbage_bytes_fail_cleanly() {
        let profile = ScanProfile {
            brightness: 10,
            ..Default::default()
        };
        assert!(matches!(
            adjust_page(vec![0, 1, 2, 3], &profile),
            Err(ScanwerkError::Image(_))
        ));
    }
}
