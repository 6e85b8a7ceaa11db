use anyhow::{Result, anyhow};
use tray_icon::Icon;

const ICON_SIZE: i32 = 22;

/// Icon variant for different states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconVariant {
    /// Nothing was running at the last refresh
    Idle,
    /// At least one solver or viewer was running at the last refresh
    Busy,
}

impl IconVariant {
    fn color(self) -> (u8, u8, u8) {
        match self {
            IconVariant::Idle => (255, 255, 255),
            IconVariant::Busy => (255, 149, 0),
        }
    }
}

/// Draw the tray icon: a gear-like ring with a solid hub.
pub fn create_icon(variant: IconVariant) -> Result<Icon> {
    let size = ICON_SIZE;
    let mut pixels = vec![0u8; (size * size * 4) as usize];
    let (r, g, b) = variant.color();

    let draw_pixel = |pixels: &mut [u8], x: i32, y: i32, alpha: u8| {
        if x >= 0 && x < size && y >= 0 && y < size {
            let idx = ((y * size + x) * 4) as usize;
            pixels[idx] = r;
            pixels[idx + 1] = g;
            pixels[idx + 2] = b;
            pixels[idx + 3] = alpha;
        }
    };

    let center = size / 2;

    // Ring
    for dy in -8..=8 {
        for dx in -8..=8 {
            let d2 = dx * dx + dy * dy;
            if (36..=64).contains(&d2) {
                draw_pixel(&mut pixels, center + dx, center + dy, 255);
            }
        }
    }

    // Teeth every 45 degrees
    for step in 0..8 {
        let rad = (step as f32 * 45.0).to_radians();
        for radius in 8..=10 {
            let x = center + (radius as f32 * rad.cos()).round() as i32;
            let y = center + (radius as f32 * rad.sin()).round() as i32;
            draw_pixel(&mut pixels, x, y, 255);
        }
    }

    // Hub
    for dy in -2..=2 {
        for dx in -2..=2 {
            if dx * dx + dy * dy <= 4 {
                draw_pixel(&mut pixels, center + dx, center + dy, 200);
            }
        }
    }

    Icon::from_rgba(pixels, size as u32, size as u32)
        .map_err(|err| anyhow!("failed to build icon: {err}"))
}
