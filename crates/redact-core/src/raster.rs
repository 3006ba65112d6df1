//! Page bitmaps and the pixel operations applied to them

use crate::geometry::Rect;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Components in the 0.0..=1.0 range PDF colour operators expect
    pub fn unit(&self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

impl Rgb {
    /// From 0.0..=1.0 components, clamping anything outside that range
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb(byte(r), byte(g), byte(b))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::BLACK
    }
}

/// A rendered page image
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBitmap {
    image: RgbaImage,
}

impl RasterBitmap {
    /// Blank white bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.image.get_pixel(x, y))
    }

    /// Paint an opaque rectangle. Pixels outside the bitmap are ignored.
    pub fn fill_rect(&mut self, rect: &Rect, color: Rgb) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(rect) else {
            return;
        };
        let px = Rgba([color.0, color.1, color.2, 255]);
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, px);
            }
        }
    }

    /// Composite a translucent rectangle over the existing pixels.
    pub fn blend_rect(&mut self, rect: &Rect, color: Rgb, alpha: f32) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(rect) else {
            return;
        };
        let a = alpha.clamp(0.0, 1.0);
        let mix = |under: u8, over: u8| -> u8 {
            (under as f32 * (1.0 - a) + over as f32 * a).round() as u8
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let Rgba([r, g, b, al]) = *self.image.get_pixel(x, y);
                self.image.put_pixel(
                    x,
                    y,
                    Rgba([mix(r, color.0), mix(g, color.1), mix(b, color.2), al]),
                );
            }
        }
    }

    /// Packed RGB rows without alpha, the layout a DeviceRGB image stream uses.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.image
            .pixels()
            .flat_map(|Rgba([r, g, b, _])| [*r, *g, *b])
            .collect()
    }

    /// Every pixel the rectangle touches, clamped to the bitmap.
    ///
    /// Start edges round down and end edges round up, so a partially
    /// covered pixel is always included.
    fn pixel_span(&self, rect: &Rect) -> Option<(u32, u32, u32, u32)> {
        if !rect.is_committable() {
            return None;
        }
        let clamp_x = |v: f64| v.clamp(0.0, self.width() as f64) as u32;
        let clamp_y = |v: f64| v.clamp(0.0, self.height() as f64) as u32;
        let (x0, x1) = (clamp_x(rect.x.floor()), clamp_x(rect.right().ceil()));
        let (y0, y1) = (clamp_y(rect.y.floor()), clamp_y(rect.bottom().ceil()));
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}
