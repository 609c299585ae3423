//! QR rendering: URL text in, PNG bytes out.

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};
use qrcode::{Color, QrCode};
use thiserror::Error;

use crate::config::{EcLevel, QrConfig};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Largest image edge the renderer will allocate, in pixels
pub const MAX_SIDE: u32 = 8192;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("rendered image of {0} pixels per side exceeds {max}", max = MAX_SIDE)]
    TooLarge(u128),
}

pub type Result<T> = std::result::Result<T, RenderError>;

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

/// Renders QR codes with one fixed profile.
///
/// The symbol version is the smallest that fits the data. Output is an 8-bit
/// grayscale PNG; identical input always yields identical bytes.
#[derive(Debug, Clone)]
pub struct QrRenderer {
    profile: QrConfig,
}

impl QrRenderer {
    pub fn new(profile: QrConfig) -> Self {
        Self { profile }
    }

    /// Encode `data` and serialize it as PNG
    pub fn render(&self, data: &str) -> Result<Bytes> {
        let code = QrCode::with_error_correction_level(data, self.profile.ec_level.into())?;
        let image = self.rasterize(&code)?;

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::L8,
        )?;

        tracing::debug!(
            modules = code.width(),
            pixels = image.width(),
            bytes = png.len(),
            "Rendered QR code"
        );

        Ok(Bytes::from(png))
    }

    fn rasterize(&self, code: &QrCode) -> Result<GrayImage> {
        let modules = code.width() as u128;
        let border = u128::from(self.profile.border);
        let scale = u128::from(self.profile.module_size);

        let side = (modules + 2 * border) * scale;
        let side = u32::try_from(side)
            .ok()
            .filter(|side| *side <= MAX_SIDE)
            .ok_or(RenderError::TooLarge(side))?;

        let colors = code.to_colors();
        let width = code.width();
        let border = self.profile.border;
        let scale = self.profile.module_size;

        Ok(GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / scale, y / scale);
            if mx < border || my < border {
                return LIGHT;
            }
            let (mx, my) = ((mx - border) as usize, (my - border) as usize);
            if mx >= width || my >= width {
                return LIGHT;
            }
            match colors[my * width + mx] {
                Color::Dark => DARK,
                Color::Light => LIGHT,
            }
        }))
    }
}
