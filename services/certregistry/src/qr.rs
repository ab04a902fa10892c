//! QR code encoding for certificate share links.
//!
//! Produces an SVG data URL so the image can be embedded directly in a layout
//! without a separate asset request.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use qrcode::QrCode;
use qrcode::render::svg;
use thiserror::Error;

pub const QR_PIXELS: u32 = 200;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("qr encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),
}

pub trait QrEncoder: Send + Sync {
    /// Encode `data` into a displayable image URL.
    fn encode(&self, data: &str) -> Result<String, QrError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SvgQrEncoder;

impl QrEncoder for SvgQrEncoder {
    fn encode(&self, data: &str) -> Result<String, QrError> {
        let code = QrCode::new(data.as_bytes())?;
        let image = code
            .render::<svg::Color<'_>>()
            .min_dimensions(QR_PIXELS, QR_PIXELS)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build();
        Ok(format!(
            "data:image/svg+xml;base64,{}",
            STANDARD.encode(image.as_bytes())
        ))
    }
}
