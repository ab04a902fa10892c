//! Certificate template rendering.
//!
//! # Purpose
//! Maps a certificate onto one of three fixed 1024×723 layouts. A [`Layout`] is
//! plain data: a background plus absolutely positioned elements. It serializes
//! to JSON for the admin preview and to an HTML fragment (see [`html`]) that a
//! client-side rasterizer turns into a PNG.
//!
//! # Key invariants
//! - Template selection is an exhaustive match on [`CertificateType`].
//! - Every element position is a constant; only the text varies.
//! - The QR code appears only on image-backed templates and only when one is
//!   supplied.
use crate::model::{Certificate, CertificateType};
use serde::Serialize;
use utoipa::ToSchema;

pub mod html;
mod templates;

pub const CANVAS_WIDTH: u32 = 1024;
pub const CANVAS_HEIGHT: u32 = 723;

#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    IndividualMembership,
    Accreditation,
    OrganizationalMembership,
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub template: TemplateKind,
    pub width: u32,
    pub height: u32,
    pub background: Background,
    pub elements: Vec<Element>,
}

impl Layout {
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn text_of(&self, id: &str) -> Option<&str> {
        match &self.element(id)?.content {
            Content::Text { text, .. } => Some(text.as_str()),
            Content::Image { .. } => None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Background {
    Image { src: String },
    Solid { color: String },
}

/// Horizontal placement. `Center` places the element's midpoint at
/// `50% + offset` pixels of the canvas width.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Anchor {
    Left { px: f32 },
    Center { offset: f32 },
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    pub top: f32,
    pub anchor: Anchor,
    pub width: Option<u32>,
    pub content: Content,
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Content {
    Text { text: String, style: TextStyle },
    Image { src: String, height: u32 },
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: u32,
    pub font_weight: u16,
    pub color: String,
    pub italic: bool,
    pub centered: bool,
}

/// Select and fill the layout for `certificate`.
///
/// `qr` is a displayable image URL (usually an SVG data URL) pointing at the
/// certificate's public page.
pub fn render(certificate: &Certificate, qr: Option<&str>) -> Layout {
    match certificate.cert_type {
        CertificateType::IndividualMembership => templates::individual_membership(certificate),
        CertificateType::Accreditation => templates::accreditation(certificate, qr),
        CertificateType::OrganizationalMembership => {
            templates::organizational_membership(certificate, qr)
        }
    }
}

/// "{n} Year" for one year or less, "{n} Years" otherwise.
pub fn validity_text(years: i32) -> String {
    if years > 1 {
        format!("{years} Years")
    } else {
        format!("{years} Year")
    }
}
