//! Coordinate tables for the three certificate templates.
//!
//! Accreditation and organizational membership print over artwork; positions
//! line up with the fields drawn into those images. Individual membership is a
//! self-contained document on a white canvas.
use super::{
    Anchor, Background, CANVAS_HEIGHT, CANVAS_WIDTH, Content, Element, Layout, TemplateKind,
    TextStyle, validity_text,
};
use crate::model::{Certificate, format_certificate_date};

const ACCREDITATION_BACKGROUND: &str = "/certification/orgaccreditation.png";
const ORGANIZATIONAL_BACKGROUND: &str = "/certification/membershipcer.png";

const POPPINS: &str = "Poppins, sans-serif";
const DM_SERIF: &str = "'DM Serif Display', serif";
const OPEN_SANS: &str = "'Open Sans', sans-serif";
const DOCUMENT_SERIF: &str = "Georgia, 'Times New Roman', serif";

const QR_TOP: f32 = 460.0;
const QR_LEFT: f32 = 90.0;
const QR_SIZE: u32 = 94;

const SIGNATORY: &str = "William Moore";

fn style(font_family: &str, font_size: u32, font_weight: u16, color: &str) -> TextStyle {
    TextStyle {
        font_family: font_family.to_string(),
        font_size,
        font_weight,
        color: color.to_string(),
        italic: false,
        centered: false,
    }
}

fn centered(style: TextStyle) -> TextStyle {
    TextStyle {
        centered: true,
        ..style
    }
}

fn italic(style: TextStyle) -> TextStyle {
    TextStyle {
        italic: true,
        ..style
    }
}

fn text(
    id: &str,
    top: f32,
    anchor: Anchor,
    width: Option<u32>,
    value: String,
    style: TextStyle,
) -> Element {
    Element {
        id: id.to_string(),
        top,
        anchor,
        width,
        content: Content::Text { text: value, style },
    }
}

const CENTER: Anchor = Anchor::Center { offset: 0.0 };

/// Header, organization block and footer shared by both artwork templates.
fn artwork_elements(certificate: &Certificate, address_top: f32, qr: Option<&str>) -> Vec<Element> {
    let issue_no = certificate
        .issue_no
        .as_deref()
        .unwrap_or(certificate.certificate_number.as_str());
    let footer = style(DM_SERIF, 14, 700, "#1a365d");
    let mut elements = vec![
        text(
            "certificate-no",
            130.0,
            CENTER,
            None,
            format!("CERTIFICATE NO: {issue_no}"),
            centered(style(POPPINS, 14, 500, "#1f5684")),
        ),
        text(
            "organization-name",
            345.0,
            CENTER,
            Some(600),
            certificate.organization_name.clone(),
            centered(style(DM_SERIF, 32, 400, "#7d1316")),
        ),
        text(
            "address",
            address_top,
            CENTER,
            Some(500),
            certificate.address.clone(),
            centered(style(OPEN_SANS, 14, 400, "#1e3a5f")),
        ),
    ];
    if let Some(src) = qr {
        elements.push(Element {
            id: "qr-code".to_string(),
            top: QR_TOP,
            anchor: Anchor::Left { px: QR_LEFT },
            width: Some(QR_SIZE),
            content: Content::Image {
                src: src.to_string(),
                height: QR_SIZE,
            },
        });
    }
    elements.push(text(
        "issue-date",
        631.0,
        Anchor::Left { px: 124.0 },
        None,
        format_certificate_date(certificate.issue_date),
        footer.clone(),
    ));
    elements.push(text(
        "expiration-date",
        651.0,
        Anchor::Left { px: 124.0 },
        None,
        format_certificate_date(certificate.expiration_date),
        footer,
    ));
    elements
}

pub(super) fn accreditation(certificate: &Certificate, qr: Option<&str>) -> Layout {
    Layout {
        template: TemplateKind::Accreditation,
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
        background: Background::Image {
            src: ACCREDITATION_BACKGROUND.to_string(),
        },
        elements: artwork_elements(certificate, 385.0, qr),
    }
}

pub(super) fn organizational_membership(certificate: &Certificate, qr: Option<&str>) -> Layout {
    let mut elements = artwork_elements(certificate, 395.0, qr);
    elements.push(text(
        "membership-date",
        431.0,
        Anchor::Center { offset: 222.0 },
        Some(600),
        format_certificate_date(certificate.issue_date),
        centered(style(DM_SERIF, 18, 700, "#1a365d")),
    ));
    elements.push(text(
        "scope",
        470.0,
        CENTER,
        Some(600),
        certificate.scope.clone().unwrap_or_default(),
        centered(style(POPPINS, 16, 400, "#1a365d")),
    ));
    elements.push(text(
        "validity",
        540.0,
        Anchor::Center { offset: 30.0 },
        Some(600),
        validity_text(certificate.validity_years()),
        centered(style(POPPINS, 16, 400, "#1a365d")),
    ));
    Layout {
        template: TemplateKind::OrganizationalMembership,
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
        background: Background::Image {
            src: ORGANIZATIONAL_BACKGROUND.to_string(),
        },
        elements,
    }
}

pub(super) fn individual_membership(certificate: &Certificate) -> Layout {
    let body = centered(style(DOCUMENT_SERIF, 18, 400, "#334155"));
    let field = centered(style(DOCUMENT_SERIF, 22, 700, "#1d4ed8"));
    let footer = style(DOCUMENT_SERIF, 16, 700, "#0f172a");
    let member_since = certificate
        .membership_date
        .unwrap_or(certificate.issue_date);

    let mut elements = vec![
        text(
            "title",
            44.0,
            CENTER,
            Some(800),
            "Membership Certificate".to_string(),
            italic(centered(style(DOCUMENT_SERIF, 36, 700, "#0f172a"))),
        ),
        text(
            "certificate-no",
            100.0,
            CENTER,
            Some(800),
            format!("CERTIFICATE NO. {}", certificate.certificate_number),
            centered(style(DOCUMENT_SERIF, 16, 700, "#b91c1c")),
        ),
        text(
            "issuer",
            150.0,
            CENTER,
            Some(800),
            "American Accreditation Association - AAA".to_string(),
            body.clone(),
        ),
        text(
            "certifies",
            184.0,
            CENTER,
            Some(800),
            "Certifies that".to_string(),
            body.clone(),
        ),
        text(
            "organization-name",
            232.0,
            CENTER,
            Some(700),
            certificate.organization_name.clone(),
            field.clone(),
        ),
        text(
            "address",
            276.0,
            CENTER,
            Some(700),
            certificate.address.clone(),
            centered(style(DOCUMENT_SERIF, 16, 400, "#1d4ed8")),
        ),
    ];
    if let Some(qualifications) = &certificate.qualifications {
        elements.push(text(
            "qualifications",
            312.0,
            CENTER,
            Some(700),
            format!("Qualifications: {qualifications}"),
            centered(style(DOCUMENT_SERIF, 16, 400, "#1d4ed8")),
        ));
    }
    elements.extend([
        text(
            "membership-statement",
            372.0,
            CENTER,
            Some(880),
            format!(
                "Has gained the Individual Membership as Recognized Competency member on {}",
                format_certificate_date(member_since)
            ),
            body.clone(),
        ),
        text(
            "validity",
            408.0,
            CENTER,
            Some(800),
            "That's valid for two years".to_string(),
            body,
        ),
        text(
            "issue-date",
            596.0,
            Anchor::Left { px: 64.0 },
            None,
            format!("Issue Date: {}", format_certificate_date(certificate.issue_date)),
            footer.clone(),
        ),
        text(
            "expiration-date",
            626.0,
            Anchor::Left { px: 64.0 },
            None,
            format!("Exp. Date: {}", format_certificate_date(certificate.expiration_date)),
            footer,
        ),
        text(
            "signature",
            590.0,
            Anchor::Left { px: 752.0 },
            Some(208),
            SIGNATORY.to_string(),
            italic(centered(style(DOCUMENT_SERIF, 22, 400, "#475569"))),
        ),
        text(
            "signatory-title",
            628.0,
            Anchor::Left { px: 752.0 },
            Some(208),
            "Executive Director".to_string(),
            centered(style(DOCUMENT_SERIF, 14, 600, "#334155")),
        ),
    ]);
    Layout {
        template: TemplateKind::IndividualMembership,
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
        background: Background::Solid {
            color: "#ffffff".to_string(),
        },
        elements,
    }
}
