//! HTML output for layouts and the public certificate pages.
//!
//! The fragment is exactly `CANVAS_WIDTH`×`CANVAS_HEIGHT` pixels with every
//! element absolutely positioned, so a browser-side rasterizer can capture it
//! 1:1.
use super::{Anchor, Background, CANVAS_HEIGHT, CANVAS_WIDTH, Content, Element, Layout};
use crate::model::{Certificate, CertificateStatus};
use maud::{DOCTYPE, Markup, PreEscaped, html};

pub const FRAGMENT_ID: &str = "certificate-template";

const RASTERIZER_SCRIPT: &str =
    "https://cdn.jsdelivr.net/npm/html-to-image@1.11.11/dist/html-to-image.js";

/// Self-contained, absolutely positioned fragment for one layout. `file_name`
/// becomes the `data-filename` the download script reads.
pub fn layout_fragment(layout: &Layout, file_name: Option<&str>) -> Markup {
    let background = match &layout.background {
        Background::Solid { color } => format!("background:{color};"),
        Background::Image { .. } => String::new(),
    };
    html! {
        div id=(FRAGMENT_ID) data-filename=[file_name]
            style=(format!(
                "position:relative;overflow:hidden;width:{}px;height:{}px;{background}",
                layout.width, layout.height
            )) {
            @if let (Background::Image { src }) = &layout.background {
                img src=(src) alt=""
                    style="position:absolute;top:0;left:0;width:100%;height:100%;object-fit:fill";
            }
            @for element in &layout.elements {
                (element_markup(element))
            }
        }
    }
}

fn element_markup(element: &Element) -> Markup {
    let mut style = format!("position:absolute;top:{}px;", element.top);
    match element.anchor {
        Anchor::Left { px } => style.push_str(&format!("left:{px}px;")),
        Anchor::Center { offset } if offset == 0.0 => {
            style.push_str("left:50%;transform:translateX(-50%);")
        }
        Anchor::Center { offset } => style.push_str(&format!(
            "left:calc(50% + {offset}px);transform:translateX(-50%);"
        )),
    }
    if let Some(width) = element.width {
        style.push_str(&format!("width:{width}px;"));
    }
    match &element.content {
        Content::Text {
            text,
            style: text_style,
        } => {
            style.push_str(&format!(
                "font-family:{};font-size:{}px;font-weight:{};color:{};",
                text_style.font_family,
                text_style.font_size,
                text_style.font_weight,
                text_style.color
            ));
            if text_style.italic {
                style.push_str("font-style:italic;");
            }
            if text_style.centered {
                style.push_str("text-align:center;");
            }
            html! { div data-field=(element.id) style=(style) { (text) } }
        }
        Content::Image { src, height } => {
            style.push_str(&format!("height:{height}px;"));
            html! { img data-field=(element.id) src=(src) alt="QR Code" style=(style); }
        }
    }
}

fn page(title: &str, head: Markup, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                (head)
            }
            body style="margin:0;font-family:sans-serif;background:#f1f5f9" {
                (body)
            }
        }
    }
}

/// Public certificate page with the layout and a PNG download button.
pub fn certificate_page(certificate: &Certificate, layout: &Layout, public_url: &str) -> Markup {
    let file_name = certificate.download_file_name();
    let script = format!(
        "function downloadCertificate(){{\
         var node=document.getElementById('{FRAGMENT_ID}');\
         htmlToImage.toPng(node,{{width:{CANVAS_WIDTH},height:{CANVAS_HEIGHT},pixelRatio:2}})\
         .then(function(url){{var a=document.createElement('a');a.download=node.dataset.filename;a.href=url;a.click();}});\
         }}"
    );
    let head = html! {
        script src=(RASTERIZER_SCRIPT) {}
        script { (PreEscaped(script)) }
    };
    let body = html! {
        main style="padding:32px;display:flex;flex-direction:column;align-items:center;gap:16px" {
            h1 style="margin:0" { (certificate.organization_name) }
            p style="margin:0;color:#475569" {
                (certificate.cert_type.display_name()) " · " (certificate.certificate_number)
            }
            div style="overflow:auto;max-width:100%" {
                (layout_fragment(layout, Some(&file_name)))
            }
            p style="margin:0" {
                button type="button" onclick="downloadCertificate()" { "Download " (file_name) }
            }
            p style="margin:0;color:#64748b;font-size:14px" {
                "Share: " a href=(public_url) { (public_url) }
            }
        }
    };
    page(&certificate.certificate_number, head, body)
}

/// Notice shown instead of a PAUSED or REVOKED certificate.
pub fn restricted_page(status: CertificateStatus) -> Markup {
    let heading = match status {
        CertificateStatus::Revoked => "Certificate Revoked",
        _ => "Certificate Paused",
    };
    let body = html! {
        main style="padding:64px;text-align:center" {
            h1 { (heading) }
            p {
                "This certificate is currently not available for viewing. "
                "Please contact the American Accreditation Association for more information."
            }
        }
    };
    page(heading, html! {}, body)
}

pub fn not_found_page() -> Markup {
    let body = html! {
        main style="padding:64px;text-align:center" {
            h1 { "Certificate Not Found" }
            p { "No certificate matches this link." }
        }
    };
    page("Certificate Not Found", html! {}, body)
}
