//! # PDF Serializer
//!
//! Takes laid-out pages and writes a fillable PDF 1.7 file. The writer emits
//! raw objects itself: the subset needed here (standard Type1 fonts, flate
//! content streams, image XObjects, AcroForm widgets) is small.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- Catalog (with /AcroForm when there are fields)
//! 2 0 obj ... endobj  <- Pages
//! ...                 <- fonts, images, content, pages, widgets, fields
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Layout uses a top-left origin; everything is flipped here into PDF's
//! bottom-left user space.

pub(crate) mod acroform;
pub(crate) mod encoding;

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use chrono::{DateTime, Utc};
use miniz_oxide::deflate::compress_to_vec_zlib;

use self::acroform::{FormFonts, PendingWidget};
use self::encoding::{pdf_text_string, win_ansi_literal};
use crate::error::ExportError;
use crate::font::StandardFont;
use crate::image_loader::{ImagePixelData, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, Rect};
use crate::style::Color;

/// Document information dictionary contents.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing. An object's id is its index.
pub(crate) struct PdfBuilder {
    objects: Vec<Vec<u8>>,
    /// Fonts in resource order: `/F0`, `/F1`, ...
    fonts: Vec<(StandardFont, usize)>,
    /// Image XObject ids, indexed as `/Im0`, `/Im1`, ...
    image_objects: Vec<usize>,
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        Self {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
            fonts: Vec::new(),
            image_objects: Vec::new(),
        }
    }

    /// Allocate an id whose contents are written later with [`set`](Self::set).
    pub(crate) fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len() - 1
    }

    pub(crate) fn set(&mut self, id: usize, data: Vec<u8>) {
        self.objects[id] = data;
    }

    pub(crate) fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    /// Push a flate-compressed stream object. `dict_entries` go into its
    /// dictionary ahead of `/Length` and `/Filter`.
    pub(crate) fn push_stream(&mut self, dict_entries: &str, content: &[u8]) -> usize {
        let compressed = compress_to_vec_zlib(content, 6);
        let mut data: Vec<u8> = Vec::new();
        let sep = if dict_entries.is_empty() { "" } else { " " };
        let _ = write!(
            data,
            "<< {}{}/Length {} /Filter /FlateDecode >>\nstream\n",
            dict_entries,
            sep,
            compressed.len()
        );
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_id(&self, font: StandardFont) -> Option<usize> {
        self.fonts.iter().find(|(f, _)| *f == font).map(|(_, id)| *id)
    }

    fn font_index(&self, font: StandardFont) -> usize {
        self.fonts.iter().position(|(f, _)| *f == font).unwrap_or(0)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        images: &[LoadedImage],
        info: &DocumentInfo,
    ) -> Result<Vec<u8>, ExportError> {
        let mut builder = PdfBuilder::new();

        self.register_fonts(&mut builder, pages);
        for image in images {
            let id = Self::write_image_xobject(&mut builder, image);
            builder.image_objects.push(id);
        }

        let form_fonts = FormFonts {
            helvetica: builder
                .font_id(StandardFont::Helvetica)
                .ok_or_else(|| ExportError::Render("Helvetica not registered".to_string()))?,
            zapf_dingbats: builder
                .font_id(StandardFont::ZapfDingbats)
                .ok_or_else(|| ExportError::Render("ZapfDingbats not registered".to_string()))?,
        };

        let resources = self.build_resource_dict(&builder);
        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(pages.len());
        let mut widgets: Vec<PendingWidget<'_>> = Vec::new();

        for page in pages {
            let content = self.build_content_stream_for_page(page, &builder);
            let content_obj_id = builder.push_stream("", content.as_bytes());

            let page_obj_id = builder.reserve();
            let mut annots: Vec<usize> = Vec::with_capacity(page.fields.len());
            for field in &page.fields {
                let widget_id = builder.reserve();
                let appearance = acroform::write_appearance(&mut builder, field, form_fonts);
                widgets.push(PendingWidget {
                    id: widget_id,
                    page_id: page_obj_id,
                    rect: pdf_rect(&field.rect, page.height),
                    field,
                    appearance,
                });
                annots.push(widget_id);
            }

            let mut page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >>",
                page.width, page.height, content_obj_id, resources
            );
            if !annots.is_empty() {
                page_dict.push_str(" /Annots [");
                for id in &annots {
                    let _ = write!(page_dict, " {} 0 R", id);
                }
                page_dict.push_str(" ]");
            }
            page_dict.push_str(" >>");
            builder.set(page_obj_id, page_dict.into_bytes());
            page_obj_ids.push(page_obj_id);
        }

        let acroform_id = acroform::write_form(&mut builder, &widgets, form_fonts)?;

        // Catalog (object 1)
        let catalog = match acroform_id {
            Some(id) => format!("<< /Type /Catalog /Pages 2 0 R /AcroForm {} 0 R >>", id),
            None => "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        };
        builder.set(1, catalog.into_bytes());

        // Pages tree (object 2)
        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.set(
            2,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids,
                page_obj_ids.len()
            )
            .into_bytes(),
        );

        let info_obj_id = builder.push(Self::info_dict(info).into_bytes());
        Ok(self.serialize(&builder, info_obj_id))
    }

    fn info_dict(info: &DocumentInfo) -> String {
        let mut dict = String::from("<< ");
        if let Some(title) = &info.title {
            let _ = write!(dict, "/Title {} ", pdf_text_string(title));
        }
        if let Some(subject) = &info.subject {
            let _ = write!(dict, "/Subject {} ", pdf_text_string(subject));
        }
        if let Some(created) = &info.created {
            let _ = write!(dict, "/CreationDate ({}) ", created.format("D:%Y%m%d%H%M%SZ"));
        }
        let _ = write!(
            dict,
            "/Producer (worksheet-pdf {}) /Creator (worksheet-pdf) >>",
            env!("CARGO_PKG_VERSION")
        );
        dict
    }

    /// Register the fonts used across all pages. Helvetica and ZapfDingbats
    /// are always present because the form's default resources need them.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let mut used: BTreeSet<StandardFont> = BTreeSet::new();
        used.insert(StandardFont::Helvetica);
        used.insert(StandardFont::ZapfDingbats);
        for page in pages {
            for element in page.elements.iter().chain(page.chrome.iter()) {
                if let DrawCommand::Text { lines, .. } = &element.draw {
                    used.extend(lines.iter().map(|l| l.font));
                }
            }
        }

        for font in used {
            let dict = if font.uses_win_ansi() {
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.pdf_name()
                )
            } else {
                format!("<< /Type /Font /Subtype /Type1 /BaseFont /{} >>", font.pdf_name())
            };
            let id = builder.push(dict.into_bytes());
            builder.fonts.push((font, id));
        }
    }

    /// The resource dictionary body shared by every page.
    fn build_resource_dict(&self, builder: &PdfBuilder) -> String {
        let mut fonts = String::new();
        for (i, (_, id)) in builder.fonts.iter().enumerate() {
            let _ = write!(fonts, "/F{} {} 0 R ", i, id);
        }
        let mut resources = format!("/Font << {}>>", fonts);
        if !builder.image_objects.is_empty() {
            resources.push_str(" /XObject << ");
            for (i, id) in builder.image_objects.iter().enumerate() {
                let _ = write!(resources, "/Im{} {} 0 R ", i, id);
            }
            resources.push_str(">>");
        }
        resources
    }

    /// Build the content stream for a single page: content flow, then chrome.
    fn build_content_stream_for_page(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for element in page.elements.iter().chain(page.chrome.iter()) {
            self.write_element(&mut stream, element, page.height, builder);
        }
        stream
    }

    /// Write a single layout element as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
    ) {
        let [x, y, _, _] = pdf_rect(&element.bounds(), page_height);
        let (w, h) = (element.width, element.height);

        match &element.draw {
            DrawCommand::Rect {
                fill,
                stroke,
                stroke_width,
                radius,
            } => {
                let op = match (fill, stroke) {
                    (Some(_), Some(_)) => "B",
                    (Some(_), None) => "f",
                    (None, Some(_)) => "S",
                    (None, None) => return,
                };
                stream.push_str("q\n");
                if let Some(c) = fill {
                    let _ = writeln!(stream, "{} rg", color_ops(c));
                }
                if let Some(c) = stroke {
                    let _ = writeln!(stream, "{} RG\n{:.2} w", color_ops(c), stroke_width);
                }
                if *radius > 0.0 {
                    self.write_rounded_rect(stream, x, y, w, h, *radius);
                } else {
                    let _ = writeln!(stream, "{:.2} {:.2} {:.2} {:.2} re", x, y, w, h);
                }
                let _ = writeln!(stream, "{}\nQ", op);
            }

            DrawCommand::Line { color, line_width } => {
                let _ = write!(
                    stream,
                    "q\n{} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    color_ops(color),
                    line_width,
                    x,
                    page_height - element.y,
                    x + w,
                    page_height - element.y - h
                );
            }

            DrawCommand::Text { lines, color } => {
                if lines.iter().all(|l| l.text.is_empty()) {
                    return;
                }
                let _ = write!(stream, "BT\n{} rg\n", color_ops(color));
                for line in lines.iter().filter(|l| !l.text.is_empty()) {
                    let text = if line.font.uses_win_ansi() {
                        win_ansi_literal(&line.text)
                    } else {
                        encoding::escape_pdf_string(&line.text)
                    };
                    let _ = write!(
                        stream,
                        "/F{} {:.2} Tf\n1 0 0 1 {:.2} {:.2} Tm\n({}) Tj\n",
                        builder.font_index(line.font),
                        line.font_size,
                        line.x,
                        page_height - line.y,
                        text
                    );
                }
                stream.push_str("ET\n");
            }

            DrawCommand::Image { image_index } => {
                if *image_index < builder.image_objects.len() {
                    let _ = write!(
                        stream,
                        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                        w, h, x, y, image_index
                    );
                }
            }
        }
    }

    /// A rectangle path with uniformly rounded corners, approximated with
    /// cubic Beziers.
    fn write_rounded_rect(&self, stream: &mut String, x: f64, y: f64, w: f64, h: f64, radius: f64) {
        let k = 0.5522847498;
        let r = radius.min(w / 2.0).min(h / 2.0);
        let kr = r * k;

        let _ = writeln!(stream, "{:.2} {:.2} m", x + r, y);
        let _ = writeln!(stream, "{:.2} {:.2} l", x + w - r, y);
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            x + w - r + kr,
            y,
            x + w,
            y + r - kr,
            x + w,
            y + r
        );
        let _ = writeln!(stream, "{:.2} {:.2} l", x + w, y + h - r);
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            x + w,
            y + h - r + kr,
            x + w - r + kr,
            y + h,
            x + w - r,
            y + h
        );
        let _ = writeln!(stream, "{:.2} {:.2} l", x + r, y + h);
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            x + r - kr,
            y + h,
            x,
            y + h - r + kr,
            x,
            y + h - r
        );
        let _ = writeln!(stream, "{:.2} {:.2} l", x, y + r);
        let _ = writeln!(
            stream,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            x,
            y + r - kr,
            x + r - kr,
            y,
            x + r,
            y
        );
        stream.push_str("h\n");
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, grayscale } => {
                let color_space = if *grayscale { "/DeviceGray" } else { "/DeviceRGB" };
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode \
                     /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.push(obj_data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha_data| {
                        let dict = format!(
                            "/Type /XObject /Subtype /Image /Width {} /Height {} \
                             /ColorSpace /DeviceGray /BitsPerComponent 8",
                            image.width_px, image.height_px
                        );
                        format!(" /SMask {} 0 R", builder.push_stream(&dict, alpha_data))
                    })
                    .unwrap_or_default();

                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8{}",
                    image.width_px, image.height_px, smask_ref
                );
                builder.push_stream(&dict, rgb)
            }
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        // Header
        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(obj);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

fn color_ops(c: &Color) -> String {
    format!("{:.3} {:.3} {:.3}", c.r, c.g, c.b)
}

/// Top-left layout rect to `[llx lly urx ury]` in PDF space.
fn pdf_rect(rect: &Rect, page_height: f64) -> [f64; 4] {
    [
        rect.x,
        page_height - rect.bottom(),
        rect.right(),
        page_height - rect.y,
    ]
}
