//! Paints a `CvLayout` onto A4 pages with printpdf.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Pt, Rgb,
};
use thiserror::Error;
use tracing::info;

use crate::models::CvData;
use crate::render::font_metrics::{get_metrics, Face};
use crate::render::layout::{layout_cv, DrawOp, Shade, PAGE_HEIGHT_PT, PAGE_WIDTH_PT};

#[derive(Debug, Error)]
#[error("PDF rendering failed: {0}")]
pub struct RenderError(String);

#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// `"Ada  Lovelace"` → `"Ada-Lovelace-CV.pdf"`.
pub fn export_filename(full_name: &str) -> String {
    let stem = full_name.split_whitespace().collect::<Vec<_>>().join("-");
    if stem.is_empty() {
        "CV.pdf".to_string()
    } else {
        format!("{stem}-CV.pdf")
    }
}

fn rgb(shade: Shade) -> Color {
    let (r, g, b) = match shade {
        Shade::Ink => (0.11, 0.12, 0.14),
        Shade::Muted => (0.42, 0.45, 0.50),
        Shade::Accent => (0.12, 0.33, 0.60),
        Shade::Line => (0.80, 0.82, 0.85),
    };
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

/// Converts a top-down layout position to a printpdf point.
fn point(x: f32, y_from_top: f32) -> Point {
    Point::new(mm(x), mm(PAGE_HEIGHT_PT - y_from_top))
}

struct Painter<'a> {
    layer: PdfLayerReference,
    regular: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
}

impl Painter<'_> {
    fn font(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Regular => self.regular,
            Face::Bold => self.bold,
        }
    }

    fn paint(&self, op: &DrawOp) {
        match op {
            DrawOp::Text {
                text,
                x,
                y,
                size,
                face,
                shade,
            } => {
                self.layer.set_fill_color(rgb(*shade));
                self.layer.use_text(
                    text.as_str(),
                    *size,
                    mm(*x),
                    mm(PAGE_HEIGHT_PT - y),
                    self.font(*face),
                );
            }
            DrawOp::Rule {
                x1,
                x2,
                y,
                thickness,
                shade,
            } => {
                self.layer.set_outline_color(rgb(*shade));
                self.layer.set_outline_thickness(*thickness);
                self.layer.add_line(Line {
                    points: vec![(point(*x1, *y), false), (point(*x2, *y), false)],
                    is_closed: false,
                });
            }
            DrawOp::Chip {
                text,
                x,
                y,
                width,
                height,
                size,
            } => {
                self.layer.set_outline_color(rgb(Shade::Accent));
                self.layer.set_outline_thickness(0.6);
                self.layer.add_line(Line {
                    points: vec![
                        (point(*x, *y), false),
                        (point(x + width, *y), false),
                        (point(x + width, y + height), false),
                        (point(*x, y + height), false),
                    ],
                    is_closed: true,
                });

                let baseline = y + height / 2.0 + size * 0.35;
                let pad = (width - get_metrics(Face::Regular).width_pt(text, *size)) / 2.0;
                self.layer.set_fill_color(rgb(Shade::Ink));
                self.layer.use_text(
                    text.as_str(),
                    *size,
                    mm(x + pad),
                    mm(PAGE_HEIGHT_PT - baseline),
                    self.regular,
                );
            }
        }
    }
}

/// Renders a validated CV to PDF, one A4 page per layout page.
/// CPU-bound; call from a blocking task.
pub fn render_pdf(cv: &CvData) -> Result<RenderedPdf, RenderError> {
    let layout = layout_cv(cv);

    let full_name = cv.personal.full_name.trim();
    let title = format!("{full_name} CV");
    let (doc, first_page, first_layer) =
        PdfDocument::new(title.as_str(), mm(PAGE_WIDTH_PT), mm(PAGE_HEIGHT_PT), "CV");

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError(e.to_string()))?;

    for (index, ops) in layout.pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(mm(PAGE_WIDTH_PT), mm(PAGE_HEIGHT_PT), "CV")
        };
        let painter = Painter {
            layer: doc.get_page(page).get_layer(layer),
            regular: &regular,
            bold: &bold,
        };
        for op in ops {
            painter.paint(op);
        }
    }

    let pages = layout.pages.len();
    let bytes = doc
        .save_to_bytes()
        .map_err(|e| RenderError(e.to_string()))?;
    info!(bytes = bytes.len(), pages, ops = layout.op_count(), "PDF rendered");

    Ok(RenderedPdf {
        bytes,
        filename: export_filename(full_name),
    })
}
