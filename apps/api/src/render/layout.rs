//! CV layout as per-page lists of draw operations.
//!
//! Coordinates are PDF points with the origin at the top-left corner of an A4 page
//! and `y` growing downward; `Text::y` is the baseline. The painter flips the axis.
//! Content that reaches the bottom margin continues at the top of a new page.
//! Nothing here touches printpdf, so the layout is fully testable.

use crate::models::{CvData, EducationItem, ExperienceItem, ProjectItem};
use crate::render::font_metrics::{get_metrics, Face};

pub const PAGE_WIDTH_PT: f32 = 595.28;
pub const PAGE_HEIGHT_PT: f32 = 841.89;
pub const MARGIN_PT: f32 = 36.0;
const CONTENT_WIDTH_PT: f32 = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
const BOTTOM_PT: f32 = PAGE_HEIGHT_PT - MARGIN_PT;

const NAME_SIZE: f32 = 22.0;
const TITLE_SIZE: f32 = 12.0;
const CONTACT_SIZE: f32 = 9.0;
const SECTION_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 10.5;
const BODY_SIZE: f32 = 9.5;
const META_SIZE: f32 = 9.0;
const CHIP_SIZE: f32 = 8.5;
const LINE_FACTOR: f32 = 1.35;

const CHIP_PAD_X: f32 = 5.0;
const CHIP_HEIGHT: f32 = 15.0;
const CHIP_GAP: f32 = 5.0;

const BULLET: &str = "• ";
const FIELD_SEPARATOR: &str = " · ";
const DATE_SEPARATOR: &str = " — ";

/// Fill colour role; the painter maps these to RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    Ink,
    Muted,
    Accent,
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        face: Face,
        shade: Shade,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        thickness: f32,
        shade: Shade,
    },
    /// Outlined box with a label; `x`/`y` is the top-left corner.
    Chip {
        text: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        size: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CvLayout {
    /// Draw operations per page; never empty.
    pub pages: Vec<Vec<DrawOp>>,
    /// Section titles in the order they were laid out.
    pub sections: Vec<&'static str>,
}

impl Default for CvLayout {
    fn default() -> Self {
        Self {
            pages: vec![Vec::new()],
            sections: Vec::new(),
        }
    }
}

impl CvLayout {
    pub fn op_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    /// Every text run in draw order, across pages.
    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flatten().filter_map(|op| match op {
            DrawOp::Text { text, .. } | DrawOp::Chip { text, .. } => Some(text.as_str()),
            DrawOp::Rule { .. } => None,
        })
    }
}

/// Joins the non-empty, trimmed parts with `separator`.
fn join_present<S: AsRef<str>>(parts: &[S], separator: &str) -> String {
    parts
        .iter()
        .map(|part| part.as_ref().trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn date_range(start: &str, end: &str) -> String {
    join_present(&[start, end], DATE_SEPARATOR)
}

struct LayoutBuilder {
    layout: CvLayout,
    cursor: f32,
}

impl LayoutBuilder {
    fn new() -> Self {
        Self {
            layout: CvLayout::default(),
            cursor: MARGIN_PT,
        }
    }

    fn at_page_top(&self) -> bool {
        self.cursor <= MARGIN_PT
    }

    /// Reserves `height` below the cursor and returns its top edge, breaking to a
    /// new page when it would cross the bottom margin.
    fn reserve(&mut self, height: f32) -> f32 {
        if !self.at_page_top() && self.cursor + height > BOTTOM_PT {
            self.layout.pages.push(Vec::new());
            self.cursor = MARGIN_PT;
        }
        let top = self.cursor;
        self.cursor += height;
        top
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.layout.pages.last_mut() {
            page.push(op);
        }
    }

    /// Vertical spacing; dropped at the top of a page.
    fn gap(&mut self, height: f32) {
        if !self.at_page_top() {
            self.cursor = (self.cursor + height).min(BOTTOM_PT);
        }
    }

    fn line(&mut self, text: &str, x: f32, size: f32, face: Face, shade: Shade) {
        let top = self.reserve(size * LINE_FACTOR);
        self.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y: top + size,
            size,
            face,
            shade,
        });
    }

    fn paragraph(&mut self, text: &str, size: f32, face: Face, shade: Shade) {
        for line in get_metrics(face).wrap(text, size, CONTENT_WIDTH_PT) {
            self.line(&line, MARGIN_PT, size, face, shade);
        }
    }

    /// A bulleted line; continuation lines hang under the text, not the bullet.
    fn bullet(&mut self, text: &str) {
        let metrics = get_metrics(Face::Regular);
        let indent = metrics.width_pt(BULLET, BODY_SIZE);
        let lines = metrics.wrap(text, BODY_SIZE, CONTENT_WIDTH_PT - indent);
        for (index, line) in lines.iter().enumerate() {
            if index == 0 {
                self.line(&format!("{BULLET}{line}"), MARGIN_PT, BODY_SIZE, Face::Regular, Shade::Ink);
            } else {
                self.line(line, MARGIN_PT + indent, BODY_SIZE, Face::Regular, Shade::Ink);
            }
        }
    }

    fn bullets(&mut self, items: &[String]) {
        for item in items.iter().filter(|item| !item.trim().is_empty()) {
            self.bullet(item);
        }
    }

    fn rule(&mut self, thickness: f32, shade: Shade) {
        let top = self.reserve(thickness + 6.0);
        self.push(DrawOp::Rule {
            x1: MARGIN_PT,
            x2: PAGE_WIDTH_PT - MARGIN_PT,
            y: top + 3.0,
            thickness,
            shade,
        });
    }

    fn section(&mut self, title: &'static str) {
        self.gap(8.0);
        // Keep the heading with at least one line of its content.
        let heading = SECTION_SIZE * LINE_FACTOR + 6.5 + BODY_SIZE * LINE_FACTOR;
        if !self.at_page_top() && self.cursor + heading > BOTTOM_PT {
            self.layout.pages.push(Vec::new());
            self.cursor = MARGIN_PT;
        }
        self.line(&title.to_uppercase(), MARGIN_PT, SECTION_SIZE, Face::Bold, Shade::Accent);
        self.rule(0.5, Shade::Line);
        self.layout.sections.push(title);
    }

    fn chips(&mut self, labels: &[String]) {
        let metrics = get_metrics(Face::Regular);
        let right = PAGE_WIDTH_PT - MARGIN_PT;
        let mut x = MARGIN_PT;
        let mut row_top: Option<f32> = None;

        for label in labels.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
            let max_label = CONTENT_WIDTH_PT - 2.0 * CHIP_PAD_X;
            let label = metrics
                .wrap(label, CHIP_SIZE, max_label)
                .into_iter()
                .next()
                .unwrap_or_default();
            let width = metrics.width_pt(&label, CHIP_SIZE) + 2.0 * CHIP_PAD_X;

            if row_top.is_some() && x + width > right {
                row_top = None;
                x = MARGIN_PT;
            }
            let top = match row_top {
                Some(top) => top,
                None => {
                    let top = self.reserve(CHIP_HEIGHT + CHIP_GAP);
                    row_top = Some(top);
                    top
                }
            };

            self.push(DrawOp::Chip {
                text: label,
                x,
                y: top,
                width,
                height: CHIP_HEIGHT,
                size: CHIP_SIZE,
            });
            x += width + CHIP_GAP;
        }
    }

    fn header(&mut self, cv: &CvData) {
        let personal = &cv.personal;
        self.line(personal.full_name.trim(), MARGIN_PT, NAME_SIZE, Face::Bold, Shade::Ink);
        if !personal.title.trim().is_empty() {
            self.line(personal.title.trim(), MARGIN_PT, TITLE_SIZE, Face::Regular, Shade::Accent);
        }
        let contact = join_present(
            &[
                &personal.email,
                &personal.phone,
                &personal.location,
                &personal.website,
                &personal.linkedin,
            ],
            FIELD_SEPARATOR,
        );
        if !contact.is_empty() {
            self.paragraph(&contact, CONTACT_SIZE, Face::Regular, Shade::Muted);
        }
        self.gap(2.0);
        self.rule(1.0, Shade::Accent);
    }

    fn experience(&mut self, item: &ExperienceItem) {
        let heading = join_present(&[&item.role, &item.company], FIELD_SEPARATOR);
        self.paragraph(&heading, HEADING_SIZE, Face::Bold, Shade::Ink);
        let meta = join_present(
            &[&item.location, &date_range(&item.start_date, &item.end_date)],
            FIELD_SEPARATOR,
        );
        if !meta.is_empty() {
            self.paragraph(&meta, META_SIZE, Face::Regular, Shade::Muted);
        }
        self.bullets(&item.highlights);
        self.gap(4.0);
    }

    fn project(&mut self, item: &ProjectItem) {
        self.paragraph(item.name.trim(), HEADING_SIZE, Face::Bold, Shade::Ink);
        if !item.summary.trim().is_empty() {
            self.paragraph(item.summary.trim(), BODY_SIZE, Face::Regular, Shade::Ink);
        }
        self.bullets(&item.highlights);
        self.gap(4.0);
    }

    fn education(&mut self, item: &EducationItem) {
        self.paragraph(item.degree.trim(), HEADING_SIZE, Face::Bold, Shade::Ink);
        let school = join_present(&[&item.school, &item.location], FIELD_SEPARATOR);
        if !school.is_empty() {
            self.paragraph(&school, META_SIZE, Face::Regular, Shade::Muted);
        }
        let dates = date_range(&item.start_date, &item.end_date);
        if !dates.is_empty() {
            self.paragraph(&dates, META_SIZE, Face::Regular, Shade::Muted);
        }
        self.bullets(&item.highlights);
        self.gap(4.0);
    }
}

/// Lays out a CV on A4 pages, adding pages as the content requires.
///
/// Section order is fixed: Summary, Experience, Projects, Education, Skills,
/// Certifications, Languages. Empty sections are omitted.
pub fn layout_cv(cv: &CvData) -> CvLayout {
    let mut builder = LayoutBuilder::new();
    builder.header(cv);

    let summary = cv.personal.summary.trim();
    if !summary.is_empty() {
        builder.section("Summary");
        builder.paragraph(summary, BODY_SIZE, Face::Regular, Shade::Ink);
    }

    if !cv.experience.is_empty() {
        builder.section("Experience");
        for item in &cv.experience {
            builder.experience(item);
        }
    }

    if !cv.projects.is_empty() {
        builder.section("Projects");
        for item in &cv.projects {
            builder.project(item);
        }
    }

    if !cv.education.is_empty() {
        builder.section("Education");
        for item in &cv.education {
            builder.education(item);
        }
    }

    if !cv.skills.is_empty() {
        builder.section("Skills");
        builder.chips(&cv.skills);
    }

    if !cv.certifications.is_empty() {
        builder.section("Certifications");
        builder.bullets(&cv.certifications);
    }

    if !cv.languages.is_empty() {
        builder.section("Languages");
        builder.bullets(&cv.languages);
    }

    builder.layout
}
