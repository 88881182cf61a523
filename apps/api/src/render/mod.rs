// PDF export: pure layout, then painting with printpdf.

pub mod font_metrics;
pub mod handlers;
pub mod layout;
pub mod pdf;
