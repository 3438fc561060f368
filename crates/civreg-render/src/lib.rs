//! # civreg-render
//!
//! Report population and workbook output for civreg exports.
//!
//! This crate provides:
//! - An in-memory report workbook (`ReportBook`) that tests can inspect cell by cell
//! - TOML report templates that seed a fresh workbook per export
//! - The fixed report layout: detail sheet, summary tables with totals, listings
//! - XLSX serialization through `rust_xlsxwriter`
//!
//! ## Example
//!
//! ```rust,ignore
//! use civreg_render::{open_template, populate_birth_report, BirthTables, XlsxRenderer};
//!
//! let mut book = open_template(Path::new("templates/birthtemplate.toml"))?;
//! populate_birth_report(&mut book, &records, &BirthTables {
//!     by_municipality: &summaries.by_municipality,
//!     teenage: &summaries.teenage,
//! })?;
//! XlsxRenderer::new().save(&book, Path::new("2023_Birth_Statistics.xlsx"))?;
//! ```

pub mod book;
pub mod excel;
pub mod layout;
pub mod template;

pub use book::{
    cell_ref, col_to_letter, parse_cell_ref, BorderWeight, Borders, Cell, CellRange, CellStyle,
    CellValue, Merge, ReportBook, ReportSheet,
};
pub use excel::XlsxRenderer;
pub use layout::{
    populate_birth_report, populate_death_report, write_detail_sheet, write_list, write_summary,
    BirthTables, DeathTables, ListRow, SummaryCounts, TableLayout, BY_MUNICIPALITY,
    CAUSE_OF_DEATH, DEAD_ON_ARRIVAL, DETAIL_SHEET, TEENAGE,
};
pub use template::{open_template, TemplateSpec};

use civreg_core::RenderError;

/// Turns a populated report book into an output artifact
pub trait BookRenderer {
    type Output;

    /// Render the book to the output format
    fn render(&self, book: &ReportBook) -> Result<Self::Output, RenderError>;
}
