//! XLSX serialization of report books
//!
//! Converts a populated [`ReportBook`] into an `.xlsx` workbook with
//! `rust_xlsxwriter`:
//! - Sheets keep their template order and names
//! - Formulas are written as live formulas, never as computed values
//! - Merged blocks become merged ranges carrying their label
//! - Counters use the `#,##0` number format
//!
//! ## Example Output Structure
//!
//! ```text
//! Sheet: ByMunicipality
//! |   | B   | C            | D              | E           | F    | G      | H             |
//! |---|-----|--------------|----------------|-------------|------|--------|---------------|
//! |14 | 1   | Metro City   | Metro Province | Philippines | 12   | 9      | =F14+G14      |
//! |15 | 2   | Not Stated   | Not Stated     | Philippines | 1    | 0      | =F15+G15      |
//! |16 | TOTAL (merged B:E)                                | =SUM | =SUM   | =SUM(H14:H15) |
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use civreg_core::RenderError;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::{debug, info};

use crate::book::{BorderWeight, CellStyle, CellValue, ReportBook, ReportSheet};
use crate::BookRenderer;

/// Excel workbook renderer
#[derive(Clone, Debug)]
pub struct XlsxRenderer {
    /// Number format applied to counter cells
    pub integer_format: String,
}

impl Default for XlsxRenderer {
    fn default() -> Self {
        Self {
            integer_format: "#,##0".into(),
        }
    }
}

impl XlsxRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number format used for counters
    pub fn integer_format(mut self, format: impl Into<String>) -> Self {
        self.integer_format = format.into();
        self
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, book: &ReportBook) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let mut formats = FormatCache::new(&self.integer_format);

        for sheet in book.sheets() {
            let worksheet = workbook.add_worksheet();
            self.write_sheet(worksheet, sheet, &mut formats)?;
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;
        Ok(buffer)
    }

    /// Serialize the book and write it to `path` in one step
    pub fn save(&self, book: &ReportBook, path: &Path) -> Result<(), RenderError> {
        let bytes = self.render_to_bytes(book)?;
        fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "saved workbook");
        Ok(())
    }

    fn write_sheet(
        &self,
        worksheet: &mut Worksheet,
        sheet: &ReportSheet,
        formats: &mut FormatCache,
    ) -> Result<(), RenderError> {
        worksheet
            .set_name(sheet.name())
            .map_err(|e| RenderError::Format(e.to_string()))?;

        for (&(row, col), cell) in sheet.cells() {
            // Merged blocks are written whole below
            if sheet.merge_at(row, col).is_some() {
                continue;
            }
            let format = formats.get(&cell.style);
            let written = match &cell.value {
                CellValue::Text(text) => worksheet
                    .write_string_with_format(row, col, text, format)
                    .map(|_| ()),
                CellValue::Number(n) => worksheet
                    .write_number_with_format(row, col, *n, format)
                    .map(|_| ()),
                CellValue::Formula(formula) => worksheet
                    .write_formula_with_format(row, col, formula.as_str(), format)
                    .map(|_| ()),
                CellValue::Blank => worksheet.write_blank(row, col, format).map(|_| ()),
            };
            written.map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for merge in sheet.merges() {
            let range = merge.range;
            worksheet
                .merge_range(
                    range.first_row,
                    range.first_col,
                    range.last_row,
                    range.last_col,
                    &merge.text,
                    formats.get(&merge.style),
                )
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        if sheet.autofit() {
            worksheet.autofit();
        }
        for (&col, &width) in sheet.column_widths() {
            worksheet
                .set_column_width(col, width)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        debug!(sheet = sheet.name(), merges = sheet.merges().len(), "serialized sheet");
        Ok(())
    }
}

impl BookRenderer for XlsxRenderer {
    type Output = Vec<u8>;

    fn render(&self, book: &ReportBook) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(book)
    }
}

/// One `Format` per distinct cell style
struct FormatCache {
    integer_format: String,
    formats: HashMap<CellStyle, Format>,
}

impl FormatCache {
    fn new(integer_format: &str) -> Self {
        Self {
            integer_format: integer_format.to_string(),
            formats: HashMap::new(),
        }
    }

    fn get(&mut self, style: &CellStyle) -> &Format {
        let integer_format = &self.integer_format;
        self.formats
            .entry(*style)
            .or_insert_with(|| create_format(style, integer_format))
    }
}

fn border(weight: Option<BorderWeight>) -> FormatBorder {
    match weight {
        Some(BorderWeight::Thin) => FormatBorder::Thin,
        Some(BorderWeight::Medium) => FormatBorder::Medium,
        None => FormatBorder::None,
    }
}

fn create_format(style: &CellStyle, integer_format: &str) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if style.center {
        format = format.set_align(FormatAlign::Center);
    }
    if style.integer {
        format = format.set_num_format(integer_format);
    }
    if !style.borders.is_empty() {
        format = format
            .set_border_top(border(style.borders.top))
            .set_border_bottom(border(style.borders.bottom))
            .set_border_left(border(style.borders.left))
            .set_border_right(border(style.borders.right));
    }
    format
}
