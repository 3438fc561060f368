//! Report templates
//!
//! A template describes the skeleton of a report workbook in TOML: the
//! sheets in order, their static cells (titles, column headings), merged
//! title blocks and column widths. Loading a template produces a fresh
//! [`ReportBook`] for one export.
//!
//! ```toml
//! [[sheets]]
//! name = "ByMunicipality"
//! column_widths = { B = 6, C = 28 }
//!
//! [[sheets.cells]]
//! at = "B13"
//! text = "No."
//! bold = true
//!
//! [[sheets.merges]]
//! range = "B10:H10"
//! text = "LIVE BIRTHS BY MUNICIPALITY"
//! bold = true
//! center = true
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use civreg_core::RenderError;
use serde::Deserialize;
use tracing::debug;

use crate::book::{
    letter_to_col, parse_cell_ref, CellRange, CellStyle, CellValue, ReportBook, ReportSheet,
};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSpec {
    #[serde(default)]
    pub sheets: Vec<SheetSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetSpec {
    pub name: String,
    #[serde(default)]
    pub column_widths: BTreeMap<String, f64>,
    #[serde(default)]
    pub cells: Vec<CellSpec>,
    #[serde(default)]
    pub merges: Vec<MergeSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellSpec {
    pub at: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub number: Option<f64>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub center: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeSpec {
    pub range: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub center: bool,
}

fn style(bold: bool, center: bool) -> CellStyle {
    CellStyle {
        bold,
        center,
        ..CellStyle::default()
    }
}

impl TemplateSpec {
    pub fn parse(source: &str) -> Result<Self, RenderError> {
        toml::from_str(source).map_err(|e| RenderError::Template(e.to_string()))
    }

    /// Read and parse a template file
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let source = fs::read_to_string(path).map_err(|e| {
            RenderError::Template(format!("cannot read template {}: {e}", path.display()))
        })?;
        Self::parse(&source).map_err(|e| match e {
            RenderError::Template(msg) => {
                RenderError::Template(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Build a fresh workbook from the template
    pub fn instantiate(&self) -> Result<ReportBook, RenderError> {
        let mut book = ReportBook::new();
        for spec in &self.sheets {
            book.add_sheet(spec.build()?)?;
        }
        debug!(sheets = book.sheets().len(), "instantiated report template");
        Ok(book)
    }
}

impl SheetSpec {
    fn build(&self) -> Result<ReportSheet, RenderError> {
        let in_sheet =
            |e: RenderError| RenderError::Template(format!("sheet '{}': {e}", self.name));
        let mut sheet = ReportSheet::new(&self.name);

        for (letters, width) in &self.column_widths {
            sheet.set_column_width(letter_to_col(letters).map_err(in_sheet)?, *width);
        }

        for cell in &self.cells {
            let (row, col) = parse_cell_ref(&cell.at).map_err(in_sheet)?;
            let value = match (&cell.text, cell.number) {
                (Some(text), None) => CellValue::Text(text.clone()),
                (None, Some(number)) => CellValue::Number(number),
                (None, None) => CellValue::Blank,
                (Some(_), Some(_)) => {
                    return Err(in_sheet(RenderError::InvalidData(format!(
                        "cell {} has both text and number",
                        cell.at
                    ))))
                }
            };
            sheet.write(row, col, value, style(cell.bold, cell.center));
        }

        for merge in &self.merges {
            let range = CellRange::parse(&merge.range).map_err(in_sheet)?;
            sheet
                .merge(range, merge.text.clone(), style(merge.bold, merge.center))
                .map_err(in_sheet)?;
        }

        Ok(sheet)
    }
}

/// Load a template file and build its workbook in one step
pub fn open_template(path: &Path) -> Result<ReportBook, RenderError> {
    TemplateSpec::load(path)?.instantiate()
}
