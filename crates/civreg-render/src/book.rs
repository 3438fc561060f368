//! In-memory report workbook
//!
//! A [`ReportBook`] is the mutable copy of a report template. The layout
//! writer fills it, tests inspect it, and [`crate::XlsxRenderer`] serializes
//! it once at the end. Rows and columns are 0-based internally; A1
//! references are accepted and produced at the edges.

use std::collections::BTreeMap;
use std::fmt;

use civreg_core::RenderError;

/// Value held by a cell
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Formula text including the leading `=`
    Formula(String),
    /// Styled but empty
    Blank,
}

/// Border weight of one cell edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BorderWeight {
    Thin,
    Medium,
}

/// Edges of a cell border
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Borders {
    pub top: Option<BorderWeight>,
    pub bottom: Option<BorderWeight>,
    pub left: Option<BorderWeight>,
    pub right: Option<BorderWeight>,
}

impl Borders {
    pub fn all(weight: BorderWeight) -> Self {
        Self {
            top: Some(weight),
            bottom: Some(weight),
            left: Some(weight),
            right: Some(weight),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.bottom.is_none() && self.left.is_none() && self.right.is_none()
    }
}

/// Presentation of a cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellStyle {
    pub bold: bool,
    pub center: bool,
    /// `#,##0` number format
    pub integer: bool,
    pub borders: Borders,
}

impl CellStyle {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn integer() -> Self {
        Self {
            integer: true,
            ..Self::default()
        }
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_center(mut self) -> Self {
        self.center = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

/// Rectangular block of cells, inclusive on both ends
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    pub fn new(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    /// Parse `B14:H20` or a single-cell `B14`
    pub fn parse(reference: &str) -> Result<Self, RenderError> {
        match reference.split_once(':') {
            Some((first, last)) => {
                let (r1, c1) = parse_cell_ref(first)?;
                let (r2, c2) = parse_cell_ref(last)?;
                Ok(Self::new(r1, c1, r2, c2))
            }
            None => {
                let (row, col) = parse_cell_ref(reference)?;
                Ok(Self::new(row, col, row, col))
            }
        }
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            cell_ref(self.first_row, self.first_col),
            cell_ref(self.last_row, self.last_col)
        )
    }
}

/// A merged block with its display text
#[derive(Clone, Debug, PartialEq)]
pub struct Merge {
    pub range: CellRange,
    pub text: String,
    pub style: CellStyle,
}

/// Convert 0-based column index to Excel column letter (A, B, ..., Z, AA, AB, ...)
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = col as u32;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert Excel column letters to a 0-based index
pub fn letter_to_col(letters: &str) -> Result<u16, RenderError> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RenderError::InvalidData(format!("invalid column '{letters}'")));
    }
    let mut n: u32 = 0;
    for c in letters.chars() {
        n = n * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if n > u32::from(u16::MAX) {
            return Err(RenderError::InvalidData(format!("column '{letters}' out of range")));
        }
    }
    Ok((n - 1) as u16)
}

/// 1-based A1 reference for a 0-based position
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// Parse an A1 reference into a 0-based (row, col)
pub fn parse_cell_ref(reference: &str) -> Result<(u32, u16), RenderError> {
    let reference = reference.trim();
    let split = reference
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| RenderError::InvalidData(format!("invalid cell reference '{reference}'")))?;
    let (letters, digits) = reference.split_at(split);
    let col = letter_to_col(letters)?;
    let row: u32 = digits
        .parse()
        .map_err(|_| RenderError::InvalidData(format!("invalid cell reference '{reference}'")))?;
    if row == 0 {
        return Err(RenderError::InvalidData(format!("invalid cell reference '{reference}'")));
    }
    Ok((row - 1, col))
}

/// One worksheet of a report book
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportSheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    merges: Vec<Merge>,
    column_widths: BTreeMap<u16, f64>,
    autofit: bool,
}

impl ReportSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write(&mut self, row: u32, col: u16, value: CellValue, style: CellStyle) {
        self.cells.insert((row, col), Cell { value, style });
    }

    pub fn write_text(&mut self, row: u32, col: u16, text: impl Into<String>) {
        self.write(row, col, CellValue::Text(text.into()), CellStyle::default());
    }

    pub fn write_number(&mut self, row: u32, col: u16, value: f64, style: CellStyle) {
        self.write(row, col, CellValue::Number(value), style);
    }

    pub fn write_formula(
        &mut self,
        row: u32,
        col: u16,
        formula: impl Into<String>,
        style: CellStyle,
    ) {
        self.write(row, col, CellValue::Formula(formula.into()), style);
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Cell at an A1 reference; `None` for malformed references too
    pub fn cell_at(&self, reference: &str) -> Option<&Cell> {
        let (row, col) = parse_cell_ref(reference).ok()?;
        self.cell(row, col)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&(u32, u16), &Cell)> {
        self.cells.iter()
    }

    /// Highest occupied row, counting merges
    pub fn last_row(&self) -> Option<u32> {
        let cells = self.cells.keys().map(|(row, _)| *row);
        let merges = self.merges.iter().map(|m| m.range.last_row);
        cells.chain(merges).max()
    }

    /// Merge a block and label it. Overlapping merges are rejected.
    pub fn merge(
        &mut self,
        range: CellRange,
        text: impl Into<String>,
        style: CellStyle,
    ) -> Result<(), RenderError> {
        if let Some(existing) = self.merges.iter().find(|m| m.range.overlaps(&range)) {
            return Err(RenderError::InvalidData(format!(
                "merge {} overlaps {} on sheet '{}'",
                range, existing.range, self.name
            )));
        }
        self.merges.push(Merge {
            range,
            text: text.into(),
            style,
        });
        Ok(())
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn merge_at(&self, row: u32, col: u16) -> Option<&Merge> {
        self.merges.iter().find(|m| m.range.contains(row, col))
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    pub fn set_autofit(&mut self, autofit: bool) {
        self.autofit = autofit;
    }

    pub fn autofit(&self) -> bool {
        self.autofit
    }

    /// Thin borders on every cell of `range`, medium around its outline.
    ///
    /// Empty positions become styled blanks; merges inside the range take the
    /// outline edges they touch.
    pub fn outline(&mut self, range: CellRange) {
        for row in range.first_row..=range.last_row {
            for col in range.first_col..=range.last_col {
                let borders = edge_borders(&range, row, col);
                let cell = self.cells.entry((row, col)).or_insert_with(|| Cell {
                    value: CellValue::Blank,
                    style: CellStyle::default(),
                });
                cell.style.borders = borders;
            }
        }
        for merge in self.merges.iter_mut().filter(|m| m.range.overlaps(&range)) {
            let mut borders = Borders::all(BorderWeight::Thin);
            if merge.range.first_row == range.first_row {
                borders.top = Some(BorderWeight::Medium);
            }
            if merge.range.last_row == range.last_row {
                borders.bottom = Some(BorderWeight::Medium);
            }
            if merge.range.first_col == range.first_col {
                borders.left = Some(BorderWeight::Medium);
            }
            if merge.range.last_col == range.last_col {
                borders.right = Some(BorderWeight::Medium);
            }
            merge.style.borders = borders;
        }
    }
}

fn edge_borders(range: &CellRange, row: u32, col: u16) -> Borders {
    let weight = |on_edge: bool| {
        Some(if on_edge {
            BorderWeight::Medium
        } else {
            BorderWeight::Thin
        })
    };
    Borders {
        top: weight(row == range.first_row),
        bottom: weight(row == range.last_row),
        left: weight(col == range.first_col),
        right: weight(col == range.last_col),
    }
}

/// Ordered collection of sheets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportBook {
    sheets: Vec<ReportSheet>,
}

impl ReportBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet; names must be unique
    pub fn add_sheet(&mut self, sheet: ReportSheet) -> Result<(), RenderError> {
        if self.sheet(sheet.name()).is_some() {
            return Err(RenderError::Template(format!(
                "duplicate sheet name '{}'",
                sheet.name()
            )));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    pub fn sheet(&self, name: &str) -> Option<&ReportSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut ReportSheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> &[ReportSheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }
}
