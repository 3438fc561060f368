//! Report layout writer
//!
//! Places records and summary tables at the fixed positions the report
//! templates are drawn around:
//!
//! ```text
//! Data Source     header row 1, records from row 2, all detail columns
//! ByMunicipality  rows from 14, B No. | C Municipality | D Province | E Country | F Male | G Female | H =F+G
//! TeenAge         rows from 15, B No. | C Municipality | D Province | E Country | F Count
//! CauseOfDeath    rows from 7,  A No. | B Registry | C..E Name | F Date | G..K Causes
//! DeadonArrival   rows from 9,  B No. | C Registry | D..F Name | G Date
//! ```
//!
//! Summary tables close with a `TOTAL` row whose counters are live `SUM`
//! formulas. An empty table leaves its sheet untouched.

use civreg_core::{
    format_date, parse_event_date, BirthRecord, CauseOfDeathRow, DeadOnArrivalRow, DeathRecord,
    Enriched, EventRecord, FieldValue, RenderError, SexCounts, SummaryRow,
};
use tracing::{debug, warn};

use crate::book::{col_to_letter, CellRange, CellStyle, CellValue, ReportBook, ReportSheet};

/// Mandatory sheet receiving the record listing
pub const DETAIL_SHEET: &str = "Data Source";

/// Where a table starts on its sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableLayout {
    pub sheet: &'static str,
    /// 1-based spreadsheet row of the first data row
    pub first_row: u32,
    /// 0-based column of the sequence number
    pub first_col: u16,
}

impl TableLayout {
    fn row(&self, index: usize) -> u32 {
        self.first_row - 1 + index as u32
    }
}

pub const BY_MUNICIPALITY: TableLayout = TableLayout {
    sheet: "ByMunicipality",
    first_row: 14,
    first_col: 1,
};

pub const TEENAGE: TableLayout = TableLayout {
    sheet: "TeenAge",
    first_row: 15,
    first_col: 1,
};

pub const CAUSE_OF_DEATH: TableLayout = TableLayout {
    sheet: "CauseOfDeath",
    first_row: 7,
    first_col: 0,
};

pub const DEAD_ON_ARRIVAL: TableLayout = TableLayout {
    sheet: "DeadonArrival",
    first_row: 9,
    first_col: 1,
};

/// Counter block written after the location columns of a summary row
pub trait SummaryCounts {
    /// Number of counter columns after the location block
    const WIDTH: u16;

    fn write_counts(&self, sheet: &mut ReportSheet, row: u32, first_col: u16);
}

impl SummaryCounts for SexCounts {
    const WIDTH: u16 = 3;

    fn write_counts(&self, sheet: &mut ReportSheet, row: u32, first_col: u16) {
        let male = first_col;
        let female = first_col + 1;
        let excel_row = row + 1;
        sheet.write_number(row, male, self.male as f64, CellStyle::integer());
        sheet.write_number(row, female, self.female as f64, CellStyle::integer());
        sheet.write_formula(
            row,
            first_col + 2,
            format!(
                "={}{excel_row}+{}{excel_row}",
                col_to_letter(male),
                col_to_letter(female)
            ),
            CellStyle::integer(),
        );
    }
}

impl SummaryCounts for usize {
    const WIDTH: u16 = 1;

    fn write_counts(&self, sheet: &mut ReportSheet, row: u32, first_col: u16) {
        sheet.write_number(row, first_col, *self as f64, CellStyle::integer());
    }
}

/// Look up an optional sheet, logging when the template lacks it
fn optional_sheet<'b>(book: &'b mut ReportBook, name: &str) -> Option<&'b mut ReportSheet> {
    let sheet = book.sheet_mut(name);
    if sheet.is_none() {
        warn!(sheet = name, "sheet missing from template; skipped");
    }
    sheet
}

fn write_location_rows<C: SummaryCounts>(
    sheet: &mut ReportSheet,
    layout: &TableLayout,
    rows: &[SummaryRow<C>],
) -> Result<(), RenderError> {
    if rows.is_empty() {
        return Ok(());
    }
    let col = layout.first_col;
    let counts_col = col + 4;
    let last_col = counts_col + C::WIDTH - 1;

    for (index, row) in rows.iter().enumerate() {
        let r = layout.row(index);
        sheet.write_number(r, col, row.seq as f64, CellStyle::default());
        sheet.write_text(r, col + 1, row.location.municipality.as_str());
        sheet.write_text(r, col + 2, row.location.province.as_str());
        sheet.write_text(r, col + 3, row.location.country.as_str());
        row.counts.write_counts(sheet, r, counts_col);
    }

    let first_data = layout.first_row;
    let last_data = layout.first_row - 1 + rows.len() as u32;
    let total = layout.row(rows.len());
    sheet.merge(
        CellRange::new(total, col, total, col + 3),
        "TOTAL",
        CellStyle::bold().with_center(),
    )?;
    for sum_col in counts_col..=last_col {
        let letter = col_to_letter(sum_col);
        sheet.write_formula(
            total,
            sum_col,
            format!("=SUM({letter}{first_data}:{letter}{last_data})"),
            CellStyle::integer().with_bold(),
        );
    }
    sheet.outline(CellRange::new(layout.row(0), col, total, last_col));

    debug!(sheet = layout.sheet, rows = rows.len(), "wrote summary table");
    Ok(())
}

/// Write a location summary table with its total row
pub fn write_summary<C: SummaryCounts>(
    book: &mut ReportBook,
    layout: &TableLayout,
    rows: &[SummaryRow<C>],
) -> Result<(), RenderError> {
    if rows.is_empty() {
        debug!(sheet = layout.sheet, "empty table; sheet left untouched");
        return Ok(());
    }
    match optional_sheet(book, layout.sheet) {
        Some(sheet) => write_location_rows(sheet, layout, rows),
        None => Ok(()),
    }
}

/// A row of a flat listing
pub trait ListRow {
    fn seq(&self) -> usize;

    /// Text columns following the sequence number
    fn fields(&self) -> Vec<&str>;
}

impl ListRow for CauseOfDeathRow {
    fn seq(&self) -> usize {
        self.seq
    }

    fn fields(&self) -> Vec<&str> {
        vec![
            self.registry_num.as_str(),
            self.last_name.as_str(),
            self.first_name.as_str(),
            self.middle_name.as_str(),
            self.death_date.as_str(),
            self.immediate.as_str(),
            self.antecedent.as_str(),
            self.underlying.as_str(),
            self.underlying_interval.as_str(),
            self.other.as_str(),
        ]
    }
}

impl ListRow for DeadOnArrivalRow {
    fn seq(&self) -> usize {
        self.seq
    }

    fn fields(&self) -> Vec<&str> {
        vec![
            self.registry_num.as_str(),
            self.last_name.as_str(),
            self.first_name.as_str(),
            self.middle_name.as_str(),
            self.death_date.as_str(),
        ]
    }
}

/// Write a flat listing (no total row) starting at the layout's sequence column
pub fn write_list<T: ListRow>(book: &mut ReportBook, layout: &TableLayout, rows: &[T]) {
    if rows.is_empty() {
        debug!(sheet = layout.sheet, "empty listing; sheet left untouched");
        return;
    }
    let Some(sheet) = optional_sheet(book, layout.sheet) else {
        return;
    };
    for (index, row) in rows.iter().enumerate() {
        let r = layout.row(index);
        sheet.write_number(r, layout.first_col, row.seq() as f64, CellStyle::default());
        for (offset, text) in row.fields().into_iter().enumerate() {
            sheet.write_text(r, layout.first_col + 1 + offset as u16, text);
        }
    }
    debug!(sheet = layout.sheet, rows = rows.len(), "wrote listing");
}

fn detail_cell<R: EventRecord>(column: &str, value: FieldValue) -> CellValue {
    if R::DATE_COLUMNS.contains(&column) {
        if let Some(date) = parse_event_date(&value.text()) {
            return CellValue::Text(format_date(date));
        }
    }
    match value {
        FieldValue::Number(n) => CellValue::Number(n),
        FieldValue::Text(text) => CellValue::Text(text),
    }
}

/// Write the record listing to the detail sheet.
///
/// Headings go in row 1 and records follow in input order. Date columns are
/// normalized to `YYYY-MM-DD` when they parse. The sheet is required.
pub fn write_detail_sheet<R: EventRecord>(
    book: &mut ReportBook,
    records: &[Enriched<R>],
) -> Result<(), RenderError> {
    let sheet = book
        .sheet_mut(DETAIL_SHEET)
        .ok_or_else(|| RenderError::MissingSheet(DETAIL_SHEET.to_string()))?;
    let columns = Enriched::<R>::detail_columns();

    for (col, heading) in columns.iter().enumerate() {
        sheet.write(
            0,
            col as u16,
            CellValue::Text((*heading).to_string()),
            CellStyle::bold(),
        );
    }
    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        for (col, column) in columns.iter().enumerate() {
            if let Some(value) = record.detail_value(column) {
                sheet.write(row, col as u16, detail_cell::<R>(column, value), CellStyle::default());
            }
        }
    }
    sheet.set_autofit(true);

    debug!(records = records.len(), columns = columns.len(), "wrote detail sheet");
    Ok(())
}

/// Summary tables of a birth report, as produced by the aggregation step
pub struct BirthTables<'a> {
    pub by_municipality: &'a [SummaryRow<SexCounts>],
    pub teenage: &'a [SummaryRow<usize>],
}

/// Summary tables of a death report
pub struct DeathTables<'a> {
    pub by_municipality: &'a [SummaryRow<SexCounts>],
    pub causes: Option<&'a [CauseOfDeathRow]>,
    pub dead_on_arrival: &'a [DeadOnArrivalRow],
}

/// Populate every sheet of a birth report
pub fn populate_birth_report(
    book: &mut ReportBook,
    records: &[Enriched<BirthRecord>],
    tables: &BirthTables<'_>,
) -> Result<(), RenderError> {
    write_detail_sheet(book, records)?;
    write_summary(book, &BY_MUNICIPALITY, tables.by_municipality)?;
    write_summary(book, &TEENAGE, tables.teenage)?;
    Ok(())
}

/// Populate every sheet of a death report
pub fn populate_death_report(
    book: &mut ReportBook,
    records: &[Enriched<DeathRecord>],
    tables: &DeathTables<'_>,
) -> Result<(), RenderError> {
    write_detail_sheet(book, records)?;
    write_summary(book, &BY_MUNICIPALITY, tables.by_municipality)?;
    if let Some(causes) = tables.causes {
        write_list(book, &CAUSE_OF_DEATH, causes);
    }
    write_list(book, &DEAD_ON_ARRIVAL, tables.dead_on_arrival);
    Ok(())
}
