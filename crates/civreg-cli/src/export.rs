//! The export pipeline
//!
//! validate → open template → resolve destination → fetch → enrich →
//! aggregate → populate → save. Every step before `fetch` runs without
//! touching record data, so configuration mistakes surface first.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use civreg_core::{
    enrich_all, BirthRecord, DeathRecord, ExportError, ExportRequest, RecordSource, ReportKind,
};
use civreg_render::{
    open_template, populate_birth_report, populate_death_report, BirthTables, DeathTables,
    XlsxRenderer,
};
use civreg_stats::{summarize_births, summarize_deaths, LocationReference};
use tracing::{debug, info};

use crate::destination::resolve_destination;
use crate::settings::Settings;

/// Run one export and return the path of the saved workbook
pub fn run_export<S>(
    request: &ExportRequest,
    settings: &Settings,
    source: &S,
    now: NaiveDateTime,
) -> Result<PathBuf, ExportError>
where
    S: RecordSource<BirthRecord> + RecordSource<DeathRecord>,
{
    request.validate()?;

    let template = settings.template_for(request.kind);
    let mut book = open_template(template).map_err(|e| {
        ExportError::Resource(format!("Cannot open template {}: {e}", template.display()))
    })?;

    let save_path = request.save_path.as_deref().ok_or_else(|| {
        ExportError::Configuration("Please enter a save path for the exported file.".into())
    })?;
    let destination = resolve_destination(save_path, request.kind, request.year, now)?;
    debug!(kind = %request.kind, destination = %destination.display(), "resolved destination");

    let query = request.query();
    match request.kind {
        ReportKind::Birth => {
            let records = RecordSource::<BirthRecord>::fetch(source, &query)?;
            if records.is_empty() {
                return Err(ExportError::EmptyResult);
            }
            let records = enrich_all(records);
            let reference = load_reference(settings);
            let summaries = summarize_births(&records, &reference, request.teenage_age);
            populate_birth_report(
                &mut book,
                &records,
                &BirthTables {
                    by_municipality: &summaries.by_municipality,
                    teenage: &summaries.teenage,
                },
            )?;
        }
        ReportKind::Death => {
            let records = RecordSource::<DeathRecord>::fetch(source, &query)?;
            if records.is_empty() {
                return Err(ExportError::EmptyResult);
            }
            let records = enrich_all(records);
            let reference = load_reference(settings);
            let summaries = summarize_deaths(&records, &reference, request.include_cause());
            populate_death_report(
                &mut book,
                &records,
                &DeathTables {
                    by_municipality: &summaries.by_municipality,
                    causes: summaries.causes.as_deref(),
                    dead_on_arrival: &summaries.dead_on_arrival,
                },
            )?;
        }
    }

    XlsxRenderer::new().save(&book, &destination)?;
    info!(
        kind = %request.kind,
        year = request.year,
        path = %destination.display(),
        "export complete"
    );
    Ok(destination)
}

fn load_reference(settings: &Settings) -> LocationReference {
    LocationReference::load_paths(&settings.reference_candidates)
}
