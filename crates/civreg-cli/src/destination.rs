//! Where a finished workbook is written

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use civreg_core::{ExportError, ReportKind};

/// Resolve the requested save path to a concrete `.xlsx` file.
///
/// An existing directory gets a generated, timestamped file name. Anything
/// else is treated as a file path: the `.xlsx` extension is enforced and
/// missing parent directories are created.
pub fn resolve_destination(
    save_path: &Path,
    kind: ReportKind,
    year: i32,
    now: NaiveDateTime,
) -> Result<PathBuf, ExportError> {
    if save_path.is_dir() {
        return Ok(save_path.join(generated_name(kind, year, now)));
    }

    let has_extension = save_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    let file = if has_extension {
        save_path.to_path_buf()
    } else {
        let mut name = save_path.as_os_str().to_os_string();
        name.push(".xlsx");
        PathBuf::from(name)
    };

    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ExportError::Resource(format!(
                "Cannot create destination folder {}: {e}",
                parent.display()
            ))
        })?;
    }
    Ok(file)
}

fn generated_name(kind: ReportKind, year: i32, now: NaiveDateTime) -> String {
    let label = match kind {
        ReportKind::Birth => "Birth",
        ReportKind::Death => "Death",
    };
    format!(
        "{year}_{label}_Statistics_Reports_{}.xlsx",
        now.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .and_then(|d| d.and_hms_opt(9, 3, 7))
            .unwrap()
    }

    #[test]
    fn directory_gets_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_destination(dir.path(), ReportKind::Death, 2023, now()).unwrap();
        assert_eq!(
            path,
            dir.path().join("2023_Death_Statistics_Reports_20240105_090307.xlsx")
        );
    }

    #[test]
    fn file_path_gains_extension_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let requested = dir.path().join("out/2023/births");
        let path = resolve_destination(&requested, ReportKind::Birth, 2023, now()).unwrap();

        assert_eq!(path, dir.path().join("out/2023/births.xlsx"));
        assert!(dir.path().join("out/2023").is_dir());
    }

    #[test]
    fn existing_extension_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let requested = dir.path().join("Report.XLSX");
        let path = resolve_destination(&requested, ReportKind::Birth, 2023, now()).unwrap();
        assert_eq!(path, requested);
    }

    #[test]
    fn unusable_parent_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a folder").unwrap();

        let result =
            resolve_destination(&blocker.join("report"), ReportKind::Birth, 2023, now());
        assert!(matches!(result, Err(ExportError::Resource(_))));
    }
}
