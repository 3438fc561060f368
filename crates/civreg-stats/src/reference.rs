//! Municipality reference dictionary
//!
//! The reference file (`RMunicipality.ref`) lists one location per line:
//!
//! ```text
//! Metro City|Metro Province|Philippines|00123
//! Riverside|Metro Province|Philippines|00124
//! ```
//!
//! Field 3 is the location code used inside registry location values
//! (`"Metro City|00123"`). The dictionary is read from the first candidate
//! that exists; later candidates are never merged in.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use civreg_core::{Location, LocationCode};
use tracing::{debug, info, warn};

/// Country used for every location the dictionary cannot name
pub const DEFAULT_COUNTRY: &str = "Philippines";

/// One place the reference dictionary may be loaded from
pub trait ReferenceSource {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// Raw contents, or `Ok(None)` when this candidate does not exist
    fn read(&self) -> io::Result<Option<Vec<u8>>>;
}

/// A reference file on disk
#[derive(Clone, Debug)]
pub struct FileReference {
    pub path: PathBuf,
}

impl FileReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReferenceSource for FileReference {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        fs::read(&self.path).map(Some)
    }
}

/// Reference contents held in memory
#[derive(Clone, Debug)]
pub struct InlineReference {
    pub label: String,
    pub contents: String,
}

impl ReferenceSource for InlineReference {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(Some(self.contents.clone().into_bytes()))
    }
}

/// Code → location dictionary, immutable once loaded
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocationReference {
    entries: HashMap<String, Location>,
}

impl LocationReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the first candidate that exists.
    ///
    /// No candidate, an empty file, or an unreadable file all give an empty
    /// dictionary; every code then resolves to its "Unknown" form.
    pub fn load(candidates: &[&dyn ReferenceSource]) -> Self {
        for candidate in candidates {
            match candidate.read() {
                Ok(None) => {
                    debug!(candidate = %candidate.describe(), "reference candidate not found");
                }
                Ok(Some(bytes)) => {
                    let reference = Self::parse(&String::from_utf8_lossy(&bytes));
                    info!(
                        candidate = %candidate.describe(),
                        entries = reference.len(),
                        "loaded municipality reference"
                    );
                    return reference;
                }
                Err(err) => {
                    warn!(
                        candidate = %candidate.describe(),
                        error = %err,
                        "municipality reference unreadable; names will show as Unknown"
                    );
                    return Self::new();
                }
            }
        }
        warn!("no municipality reference found; names will show as Unknown");
        Self::new()
    }

    /// Load from file paths, tried in order
    pub fn load_paths<P: AsRef<Path>>(paths: &[P]) -> Self {
        let files: Vec<FileReference> = paths
            .iter()
            .map(|p| FileReference::new(p.as_ref()))
            .collect();
        let candidates: Vec<&dyn ReferenceSource> =
            files.iter().map(|f| f as &dyn ReferenceSource).collect();
        Self::load(&candidates)
    }

    /// Parse reference text. The first occurrence of a code wins.
    pub fn parse(contents: &str) -> Self {
        let mut entries = HashMap::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() < 4 {
                continue;
            }
            let code = parts[3].trim();
            if code.is_empty() {
                continue;
            }
            entries.entry(code.to_string()).or_insert_with(|| {
                Location::new(parts[0].trim(), parts[1].trim(), parts[2].trim())
            });
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&Location> {
        self.entries.get(code)
    }

    /// Display names for a bucket code
    pub fn resolve(&self, code: &LocationCode) -> Location {
        match code {
            LocationCode::Unknown => Location::new("Not Stated", "Not Stated", DEFAULT_COUNTRY),
            LocationCode::Known(code) => match self.entries.get(code) {
                Some(location) => location.clone(),
                None => Location::new(format!("Unknown ({code})"), "Unknown", DEFAULT_COUNTRY),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Metro City|Metro Province|Philippines|00123
Riverside | Metro Province | Philippines | 00124

broken|line
Duplicate City|Elsewhere|Philippines|00123
No Code|Province|Philippines|
";

    #[test]
    fn parses_valid_lines_and_trims_fields() {
        let reference = LocationReference::parse(SAMPLE);
        assert_eq!(reference.len(), 2);
        assert_eq!(
            reference.get("00124"),
            Some(&Location::new("Riverside", "Metro Province", "Philippines"))
        );
    }

    #[test]
    fn first_duplicate_wins() {
        let reference = LocationReference::parse(SAMPLE);
        assert_eq!(reference.get("00123").map(|l| l.municipality.as_str()), Some("Metro City"));
    }

    #[test]
    fn resolves_unknown_and_missing_codes() {
        let reference = LocationReference::parse(SAMPLE);
        assert_eq!(
            reference.resolve(&LocationCode::Unknown),
            Location::new("Not Stated", "Not Stated", "Philippines")
        );
        assert_eq!(
            reference.resolve(&LocationCode::Known("99999".into())),
            Location::new("Unknown (99999)", "Unknown", "Philippines")
        );
        assert_eq!(
            reference.resolve(&LocationCode::Known("00123".into())).province,
            "Metro Province"
        );
    }

    #[test]
    fn first_existing_candidate_is_used_without_merging() {
        let first = InlineReference {
            label: "first".into(),
            contents: "A|P|Philippines|1\n".into(),
        };
        let second = InlineReference {
            label: "second".into(),
            contents: "B|P|Philippines|2\n".into(),
        };
        let missing = FileReference::new("/nonexistent/RMunicipality.ref");

        let candidates: [&dyn ReferenceSource; 3] = [&missing, &first, &second];
        let reference = LocationReference::load(&candidates);
        assert_eq!(reference.len(), 1);
        assert!(reference.get("1").is_some());
        assert!(reference.get("2").is_none());
    }

    #[test]
    fn no_candidates_gives_empty_reference() {
        let reference = LocationReference::load(&[]);
        assert!(reference.is_empty());
    }
}
