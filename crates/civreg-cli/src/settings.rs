//! Deployment settings
//!
//! Where the municipality reference and the report templates live. Every
//! key is optional; a settings file only needs the keys it overrides.
//!
//! ```toml
//! reference_candidates = ["D:/Registry/RMunicipality.ref"]
//! birth_template = "templates/birthtemplate.toml"
//! death_template = "templates/deathtemplate.toml"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use civreg_core::{ExportError, ReportKind};
use serde::Deserialize;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Reference files tried in order; the first that exists is used
    pub reference_candidates: Vec<PathBuf>,
    pub birth_template: PathBuf,
    pub death_template: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reference_candidates: vec![
                PathBuf::from("C:/PhilCRIS/Resources/References/RMunicipality.ref"),
                PathBuf::from("Resources/References/RMunicipality.ref"),
                PathBuf::from("references/RMunicipality.ref"),
            ],
            birth_template: PathBuf::from("templates/birthtemplate.toml"),
            death_template: PathBuf::from("templates/deathtemplate.toml"),
        }
    }
}

impl Settings {
    /// Load a settings file, or the defaults when none is given
    pub fn load(path: Option<&Path>) -> Result<Self, ExportError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let source = fs::read_to_string(path).map_err(|e| {
            ExportError::Resource(format!("Cannot read settings {}: {e}", path.display()))
        })?;
        let settings: Self = toml::from_str(&source).map_err(|e| {
            ExportError::Resource(format!("Invalid settings {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn template_for(&self, kind: ReportKind) -> &Path {
        match kind {
            ReportKind::Birth => &self.birth_template,
            ReportKind::Death => &self.death_template,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.reference_candidates.len(), 3);
        assert_eq!(
            settings.template_for(ReportKind::Death),
            Path::new("templates/deathtemplate.toml")
        );
    }

    #[test]
    fn partial_file_overrides_only_its_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("civreg.toml");
        fs::write(&path, "reference_candidates = [\"refs/RMunicipality.ref\"]\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.reference_candidates, vec![PathBuf::from("refs/RMunicipality.ref")]);
        assert_eq!(settings.birth_template, Settings::default().birth_template);
    }

    #[test]
    fn malformed_file_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("civreg.toml");
        fs::write(&path, "birth_templat = 3\n").unwrap();

        assert!(matches!(Settings::load(Some(&path)), Err(ExportError::Resource(_))));
        assert!(matches!(
            Settings::load(Some(&dir.path().join("missing.toml"))),
            Err(ExportError::Resource(_))
        ));
    }
}
