//! Sensitivity label configuration
//!
//! A JSON object mapping a human label name (usually the stem of the template
//! document it was captured from) to its [`MipLabel`] record:
//!
//! ```json
//! {
//!     "Public": {
//!         "LabelId": "a1b2c3d4-...",
//!         "LabelName": "Public",
//!         "AssignmentMethod": "Privileged",
//!         ...
//!     }
//! }
//! ```

use crate::error::{MipError, MipResult};
use crate::types::MipLabel;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV_VAR: &str = "MIP_LABELS_CONFIG";

/// Resolve the configuration path: explicit value, then environment, then default
pub fn resolve_config_path(explicit: Option<&Path>, default: &str) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(default),
    }
}

/// Template documents directly inside `dir` with one of `extensions`
///
/// Returns `(label name, path)` pairs sorted by path, where the label name is
/// the file stem. Office lock files (`~$...`) are ignored.
pub fn scan_templates<P: AsRef<Path>>(
    dir: P,
    extensions: &[&str],
) -> MipResult<Vec<(String, PathBuf)>> {
    let mut templates = Vec::new();
    for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !extensions.iter().any(|wanted| wanted.trim_start_matches('.') == extension) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with("~$") {
            continue;
        }
        templates.push((stem.to_string(), path.to_path_buf()));
    }
    templates.sort_by(|a, b| a.1.cmp(&b.1));
    debug!(dir = %dir.as_ref().display(), found = templates.len(), "Scanned templates");
    Ok(templates)
}

/// Name → label record mapping backed by a JSON file
#[derive(Debug, Clone)]
pub struct LabelConfiguration {
    path: PathBuf,
    labels: BTreeMap<String, MipLabel>,
}

impl LabelConfiguration {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            labels: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load label definitions from the configuration file
    ///
    /// Entries are added to the ones already held; every record must carry a
    /// label id and a label name.
    pub fn load(mut self) -> MipResult<Self> {
        let content = fs::read_to_string(&self.path)?;
        let entries: BTreeMap<String, MipLabel> = serde_json::from_str(&content)?;
        for (name, label) in entries {
            label.validate().map_err(|e| {
                MipError::InvalidLabel(format!("{} in {}: {}", name, self.path.display(), e))
            })?;
            self.add_sensitivity_label(&name, label);
        }
        info!(
            path = %self.path.display(),
            labels = self.labels.len(),
            "Loaded sensitivity label configuration"
        );
        Ok(self)
    }

    /// Save label definitions to the configuration file (4-space indented JSON)
    pub fn save(&self) -> MipResult<()> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.labels.serialize(&mut serializer)?;
        buffer.push(b'\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, buffer)?;
        info!(
            path = %self.path.display(),
            labels = self.labels.len(),
            "Saved sensitivity label configuration"
        );
        Ok(())
    }

    pub fn add_sensitivity_label(&mut self, label_name: &str, label: MipLabel) {
        debug!(label_name, label_id = %label.label_id, "Adding sensitivity label");
        self.labels.insert(label_name.to_string(), label);
    }

    pub fn get_sensitivity_label(&self, label_name: &str) -> MipResult<&MipLabel> {
        self.labels
            .get(label_name)
            .ok_or_else(|| MipError::label_not_found(label_name, self.labels.keys()))
    }

    /// Names of all configured labels
    pub fn labels(&self) -> impl Iterator<Item = &String> {
        self.labels.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MipLabel)> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_config_path_prefers_explicit() {
        let explicit = PathBuf::from("custom/labels.json");
        assert_eq!(
            resolve_config_path(Some(&explicit), "default.json"),
            explicit
        );
    }

    #[test]
    fn test_scan_templates_filters_extensions() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["Public.xlsx", "Internal.DOCX", "notes.txt", "~$Public.xlsx"] {
            fs::write(temp_dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(temp_dir.path().join("nested.xlsx")).unwrap();

        let found = scan_templates(temp_dir.path(), &[".xlsx", ".docx"]).unwrap();
        let names: Vec<&str> = found.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["Internal", "Public"]);
    }

    #[test]
    fn test_scan_templates_missing_directory() {
        assert!(scan_templates("/nonexistent/templates", &["xlsx"]).is_err());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/model/labels.json");
        let mut config = LabelConfiguration::new(&path);
        config.add_sensitivity_label("Public", MipLabel::new("id-1", "Public"));
        config.save().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n    \"Public\": {"));
        assert!(content.contains("\"LabelId\": \"id-1\""));
    }

    #[test]
    fn test_load_rejects_label_without_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("labels.json");
        fs::write(&path, r#"{"Broken": {"LabelId": "x", "LabelName": ""}}"#).unwrap();
        let result = LabelConfiguration::new(&path).load();
        assert!(matches!(result, Err(MipError::InvalidLabel(_))));
    }

    #[test]
    fn test_get_unknown_label_lists_available() {
        let mut config = LabelConfiguration::new("unused.json");
        config.add_sensitivity_label("Public", MipLabel::new("id-1", "Public"));
        let err = config.get_sensitivity_label("Secret").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sensitivity label 'Secret' not found (available: Public)"
        );
    }
}
