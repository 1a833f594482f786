//! Workbook labels through custom document properties
//!
//! Labels a spreadsheet without the Office application: the label record is
//! written as string custom properties named `MSIP_Label_<LabelId>_<Field>`,
//! which is how Office itself mirrors the label for older readers.
//!
//! - Read: [`get_label_from_file`]
//! - Write: [`set_label_to_file`], [`set_label_to_workbook`]
//! - Create: [`new_labeled_workbook`]
//! - Bootstrap: [`create_sensitivity_label_definition`]

mod manager;

pub use manager::{label_info_from_properties, write_label_properties, MsipManager, MSIP_PREFIX};

use crate::config::{scan_templates, LabelConfiguration};
use crate::error::MipResult;
use crate::package::OfficePackage;
use crate::types::MipLabel;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_SENSITIVITY_LABELS_DEFINITION: &str =
    "sensitivity_model/sensitivity_labels_definition_custom_properties.json";
pub const DEFAULT_SENSITIVITY_TEMPLATES: &str = "sensitivity_model";

/// Build the label configuration from the `*.xlsx` templates in `extract_from`
///
/// Each template's file stem becomes the label name. Templates without a
/// label, or that cannot be read, are skipped. The configuration is saved to
/// `config_file` and returned.
pub fn create_sensitivity_label_definition<P: AsRef<Path>, Q: AsRef<Path>>(
    extract_from: P,
    config_file: Q,
) -> MipResult<LabelConfiguration> {
    let mut configuration = LabelConfiguration::new(config_file);

    for (label_name, path) in scan_templates(extract_from, &["xlsx"])? {
        match get_label_from_file(&path) {
            Ok(Some(label)) => configuration.add_sensitivity_label(&label_name, label),
            Ok(None) => warn!(template = %path.display(), "Template carries no sensitivity label"),
            Err(e) => warn!(template = %path.display(), error = %e, "Skipping unreadable template"),
        }
    }

    configuration.save()?;
    Ok(configuration)
}

/// Read the label stored in a workbook file
pub fn get_label_from_file<P: AsRef<Path>>(path: P) -> MipResult<Option<MipLabel>> {
    let mut package = OfficePackage::open(path)?;
    MsipManager::new(&mut package).get_label()
}

/// Apply `label` to an in-memory workbook package
pub fn set_label_to_workbook(package: &mut OfficePackage, label: &MipLabel) -> MipResult<MipLabel> {
    MsipManager::new(package).set_label(label, None)
}

/// Apply `label` to a workbook file, saving it in place
pub fn set_label_to_file<P: AsRef<Path>>(path: P, label: &MipLabel) -> MipResult<MipLabel> {
    let mut package = OfficePackage::open(path.as_ref())?;
    let stamped = set_label_to_workbook(&mut package, label)?;
    package.save(path.as_ref())?;
    info!(path = %path.as_ref().display(), label = %stamped.label_name, "Workbook labeled");
    Ok(stamped)
}

/// Create a blank workbook at `path` that already carries `label`
pub fn new_labeled_workbook<P: AsRef<Path>>(path: P, label: &MipLabel) -> MipResult<MipLabel> {
    label.validate()?;

    let mut workbook = Workbook::new();
    workbook.add_worksheet();
    let bytes = workbook.save_to_buffer()?;

    let mut package = OfficePackage::from_bytes(&bytes)?;
    let stamped = set_label_to_workbook(&mut package, label)?;
    package.save(path.as_ref())?;
    info!(path = %path.as_ref().display(), label = %stamped.label_name, "Labeled workbook created");
    Ok(stamped)
}
