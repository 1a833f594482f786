//! Stamp configured labels onto documents and bootstrap the configuration

use super::document::DocumentManager;
use super::factory::document_manager_factory;
use super::sensitivity::SensitivityLabelManager;
use crate::config::{scan_templates, LabelConfiguration};
use crate::error::MipResult;
use crate::types::{AssignmentMethod, MipLabel};
use chrono::{SubsecRound, Utc};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_SENSITIVITY_LABELS_DEFINITION: &str =
    "sensitivity_model/sensitivity_labels_definition.json";
pub const DEFAULT_SENSITIVITY_TEMPLATES: &str = "sensitivity_model";

/// Justification recorded for labels applied from the configuration
pub fn default_justification(label_key: &str) -> String {
    format!("Automated assignment based on configuration.({})", label_key)
}

/// Assign `label` to the manager's document
///
/// Does nothing when the document cannot be opened. Returns whether a label
/// was written.
pub fn apply_label(
    document_manager: &mut dyn DocumentManager,
    label_key: &str,
    label: &MipLabel,
    justification: Option<&str>,
) -> MipResult<bool> {
    let Some(document) = document_manager.document() else {
        return Ok(false);
    };

    let mut sensitivity_label_manager = SensitivityLabelManager::new(document);
    let mut new_label_info = sensitivity_label_manager.create_label_info();
    new_label_info.assignment_method = Some(AssignmentMethod::Auto);
    new_label_info.justification = Some(
        justification
            .map(str::to_string)
            .unwrap_or_else(|| default_justification(label_key)),
    );
    new_label_info.label_id = Some(label.label_id.clone());
    new_label_info.label_name = Some(label.label_name.clone());
    new_label_info.site_id = label.site_id.clone();
    new_label_info.content_bits = label.content_bits;
    new_label_info.is_enabled = Some(label.is_enabled.unwrap_or(true));
    new_label_info.set_date = Some(Utc::now().trunc_subsecs(0));
    new_label_info.action_id = Some(Uuid::new_v4().to_string());

    sensitivity_label_manager.set_label(&new_label_info)?;
    info!(label = label_key, label_id = %label.label_id, "Sensitivity label assigned");
    Ok(true)
}

/// Set the configured label `sensitivity_label` on the manager's document
pub fn set_sensitivity_label_to_document<P: AsRef<Path>>(
    document_manager: &mut dyn DocumentManager,
    sensitivity_label: &str,
    sensitivity_configuration_file: P,
) -> MipResult<()> {
    let configuration = LabelConfiguration::new(sensitivity_configuration_file).load()?;
    let label = configuration.get_sensitivity_label(sensitivity_label)?;
    apply_label(document_manager, sensitivity_label, label, None)?;
    Ok(())
}

/// Set the configured label on a document file, saving and closing it
pub fn set_sensitivity_label_to_file<P: AsRef<Path>, Q: AsRef<Path>>(
    absolute_path_to_filename: P,
    sensitivity_label: &str,
    sensitivity_configuration_file: Q,
) -> MipResult<()> {
    let mut document_manager = document_manager_factory(absolute_path_to_filename)?;
    set_sensitivity_label_to_document(
        document_manager.as_mut(),
        sensitivity_label,
        sensitivity_configuration_file,
    )?;
    document_manager.close_document(true)?;
    document_manager.quit()
}

/// Build the label configuration from the `.xlsx` / `.docx` templates in `extract_from`
///
/// Each template is named after the label it carries (`Public.docx`,
/// `InternalUseOnly.xlsx`). Templates that cannot be opened or carry no label
/// are skipped. A template whose label has no stored name is recorded under
/// its file stem.
pub fn create_sensitivity_label_definition<P: AsRef<Path>, Q: AsRef<Path>>(
    extract_from: P,
    sensitivity_configuration_file: Q,
) -> MipResult<LabelConfiguration> {
    let mut configuration = LabelConfiguration::new(sensitivity_configuration_file);

    for (label, filename) in scan_templates(extract_from, &["xlsx", "docx"])? {
        let mut document_manager = document_manager_factory(&filename)?;
        let Some(document) = document_manager.document() else {
            warn!(template = %filename.display(), "Skipping template that cannot be opened");
            continue;
        };

        let read = SensitivityLabelManager::new(document).get_label();
        let current_label_info = match read {
            Ok(info) => info,
            Err(e) => {
                warn!(template = %filename.display(), error = %e, "Skipping template with unreadable label");
                document_manager.close_document(false)?;
                continue;
            }
        };
        document_manager.close_document(false)?;

        let Some(label_id) = current_label_info.label_id else {
            warn!(template = %filename.display(), "Template carries no sensitivity label");
            continue;
        };

        let record = MipLabel {
            label_id,
            label_name: current_label_info.label_name.unwrap_or_else(|| label.clone()),
            action_id: current_label_info.action_id,
            assignment_method: current_label_info.assignment_method,
            content_bits: current_label_info.content_bits,
            is_enabled: current_label_info.is_enabled,
            justification: None,
            set_date: current_label_info.set_date,
            site_id: current_label_info.site_id,
        };
        configuration.add_sensitivity_label(&label, record);
    }

    configuration.save()?;
    Ok(configuration)
}
