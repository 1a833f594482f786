use crate::config::{resolve_config_path, LabelConfiguration};
use crate::error::{MipError, MipResult};
use crate::office::{self, document_manager_factory, DocumentKind, LabelInfoManager, SensitivityLabelManager};
use crate::package::OfficePackage;
use crate::types::{LabelInfo, MipLabel};
use crate::workbook::{self, MsipManager};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Configuration file for the selected labeling mechanism
fn config_path(config: Option<PathBuf>, custom_properties: bool) -> PathBuf {
    let default = if custom_properties {
        workbook::DEFAULT_SENSITIVITY_LABELS_DEFINITION
    } else {
        office::DEFAULT_SENSITIVITY_LABELS_DEFINITION
    };
    resolve_config_path(config.as_deref(), default)
}

/// Custom properties labeling only applies to workbooks
fn require_workbook(file: &Path) -> MipResult<()> {
    match DocumentKind::from_path(file)? {
        DocumentKind::Excel => Ok(()),
        kind => Err(MipError::UnsupportedDocument(format!(
            "{} (custom properties labeling supports .xlsx only)",
            kind.extension()
        ))),
    }
}

fn print_label_info(info: &LabelInfo) {
    let dump = LabelInfoManager::new(info.clone()).dump_info();
    if dump.is_empty() {
        println!("   {}", "(no sensitivity label)".yellow());
        return;
    }
    for (key, value) in &dump {
        let rendered = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("   {}: {}", key.cyan(), rendered.bold());
    }
}

/// Execute the init command - build the label configuration from templates
pub fn init(templates: PathBuf, config: Option<PathBuf>, custom_properties: bool) -> MipResult<()> {
    let config_file = config_path(config, custom_properties);

    println!("{}", "🏷️  MIP - Capturing sensitivity labels".bold().green());
    println!("   Templates: {}", templates.display());
    println!("   Config:    {}\n", config_file.display());

    let configuration = if custom_properties {
        workbook::create_sensitivity_label_definition(&templates, &config_file)?
    } else {
        office::create_sensitivity_label_definition(&templates, &config_file)?
    };

    if configuration.is_empty() {
        println!("{}", "⚠️  No labeled templates found".yellow());
    } else {
        println!("{}", "✅ Captured labels:".bold().green());
        for (name, label) in configuration.iter() {
            println!(
                "   {} → {} ({})",
                name.bright_blue().bold(),
                label.label_name,
                label.label_id.dimmed()
            );
        }
    }
    println!("\n   Saved {} label(s) to {}", configuration.len(), config_file.display());
    Ok(())
}

/// Execute the labels command - list configured labels
pub fn labels(config: Option<PathBuf>, custom_properties: bool) -> MipResult<()> {
    let config_file = config_path(config, custom_properties);
    let configuration = LabelConfiguration::new(&config_file).load()?;

    println!("{}", "🏷️  MIP - Configured sensitivity labels".bold().green());
    println!("   Config: {}\n", config_file.display());

    if configuration.is_empty() {
        println!("{}", "   (no labels configured)".yellow());
        return Ok(());
    }
    for (name, label) in configuration.iter() {
        let method = label
            .assignment_method
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {} {} [{}] {}",
            name.bright_blue().bold(),
            label.label_name,
            method,
            label.label_id.dimmed()
        );
    }
    Ok(())
}

/// Execute the show command - print the label of each document
///
/// With `json`, a single object keyed by file path is printed once all
/// documents have been read.
pub fn show(files: Vec<PathBuf>, json: bool, custom_properties: bool) -> MipResult<()> {
    let mut failed = Vec::new();
    let mut dumps = serde_json::Map::new();

    for file in &files {
        if !json {
            println!("📄 {}", file.display().to_string().bold());
        }

        let info = if custom_properties {
            require_workbook(file)?;
            workbook::get_label_from_file(file)?
                .map(LabelInfo::from)
                .unwrap_or_default()
        } else {
            let mut document_manager = document_manager_factory(file)?;
            let Some(document) = document_manager.document() else {
                if json {
                    eprintln!("❌ {}: document could not be opened", file.display());
                } else {
                    println!("   {}", "❌ Document could not be opened".red());
                }
                failed.push(file.display().to_string());
                continue;
            };
            let info = SensitivityLabelManager::new(document).get_label()?;
            document_manager.quit()?;
            info
        };

        if json {
            dumps.insert(
                file.display().to_string(),
                serde_json::Value::Object(LabelInfoManager::new(info).dump_info()),
            );
        } else {
            print_label_info(&info);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&dumps)?);
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(MipError::DocumentNotOpen(failed.join(", ")))
    }
}

/// Execute the set command - stamp a configured label onto documents
pub fn set(
    files: Vec<PathBuf>,
    label: String,
    config: Option<PathBuf>,
    justification: Option<String>,
    custom_properties: bool,
) -> MipResult<()> {
    let config_file = config_path(config, custom_properties);
    let configuration = LabelConfiguration::new(&config_file).load()?;
    let record = configuration.get_sensitivity_label(&label)?;

    println!("{}", "🏷️  MIP - Setting sensitivity label".bold().green());
    println!(
        "   Label: {} ({})\n",
        label.bright_blue().bold(),
        record.label_name
    );

    let mut failed = Vec::new();
    for file in &files {
        let applied = if custom_properties {
            require_workbook(file)?;
            let mut package = OfficePackage::open(file)?;
            MsipManager::new(&mut package).set_label(record, justification.as_deref())?;
            package.save(file)?;
            true
        } else {
            set_office_label(file, &label, record, justification.as_deref())?
        };

        if applied {
            println!("   ✅ {}", file.display());
        } else {
            println!("   ❌ {} {}", file.display(), "(could not be opened)".red());
            failed.push(file.display().to_string());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(MipError::DocumentNotOpen(failed.join(", ")))
    }
}

fn set_office_label(
    file: &Path,
    label_key: &str,
    record: &MipLabel,
    justification: Option<&str>,
) -> MipResult<bool> {
    let mut document_manager = document_manager_factory(file)?;
    let applied = office::apply_label(document_manager.as_mut(), label_key, record, justification)?;
    document_manager.close_document(applied)?;
    document_manager.quit()?;
    Ok(applied)
}

/// Execute the new command - create a document that carries a label
pub fn new_document(
    file: PathBuf,
    label: String,
    config: Option<PathBuf>,
    custom_properties: bool,
) -> MipResult<()> {
    let config_file = config_path(config, custom_properties);
    let configuration = LabelConfiguration::new(&config_file).load()?;
    let record = configuration.get_sensitivity_label(&label)?;

    println!("{}", "🏷️  MIP - Creating labeled document".bold().green());

    if custom_properties {
        require_workbook(&file)?;
        workbook::new_labeled_workbook(&file, record)?;
    } else {
        let mut document_manager = document_manager_factory(&file)?;
        if document_manager.create_document(true).is_none() {
            return Err(MipError::DocumentNotOpen(file.display().to_string()));
        }
        office::apply_label(document_manager.as_mut(), &label, record, None)?;
        document_manager.close_document(true)?;
        document_manager.quit()?;
    }

    println!(
        "   ✅ {} is created with a Sensitivity Label ({})",
        file.display(),
        label.bright_blue().bold()
    );
    Ok(())
}
