//! Document manager and built-in sensitivity label tests

use pretty_assertions::assert_eq;
use royalbit_mip::config::LabelConfiguration;
use royalbit_mip::error::MipError;
use royalbit_mip::office::{
    apply_label, create_sensitivity_label_definition, default_justification,
    document_manager_factory, set_sensitivity_label_to_document, set_sensitivity_label_to_file,
    DocumentKind, DocumentManager, ExcelDocumentManager, LabelInfoManager,
    SensitivityLabelManager, WordDocumentManager, LABEL_INFO_PART,
};
use royalbit_mip::package::OfficePackage;
use royalbit_mip::types::{AssignmentMethod, MipLabel};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const INTERNAL_ID: &str = "0b5e2c1a-7d3f-4e1b-9a11-3c8f6d2e4b71";
const PUBLIC_ID: &str = "8a9c41f3-5b2e-4d0a-b7c6-1e2f3a4b5c6d";
const SITE_ID: &str = "72f988bf-86f1-41af-91ab-2d7cd011db47";

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("sensitivity_labels_definition.json");
    let mut config = LabelConfiguration::new(&path);

    let mut internal = MipLabel::new(INTERNAL_ID, "Internal Use Only");
    internal.site_id = Some(SITE_ID.to_string());
    internal.content_bits = Some(0);
    config.add_sensitivity_label("InternalUseOnly", internal);

    let mut public = MipLabel::new(PUBLIC_ID, "Public");
    public.site_id = Some(SITE_ID.to_string());
    config.add_sensitivity_label("Public", public);

    config.save().unwrap();
    path
}

/// Create an unlabeled document of the file's kind
fn create_blank(path: &Path) {
    let mut manager = document_manager_factory(path).unwrap();
    assert!(manager.create_document(false).is_some());
    manager.close_document(true).unwrap();
    manager.quit().unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// FACTORY
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_factory_dispatches_on_extension() {
    let word = document_manager_factory("report.docx").unwrap();
    assert_eq!(word.kind(), DocumentKind::Word);
    assert_eq!(word.filename(), Path::new("report.docx"));

    let excel = document_manager_factory("budget.XLSX").unwrap();
    assert_eq!(excel.kind(), DocumentKind::Excel);
}

#[test]
fn test_factory_rejects_other_extensions() {
    let err = document_manager_factory("slides.pptx").err().unwrap();
    assert!(matches!(err, MipError::UnsupportedDocument(_)));
    assert_eq!(
        err.to_string(),
        "Office Document Manager for .pptx is not implemented."
    );
    assert!(document_manager_factory("README").is_err());
}

// ═══════════════════════════════════════════════════════════════════════════
// LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_open_missing_document_returns_none() {
    let mut manager = WordDocumentManager::new("/nonexistent/report.docx");
    assert!(manager.open_document(false).is_none());
    assert!(manager.document().is_none());
}

#[test]
fn test_open_rejects_wrong_package() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("book.xlsx");
    create_blank(&path);

    // A workbook renamed to .docx has no word/document.xml
    let renamed = temp_dir.path().join("book.docx");
    fs::copy(&path, &renamed).unwrap();
    let mut manager = WordDocumentManager::new(&renamed);
    assert!(manager.document().is_none());
}

#[test]
fn test_open_rejects_corrupt_workbook() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.xlsx");
    fs::write(&path, b"PK not really").unwrap();
    let mut manager = ExcelDocumentManager::new(&path);
    assert!(manager.document().is_none());
}

#[test]
fn test_create_and_save_new_documents() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["new.docx", "new.xlsx"] {
        let path = temp_dir.path().join(name);
        let mut manager = document_manager_factory(&path).unwrap();
        assert!(manager.create_document(true).is_some());
        assert!(manager.is_new_document());
        manager.save_document().unwrap();
        assert!(!manager.is_new_document());
        manager.quit().unwrap();

        let mut reopened = document_manager_factory(&path).unwrap();
        assert!(reopened.document().is_some(), "{} should reopen", name);
    }
}

#[test]
fn test_save_as_moves_the_document() {
    let temp_dir = TempDir::new().unwrap();
    let original = temp_dir.path().join("original.docx");
    create_blank(&original);

    let copy = temp_dir.path().join("copy.docx");
    let mut manager = WordDocumentManager::new(&original);
    assert!(manager.document().is_some());
    manager.save_as_document(&copy).unwrap();
    assert_eq!(manager.filename(), copy.as_path());
    assert!(copy.exists());
}

#[test]
fn test_close_without_save_discards_changes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.docx");
    create_blank(&path);

    let mut manager = document_manager_factory(&path).unwrap();
    let document = manager.document().unwrap();
    document.set_part("word/extra.xml", "<extra/>");
    manager.close_document(false).unwrap();

    let package = OfficePackage::open(&path).unwrap();
    assert!(!package.has_part("word/extra.xml"));
}

#[test]
fn test_quit_ends_the_session() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.docx");
    create_blank(&path);

    let mut manager = document_manager_factory(&path).unwrap();
    assert!(manager.document().is_some());
    manager.quit().unwrap();
    assert!(manager.document().is_none());
    assert!(manager.create_document(true).is_none());
}

#[test]
fn test_save_as_without_document() {
    let mut manager = ExcelDocumentManager::new("missing.xlsx");
    let result = manager.save_as_document(Path::new("other.xlsx"));
    assert!(matches!(result, Err(MipError::DocumentNotOpen(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// SENSITIVITY LABEL
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_unlabeled_document_has_empty_label() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.docx");
    create_blank(&path);

    let mut manager = document_manager_factory(&path).unwrap();
    let info = SensitivityLabelManager::new(manager.document().unwrap())
        .get_label()
        .unwrap();
    assert!(info.is_empty());
    assert!(LabelInfoManager::new(info).dump_info().is_empty());
}

#[test]
fn test_set_label_writes_label_info_part() {
    let mut package = OfficePackage::new();
    package.set_part(
        "[Content_Types].xml",
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"></Types>"#,
    );

    let mut manager = SensitivityLabelManager::new(&mut package);
    let mut info = manager.create_label_info();
    info.label_id = Some(INTERNAL_ID.to_string());
    info.label_name = Some("Internal Use Only".to_string());
    info.assignment_method = Some(AssignmentMethod::Privileged);
    info.site_id = Some(SITE_ID.to_string());
    manager.set_label(&info).unwrap();

    let part = package.part_str(LABEL_INFO_PART).unwrap().unwrap();
    assert!(part.contains(&format!(r#"id="{{{}}}""#, INTERNAL_ID)));
    assert!(part.contains(r#"method="Privileged""#));
    assert!(part.contains(r#"removed="0""#));

    let types = package.part_str("[Content_Types].xml").unwrap().unwrap();
    assert!(types.contains("application/vnd.ms-office.classificationlabels+xml"));
    let rels = package.part_str("_rels/.rels").unwrap().unwrap();
    assert!(rels.contains("docMetadata/LabelInfo.xml"));

    let read = SensitivityLabelManager::new(&mut package).get_label().unwrap();
    assert_eq!(read.label_id.as_deref(), Some(INTERNAL_ID));
    assert_eq!(read.label_name.as_deref(), Some("Internal Use Only"));
    assert_eq!(read.site_id.as_deref(), Some(SITE_ID));
    assert_eq!(read.is_enabled, Some(true));
}

#[test]
fn test_set_label_requires_id_and_name() {
    let mut package = OfficePackage::new();
    let mut manager = SensitivityLabelManager::new(&mut package);
    let mut info = manager.create_label_info();
    info.label_name = Some("Public".to_string());
    assert!(matches!(
        manager.set_label(&info),
        Err(MipError::InvalidLabel(_))
    ));
}

#[test]
fn test_set_sensitivity_label_to_file_word_and_excel() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());

    for name in ["dummy_internal_use_only.docx", "dummy_internal_use_only.xlsx"] {
        let path = temp_dir.path().join(name);
        create_blank(&path);

        set_sensitivity_label_to_file(&path, "InternalUseOnly", &config).unwrap();

        let mut manager = document_manager_factory(&path).unwrap();
        let info = SensitivityLabelManager::new(manager.document().unwrap())
            .get_label()
            .unwrap();
        assert_eq!(info.label_id.as_deref(), Some(INTERNAL_ID));
        assert_eq!(info.label_name.as_deref(), Some("Internal Use Only"));
        assert_eq!(info.assignment_method, Some(AssignmentMethod::Auto));
        assert_eq!(
            info.justification,
            Some(default_justification("InternalUseOnly"))
        );
        assert!(info.set_date.is_some());
        assert!(info.action_id.is_some());
        manager.quit().unwrap();
    }
}

#[test]
fn test_relabel_document() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());
    let path = temp_dir.path().join("report.docx");
    create_blank(&path);

    set_sensitivity_label_to_file(&path, "InternalUseOnly", &config).unwrap();
    set_sensitivity_label_to_file(&path, "Public", &config).unwrap();

    let mut manager = document_manager_factory(&path).unwrap();
    let info = SensitivityLabelManager::new(manager.document().unwrap())
        .get_label()
        .unwrap();
    assert_eq!(info.label_id.as_deref(), Some(PUBLIC_ID));
    assert_eq!(info.label_name.as_deref(), Some("Public"));
}

#[test]
fn test_set_label_unknown_key() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());
    let path = temp_dir.path().join("report.docx");
    create_blank(&path);

    let mut manager = document_manager_factory(&path).unwrap();
    let result = set_sensitivity_label_to_document(manager.as_mut(), "TopSecret", &config);
    assert!(matches!(result, Err(MipError::LabelNotFound { .. })));
}

#[test]
fn test_set_label_missing_configuration() {
    let mut manager = document_manager_factory("report.docx").unwrap();
    let result =
        set_sensitivity_label_to_document(manager.as_mut(), "Public", "nonexistent/labels.json");
    assert!(matches!(result, Err(MipError::Io(_))));
}

#[test]
fn test_apply_label_without_document_is_a_no_op() {
    let mut manager = WordDocumentManager::new("/nonexistent/report.docx");
    let applied = apply_label(&mut manager, "Public", &MipLabel::new(PUBLIC_ID, "Public"), None)
        .unwrap();
    assert!(!applied);
}

#[test]
fn test_create_new_labeled_document() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("output/dummy_new.docx");
    let label = MipLabel::new(INTERNAL_ID, "Internal Use Only");

    let mut manager = document_manager_factory(&path).unwrap();
    assert!(manager.create_document(true).is_some());
    assert!(apply_label(manager.as_mut(), "InternalUseOnly", &label, Some("new report")).unwrap());
    manager.close_document(true).unwrap();

    let mut reopened = document_manager_factory(&path).unwrap();
    let info = SensitivityLabelManager::new(reopened.document().unwrap())
        .get_label()
        .unwrap();
    assert_eq!(info.label_id.as_deref(), Some(INTERNAL_ID));
    assert_eq!(info.justification.as_deref(), Some("new report"));
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION BOOTSTRAP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_create_definition_from_mixed_templates() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path());
    let templates = temp_dir.path().join("sensitivity_model");
    fs::create_dir(&templates).unwrap();

    let internal = templates.join("InternalUseOnly.docx");
    create_blank(&internal);
    set_sensitivity_label_to_file(&internal, "InternalUseOnly", &config).unwrap();

    let public = templates.join("Public.xlsx");
    create_blank(&public);
    set_sensitivity_label_to_file(&public, "Public", &config).unwrap();

    create_blank(&templates.join("Draft.docx"));
    fs::write(templates.join("notes.txt"), "not a template").unwrap();

    let output = temp_dir.path().join("generated.json");
    let generated = create_sensitivity_label_definition(&templates, &output).unwrap();

    let names: Vec<&String> = generated.labels().collect();
    assert_eq!(names, vec!["InternalUseOnly", "Public"]);

    let loaded = LabelConfiguration::new(&output).load().unwrap();
    let record = loaded.get_sensitivity_label("Public").unwrap();
    assert_eq!(record.label_id, PUBLIC_ID);
    assert_eq!(record.label_name, "Public");
    assert_eq!(record.site_id.as_deref(), Some(SITE_ID));
    assert_eq!(record.is_enabled, Some(true));
    assert!(record.justification.is_none());
}

#[test]
fn test_label_name_falls_back_to_template_name() {
    let temp_dir = TempDir::new().unwrap();
    let templates = temp_dir.path().join("sensitivity_model");
    fs::create_dir(&templates).unwrap();

    // Only LabelInfo.xml, as written by clients that skip the custom properties
    let path = templates.join("Confidential.docx");
    create_blank(&path);
    let mut package = OfficePackage::open(&path).unwrap();
    package.set_part(
        LABEL_INFO_PART,
        format!(
            r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?><clbl:labelList xmlns:clbl="http://schemas.microsoft.com/office/2020/mipLabelMetadata"><clbl:label id="{{{}}}" enabled="1" method="Standard" siteId="{{{}}}" contentBits="0" removed="0" /></clbl:labelList>"#,
            INTERNAL_ID, SITE_ID
        ),
    );
    package.save(&path).unwrap();

    let generated =
        create_sensitivity_label_definition(&templates, temp_dir.path().join("labels.json")).unwrap();
    let record = generated.get_sensitivity_label("Confidential").unwrap();
    assert_eq!(record.label_id, INTERNAL_ID);
    assert_eq!(record.label_name, "Confidential");
    assert_eq!(record.assignment_method, Some(AssignmentMethod::Standard));
}
