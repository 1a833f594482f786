//! Office document labels through the built-in sensitivity label property
//!
//! - A factory picks the Word or Excel document manager from the extension
//! - Managers share one open / create / save / close / quit lifecycle
//! - `SensitivityLabelManager` reads and assigns the document's label
//! - `set_label` applies configured labels and bootstraps the configuration

mod document;
mod excel;
mod factory;
mod sensitivity;
mod set_label;
mod word;

pub use document::{DocumentKind, DocumentManager, DocumentSession};
pub use excel::ExcelDocumentManager;
pub use factory::document_manager_factory;
pub use sensitivity::{
    LabelInfoManager, SensitivityLabelManager, LABEL_INFO_CONTENT_TYPE, LABEL_INFO_PART,
    LABEL_INFO_REL_TYPE,
};
pub use set_label::{
    apply_label, create_sensitivity_label_definition, default_justification,
    set_sensitivity_label_to_document, set_sensitivity_label_to_file,
    DEFAULT_SENSITIVITY_LABELS_DEFINITION, DEFAULT_SENSITIVITY_TEMPLATES,
};
pub use word::WordDocumentManager;
