//! MIP - sensitivity labels for Office documents
//!
//! This library reads and stamps Microsoft Information Protection labels on
//! Word (.docx) and Excel (.xlsx) files, and keeps a JSON configuration that
//! maps human label names to label records.
//!
//! # Features
//!
//! - Built-in sensitivity label property (`docMetadata/LabelInfo.xml`) via
//!   Word / Excel document managers
//! - Custom-properties labels (`MSIP_Label_<id>_<field>`) for workbooks
//! - Label configuration bootstrapped from labeled template documents
//!
//! # Example
//!
//! ```no_run
//! use royalbit_mip::office::{document_manager_factory, SensitivityLabelManager};
//!
//! let mut manager = document_manager_factory("report.docx")?;
//! if let Some(document) = manager.document() {
//!     let info = SensitivityLabelManager::new(document).get_label()?;
//!     println!("Label: {:?}", info.label_name);
//! }
//! manager.quit()?;
//! # Ok::<(), royalbit_mip::error::MipError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod office;
pub mod package;
pub mod types;
pub mod workbook;

// Re-export commonly used types
pub use config::LabelConfiguration;
pub use error::{MipError, MipResult};
pub use types::{AssignmentMethod, LabelInfo, MipLabel};
