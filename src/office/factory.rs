use super::document::{DocumentKind, DocumentManager};
use super::excel::ExcelDocumentManager;
use super::word::WordDocumentManager;
use crate::error::MipResult;
use std::path::Path;

/// Create the document manager matching the file extension
///
/// `.docx` files get a [`WordDocumentManager`], `.xlsx` files an
/// [`ExcelDocumentManager`]; anything else is `UnsupportedDocument`.
pub fn document_manager_factory<P: AsRef<Path>>(fullpath: P) -> MipResult<Box<dyn DocumentManager>> {
    let manager: Box<dyn DocumentManager> = match DocumentKind::from_path(fullpath.as_ref())? {
        DocumentKind::Word => Box::new(WordDocumentManager::new(fullpath)),
        DocumentKind::Excel => Box::new(ExcelDocumentManager::new(fullpath)),
    };
    Ok(manager)
}
