use super::document::{DocumentKind, DocumentManager, DocumentSession};
use crate::error::{MipError, MipResult};
use crate::package::OfficePackage;
use calamine::{open_workbook_from_rs, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Manages Excel (.xlsx) workbooks
#[derive(Debug)]
pub struct ExcelDocumentManager {
    session: DocumentSession,
}

impl ExcelDocumentManager {
    pub fn new<P: AsRef<Path>>(filename: P) -> Self {
        Self {
            session: DocumentSession::new(filename),
        }
    }
}

impl DocumentManager for ExcelDocumentManager {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Excel
    }

    fn session(&self) -> &DocumentSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut DocumentSession {
        &mut self.session
    }

    /// Open the workbook, checking that it is readable as a spreadsheet
    fn load_package(&self, path: &Path) -> MipResult<OfficePackage> {
        let bytes = fs::read(path)?;

        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.as_slice()))
            .map_err(|e| MipError::Workbook(format!("Failed to open Excel file: {}", e)))?;
        let sheets = workbook.sheet_names();
        if sheets.is_empty() {
            return Err(MipError::InvalidDocument {
                path: path.display().to_string(),
                reason: "workbook has no worksheets".to_string(),
            });
        }
        debug!(file = %path.display(), sheets = sheets.len(), "Workbook is readable");

        let package = OfficePackage::from_bytes(&bytes)?;
        if !package.has_part(self.kind().main_part()) {
            return Err(MipError::InvalidDocument {
                path: path.display().to_string(),
                reason: format!("missing {}", self.kind().main_part()),
            });
        }
        Ok(package)
    }

    fn blank_package(&self) -> MipResult<OfficePackage> {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        let bytes = workbook.save_to_buffer()?;
        OfficePackage::from_bytes(&bytes)
    }
}
