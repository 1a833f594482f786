//! Document lifecycle shared by the Word and Excel managers

use crate::error::{MipError, MipResult};
use crate::package::OfficePackage;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Office document families with a document manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Word,
    Excel,
}

impl DocumentKind {
    /// Pick the document family from a file extension (case-insensitive)
    pub fn from_path<P: AsRef<Path>>(path: P) -> MipResult<Self> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "docx" => Ok(DocumentKind::Word),
            "xlsx" => Ok(DocumentKind::Excel),
            _ => Err(MipError::UnsupportedDocument(format!(".{}", extension))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Word => ".docx",
            DocumentKind::Excel => ".xlsx",
        }
    }

    /// Part that must exist for the package to be a document of this kind
    pub fn main_part(self) -> &'static str {
        match self {
            DocumentKind::Word => "word/document.xml",
            DocumentKind::Excel => "xl/workbook.xml",
        }
    }

    pub fn application(self) -> &'static str {
        match self {
            DocumentKind::Word => "Word",
            DocumentKind::Excel => "Excel",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.application())
    }
}

/// State of one managed document
#[derive(Debug)]
pub struct DocumentSession {
    pub filename: PathBuf,
    pub document: Option<OfficePackage>,
    pub new_document: bool,
    pub visible: bool,
    pub running: bool,
}

impl DocumentSession {
    pub fn new<P: AsRef<Path>>(filename: P) -> Self {
        Self {
            filename: filename.as_ref().to_path_buf(),
            document: None,
            new_document: false,
            visible: true,
            running: true,
        }
    }
}

/// Open / create / save / close operations on an Office document
///
/// Implementors supply the kind-specific parts (how a package is validated
/// on open and what a blank document looks like); the lifecycle is shared.
pub trait DocumentManager {
    fn kind(&self) -> DocumentKind;

    fn session(&self) -> &DocumentSession;

    fn session_mut(&mut self) -> &mut DocumentSession;

    /// Read and validate the package at `path`
    fn load_package(&self, path: &Path) -> MipResult<OfficePackage>;

    /// A new, empty document
    fn blank_package(&self) -> MipResult<OfficePackage>;

    fn filename(&self) -> &Path {
        &self.session().filename
    }

    fn is_new_document(&self) -> bool {
        self.session().new_document
    }

    /// Open the document if it is not open yet
    ///
    /// Failures are logged and leave the manager without a document.
    fn open_document(&mut self, visible: bool) -> Option<&mut OfficePackage> {
        if self.session().document.is_none() {
            if !self.session().running {
                error!(file = %self.filename().display(), "{} session has quit", self.kind());
                return None;
            }
            self.session_mut().visible = visible;
            let path = self.session().filename.clone();
            match self.load_package(&path) {
                Ok(package) => {
                    let session = self.session_mut();
                    session.document = Some(package);
                    session.new_document = false;
                    info!(file = %path.display(), visible, "Opened {} document", self.kind());
                }
                Err(e) => {
                    error!(file = %path.display(), error = %e, "Error opening {} document", self.kind());
                }
            }
        }
        self.session_mut().document.as_mut()
    }

    /// Create a new document, or return the one already open
    fn create_document(&mut self, visible: bool) -> Option<&mut OfficePackage> {
        if self.session().document.is_none() {
            if !self.session().running {
                error!(file = %self.filename().display(), "{} session has quit", self.kind());
                return None;
            }
            self.session_mut().visible = visible;
            match self.blank_package() {
                Ok(package) => {
                    let session = self.session_mut();
                    session.document = Some(package);
                    session.new_document = true;
                    info!(file = %self.filename().display(), "Created new {} document", self.kind());
                }
                Err(e) => {
                    error!(error = %e, "Error creating new {} document", self.kind());
                }
            }
        }
        self.session_mut().document.as_mut()
    }

    /// Save the document under `filename`, which becomes the managed file
    fn save_as_document(&mut self, filename: &Path) -> MipResult<()> {
        let session = self.session_mut();
        session.filename = filename.to_path_buf();
        let document = session
            .document
            .as_ref()
            .ok_or_else(|| MipError::DocumentNotOpen(filename.display().to_string()))?;
        document.save(filename)?;
        session.new_document = false;
        Ok(())
    }

    /// Save the document: new documents through save-as, others in place
    fn save_document(&mut self) -> MipResult<()> {
        if self.session().document.is_none() {
            return Ok(());
        }
        let filename = self.session().filename.clone();
        let result = if self.session().new_document {
            self.save_as_document(&filename)
        } else {
            match &self.session().document {
                Some(document) => document.save(&filename),
                None => Ok(()),
            }
        };
        if let Err(e) = &result {
            error!(file = %filename.display(), error = %e, "Error saving document");
        }
        result
    }

    /// Close the document, optionally saving it first
    fn close_document(&mut self, save: bool) -> MipResult<()> {
        if self.session().document.is_none() {
            return Ok(());
        }
        if save {
            self.save_document()?;
        }
        self.session_mut().document = None;
        Ok(())
    }

    /// Close without saving and end the session
    fn quit(&mut self) -> MipResult<()> {
        self.close_document(false)?;
        self.session_mut().running = false;
        Ok(())
    }

    /// The open document, opening it on first access
    fn document(&mut self) -> Option<&mut OfficePackage> {
        if self.session().document.is_none() {
            self.open_document(true);
        }
        self.session_mut().document.as_mut()
    }
}
