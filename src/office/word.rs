use super::document::{DocumentKind, DocumentManager, DocumentSession};
use crate::error::{MipError, MipResult};
use crate::package::{OfficePackage, CONTENT_TYPES_PART, ROOT_RELS_PART};
use std::path::Path;

const BLANK_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const BLANK_ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const BLANK_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p/><w:sectPr/></w:body></w:document>"#;

/// Manages Word (.docx) documents
#[derive(Debug)]
pub struct WordDocumentManager {
    session: DocumentSession,
}

impl WordDocumentManager {
    pub fn new<P: AsRef<Path>>(filename: P) -> Self {
        Self {
            session: DocumentSession::new(filename),
        }
    }
}

impl DocumentManager for WordDocumentManager {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Word
    }

    fn session(&self) -> &DocumentSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut DocumentSession {
        &mut self.session
    }

    fn load_package(&self, path: &Path) -> MipResult<OfficePackage> {
        let package = OfficePackage::open(path)?;
        if !package.has_part(self.kind().main_part()) {
            return Err(MipError::InvalidDocument {
                path: path.display().to_string(),
                reason: format!("missing {}", self.kind().main_part()),
            });
        }
        Ok(package)
    }

    fn blank_package(&self) -> MipResult<OfficePackage> {
        let mut package = OfficePackage::new();
        package.set_part(CONTENT_TYPES_PART, BLANK_CONTENT_TYPES);
        package.set_part(ROOT_RELS_PART, BLANK_ROOT_RELS);
        package.set_part(self.kind().main_part(), BLANK_DOCUMENT);
        Ok(package)
    }
}
