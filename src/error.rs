use thiserror::Error;

pub type MipResult<T> = Result<T, MipError>;

#[derive(Error, Debug)]
pub enum MipError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Workbook writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Office Document Manager for {0} is not implemented.")]
    UnsupportedDocument(String),

    #[error("No document is open for {0}")]
    DocumentNotOpen(String),

    #[error("Invalid document {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    #[error("Sensitivity label '{name}' not found (available: {available})")]
    LabelNotFound { name: String, available: String },

    #[error("Invalid sensitivity label: {0}")]
    InvalidLabel(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl MipError {
    /// Build a `LabelNotFound` error listing the names that do exist
    pub fn label_not_found<'a, I>(name: &str, available: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let names: Vec<&str> = available.into_iter().map(String::as_str).collect();
        MipError::LabelNotFound {
            name: name.to_string(),
            available: if names.is_empty() {
                "none".to_string()
            } else {
                names.join(", ")
            },
        }
    }
}
