#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document name: {0:?}")]
    InvalidName(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[error("{path} is not valid UTF-8 text")]
    NotText { path: String },

    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(String),
}
