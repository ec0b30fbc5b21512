use std::path::PathBuf;

/// Errors that can occur across the devmove workspace.
///
/// Library crates return this type directly; the binary renders it as a
/// `miette` report.
///
/// # Examples
///
/// ```
/// use devmove_core::DevmoveError;
///
/// let err = DevmoveError::InputValidation("empty developer id".into());
/// assert!(err.to_string().contains("empty developer id"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DevmoveError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// CSV reading or writing failure.
    #[error("CSV error: {0}")]
    Csv(String),

    /// A table is missing a column the analysis needs.
    #[error("missing column '{column}' in {}", .path.display())]
    #[diagnostic(help("check the header row; column names are matched exactly"))]
    MissingColumn {
        /// Name of the absent column.
        column: String,
        /// Table the column was expected in.
        path: PathBuf,
    },

    /// A row reached the analysis with a null or malformed field.
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(help("paths are resolved relative to the current directory"))]
    FileNotFound(PathBuf),
}
