#[derive(Debug, thiserror::Error)]
pub enum BmpError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("precondition violated: {0}")]
    Precondition(String),
    #[error("invalid demographics: {0}")]
    Demographics(#[from] bmp_types::TypesError),

    #[error("failed to read reference file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("criteria schema mismatch at {path}: {message}")]
    CriteriaSchema { path: String, message: String },
    #[error("failed to query SQLite reference: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type BmpResult<T> = std::result::Result<T, BmpError>;
