use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemSimError {
    #[error("Invalid request size: {0} (must be positive)")]
    InvalidSize(u64),

    #[error("Invalid owner id: must be a non-empty string")]
    InvalidOwner,

    #[error("Owner '{0}' already holds an allocation")]
    DuplicateOwner(String),

    #[error("No free block large enough for {requested} KB")]
    NoSuitableBlock { requested: u64 },

    #[error("Owner '{0}' not found in allocated memory")]
    OwnerNotFound(String),

    #[error("Invalid seed layout: {0}")]
    InvalidLayout(String),

    #[error("Ledger corruption detected: {0}")]
    LedgerCorrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Layout parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, MemSimError>;
