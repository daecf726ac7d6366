use thiserror::Error;

/// Failures surfaced by the engine. Invalid state-machine transitions are
/// deliberately not represented here; those are silent no-ops.
#[derive(Debug, Error)]
pub enum Error {
    /// The selected configuration yields nothing to memorize
    /// (e.g. zero kana rows active). The session must not start.
    #[error("empty selection: nothing to generate for the current settings")]
    EmptySelection,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// An import document that failed validation. The persisted store is
    /// left untouched when this is returned.
    #[error("malformed import document: {0}")]
    MalformedImport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
