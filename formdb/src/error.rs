use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormDbError {
    #[error("Unrecognized item kind '{kind}' for field '{name}' at path '{path}'")]
    UnrecognizedItemKind {
        path: String,
        name: String,
        kind: String,
    },

    #[error("Failed to render table '{table}': {cause}")]
    Render { table: String, cause: String },

    #[error("Dependency cycle between tables: {0}")]
    DependencyCycle(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Schema info not found: {0}")]
    SchemaInfoNotFound(String),

    #[error("Schema info already exists: {0}")]
    SchemaInfoAlreadyExists(String),

    #[error("Schema not found: {name} (revision {revision})")]
    NotFound { name: String, revision: i32 },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, FormDbError>;
