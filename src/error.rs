use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{what} not found @ {}", path.display())]
    MissingFile { what: &'static str, path: PathBuf },

    #[error("invalid credentials file: {0}")]
    Credentials(String),

    #[error("table lookup line {line}: expected `database.table`, got {text:?}")]
    Lookup { line: usize, text: String },

    #[error("request line {line}: expected `course:table`, got {text:?}")]
    Request { line: usize, text: String },

    #[error("invalid filter: {0}")]
    Filter(String),

    #[error("requested table not in lookup: {0}")]
    UnknownTable(String),

    #[error("column `{column}` does not exist in {table}")]
    UnknownColumn { table: String, column: String },

    #[error("row {row} of DESC {table} has no readable column name")]
    Describe { table: String, row: usize },

    #[error("refusing to overwrite {}", .0.display())]
    OutputExists(PathBuf),

    #[error("mysql: {0}")]
    Mysql(#[from] mysql::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;
