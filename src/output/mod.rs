//! Output table writers

use crate::ResultSet;

pub mod csv;

pub use self::csv::CsvTableAppender;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Payload is not an array of records
    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Append-only table receiving one result set per window
pub trait TableAppender {
    /// Append every record of `result_set` as a row.
    ///
    /// The first append to an empty table writes the header. On error nothing
    /// from this result set has been written.
    ///
    /// # Returns
    /// Number of rows written
    fn append(&mut self, result_set: ResultSet) -> OutputResult<usize>;
}

impl<T: TableAppender + ?Sized> TableAppender for Box<T> {
    fn append(&mut self, result_set: ResultSet) -> OutputResult<usize> {
        (**self).append(result_set)
    }
}
