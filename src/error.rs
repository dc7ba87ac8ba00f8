use thiserror::Error;

/// All possible errors that this library can return.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BibleRefError {
    /// The input does not contain a recognizable reference, or (for `match`)
    /// contains more than the single reference the caller asked for.
    #[error("parse error: {0}")]
    Parse(String),

    /// A book, chapter, or verse number is out of range for the model it was
    /// constructed against.
    #[error("range error: {0}")]
    Range(String),

    /// A factory was called with an argument combination it doesn't support.
    #[error("type error: {0}")]
    Type(String),

    /// A book metadata file did not follow the expected line format, or
    /// declared the same alias for two different books.
    #[error("book data error: {0}")]
    BookData(String),
}

/// This crate's fallible return type.
pub type Result<T> = std::result::Result<T, BibleRefError>;
