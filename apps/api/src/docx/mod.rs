// WordprocessingML (.docx) access: zip package, XML tree, and the paragraph/run model
// the format and content layers work against.

pub mod document;
pub mod package;
pub mod xml;

#[cfg(test)]
pub mod fixtures;

use thiserror::Error;

pub use document::{CoreProperties, Docx};

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("missing package part: {0}")]
    MissingPart(String),

    #[error("malformed {part}: {message}")]
    Malformed { part: String, message: String },
}
