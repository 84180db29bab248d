//! iWork Archive Format Support
//!
//! This module decodes Apple's iWork'13 containers (Pages, Keynote, Numbers)
//! and extracts their text with a minimal amount of positional context.
//!
//! ## iWork File Structure
//!
//! iWork documents are bundles containing:
//! - `Index.zip`: Contains IWA files with serialized objects, either as a
//!   nested archive or flattened under an `Index/` prefix
//! - `Data/`: Directory containing media assets
//! - `Metadata/`: Document metadata and properties
//!
//! ## IWA Format
//!
//! Each `.iwa` file contains:
//! - Snappy-compressed data (custom framing without CRC values)
//! - Length-delimited `ArchiveInfo` headers, each followed by the payloads
//!   of the messages its `MessageInfo` entries describe
//! - Protobuf-encoded messages forming a graph of objects keyed by ID
//!
//! ## Pipeline
//!
//! ```text
//! zip entry -> SnappyStream -> ArchiveInfo loop -> BudgetedReader window
//!           -> MessageActions -> DocumentContext -> finalize -> callback
//! ```

pub mod snappy;
pub mod budget;
pub mod varint;
pub mod archive;
pub mod protobuf;
pub mod registry;
pub mod cancel;
pub mod callback;
pub mod bundle;
pub mod context;
pub mod object;
pub mod text;
pub mod keynote;
pub mod numbers;
pub mod parser;

#[cfg(test)]
pub(crate) mod testing;

/// Re-export commonly used types
pub use archive::{ArchiveInfo, MessageInfo};
pub use budget::BudgetedReader;
pub use bundle::{IwaContext, IwaParser};
pub use callback::{
    ExtractTextCallback, ParserCallback, Scope, TextAttributes, TextCollector, TextTarget,
};
pub use cancel::CancellationToken;
pub use context::{DocumentContext, DocumentKind};
pub use object::{ObjectId, ObjectKind, StoredObject};
pub use parser::{DecodeErrorPolicy, ExtractTextParser, ParserOptions};
pub use registry::MessageActions;
pub use snappy::SnappyStream;

use std::io;

/// Error types for iWork parsing
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid IWA format: {0}")]
    Format(String),

    #[error("Protobuf decoding error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    /// Wrap this error so it can travel through `std::io::Read` implementations.
    pub(crate) fn into_io(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }
}

impl From<io::Error> for Error {
    /// Unwraps errors that were tunneled through an `io::Error` by
    /// [`Error::into_io`], so frame failures surface as [`Error::Format`].
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(other)) => Error::Io(io::Error::new(kind, other)),
            None => Error::Io(io::Error::from(kind)),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
