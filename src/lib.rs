//! iwork-extract - Text extraction for Apple iWork'13 documents
//!
//! This library streams Pages, Keynote and Numbers documents and reports
//! their text through a callback, tagged with where it came from.
//!
//! # Features
//!
//! - **Streaming input**: bundle directories, single-file zips on disk, or
//!   any `Read` source; the container is never loaded whole
//! - **Snappy decoding**: iWork's CRC-less snappy framing
//! - **Keynote**: slide text in tree order with speaker notes, master slides
//!   skipped
//! - **Numbers**: shared table strings in key order
//! - **Placeholder redaction**: template text is masked before emission
//!
//! # Example - Extracting text from a file
//!
//! ```no_run
//! use iwork_extract::iwa::{ExtractTextParser, IwaParser, TextCollector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = ExtractTextParser::new();
//! let mut collector = TextCollector::new();
//! parser.parse_path("report.pages", &mut collector)?;
//!
//! for (text, attributes) in &collector.blocks {
//!     println!("[{}] {}", attributes.scope, text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Custom callback
//!
//! ```no_run
//! use std::fs::File;
//! use iwork_extract::iwa::{
//!     ExtractTextCallback, ExtractTextParser, IwaParser, ParserCallback, Scope, TextAttributes,
//! };
//!
//! struct NotesOnly(Vec<String>);
//!
//! impl ParserCallback for NotesOnly {}
//!
//! impl ExtractTextCallback for NotesOnly {
//!     fn on_text(&mut self, text: &str, attributes: TextAttributes) {
//!         if attributes.scope == Scope::Notes {
//!             self.0.push(text.to_string());
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut notes = NotesOnly(Vec::new());
//! ExtractTextParser::new().parse_reader(File::open("talk.key")?, &mut notes)?;
//! # Ok(())
//! # }
//! ```

/// iWork archive (IWA) format parser and text extractor
pub mod iwa;

pub use iwa::{Error, ExtractTextParser, IwaParser, ParserOptions, Result};
