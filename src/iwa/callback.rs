//! Parser Callbacks
//!
//! A parse reports structure and text through callbacks instead of building
//! a document model. [`ParserCallback`] carries the structural events and
//! [`ExtractTextCallback`] adds text delivery.

use std::fmt;
use std::io::Read;

/// Structural events of a parse. Every method defaults to a no-op.
///
/// `on_begin_document` and `on_end_document` are always paired, even when
/// the parse fails.
pub trait ParserCallback {
    fn on_begin_document(&mut self) {}

    fn on_end_document(&mut self) {}

    fn on_begin_index(&mut self) {}

    fn on_end_index(&mut self) {}

    fn on_begin_iwa(&mut self, _name: &str) {}

    fn on_end_iwa(&mut self, _name: &str) {}

    /// A member of the index archive that is not parsed as IWA.
    ///
    /// `data` yields the member's decompressed bytes; whatever is left
    /// unread is discarded afterwards.
    fn on_skip(&mut self, _name: &str, _data: &mut dyn Read) {}
}

/// Receiver of extracted text
pub trait ExtractTextCallback: ParserCallback {
    fn on_text(&mut self, text: &str, attributes: TextAttributes);
}

/// Callback object used by the text extractor
pub type TextTarget = dyn ExtractTextCallback;

/// Where a piece of text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Text no structural walk reached
    Unreferenced,
    /// Body text of the document
    Document,
    /// Speaker notes
    Notes,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Unreferenced => "unreferenced",
            Scope::Document => "document",
            Scope::Notes => "notes",
        };
        f.write_str(name)
    }
}

/// Attributes attached to each emitted text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextAttributes {
    pub scope: Scope,
}

impl TextAttributes {
    pub const UNREFERENCED: Self = Self::new(Scope::Unreferenced);
    pub const DOCUMENT: Self = Self::new(Scope::Document);
    pub const NOTES: Self = Self::new(Scope::Notes);

    pub const fn new(scope: Scope) -> Self {
        Self { scope }
    }
}

/// Callback that records everything it receives
#[derive(Debug, Default)]
pub struct TextCollector {
    /// Text blocks in emission order
    pub blocks: Vec<(String, TextAttributes)>,
    /// IWA members that were entered
    pub iwa_files: Vec<String>,
    /// Members reported through `on_skip`
    pub skipped: Vec<String>,
    pub documents_begun: usize,
    pub documents_ended: usize,
    pub indexes_begun: usize,
    pub indexes_ended: usize,
}

impl TextCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text blocks of one scope, in emission order
    pub fn texts(&self, scope: Scope) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|(_, attributes)| attributes.scope == scope)
            .map(|(text, _)| text.as_str())
            .collect()
    }

    /// All text joined by newlines
    pub fn joined(&self) -> String {
        self.blocks
            .iter()
            .map(|(text, _)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ParserCallback for TextCollector {
    fn on_begin_document(&mut self) {
        self.documents_begun += 1;
    }

    fn on_end_document(&mut self) {
        self.documents_ended += 1;
    }

    fn on_begin_index(&mut self) {
        self.indexes_begun += 1;
    }

    fn on_end_index(&mut self) {
        self.indexes_ended += 1;
    }

    fn on_begin_iwa(&mut self, name: &str) {
        self.iwa_files.push(name.to_string());
    }

    fn on_skip(&mut self, name: &str, _data: &mut dyn Read) {
        self.skipped.push(name.to_string());
    }
}

impl ExtractTextCallback for TextCollector {
    fn on_text(&mut self, text: &str, attributes: TextAttributes) {
        self.blocks.push((text.to_string(), attributes));
    }
}
