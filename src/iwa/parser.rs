//! Text Extraction Parser
//!
//! [`ExtractTextParser`] picks a [`DocumentContext`] for each document it is
//! handed and reports the extracted text to an [`ExtractTextCallback`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use iwork_extract::iwa::{ExtractTextParser, IwaParser, Scope, TextCollector};
//!
//! let parser = ExtractTextParser::new();
//! let mut collector = TextCollector::new();
//! parser.parse_path("presentation.key", &mut collector)?;
//!
//! for text in collector.texts(Scope::Document) {
//!     println!("{}", text);
//! }
//! # Ok::<(), iwork_extract::iwa::Error>(())
//! ```
//!
//! [`ExtractTextCallback`]: crate::iwa::ExtractTextCallback

use crate::iwa::bundle::IwaParser;
use crate::iwa::cancel::CancellationToken;
use crate::iwa::context::{DocumentContext, DocumentKind};

/// What happens when a message does not decode against its schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorPolicy {
    /// Abort the parse with [`crate::iwa::Error::Decode`]
    Fail,
    /// Log the failure and continue with the next message
    Skip,
}

/// Configuration options for text extraction.
///
/// Unset options fall back to the defaults of the detected document kind.
///
/// ```rust
/// use iwork_extract::iwa::{DecodeErrorPolicy, DocumentKind, ParserOptions};
///
/// let options = ParserOptions::new()
///     .with_kind(DocumentKind::Keynote)
///     .with_decode_error_policy(DecodeErrorPolicy::Fail);
/// assert_eq!(options.kind, Some(DocumentKind::Keynote));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    /// Document kind to use instead of detecting it from the document name
    pub kind: Option<DocumentKind>,
    /// What a malformed message does to the parse; defaults to `Fail` for
    /// Generic and Pages documents and `Skip` for Keynote and Numbers
    pub decode_error_policy: Option<DecodeErrorPolicy>,
    /// Token polled once per record header
    pub cancellation: Option<CancellationToken>,
    /// Whether text no structural walk reached is emitted as unreferenced
    pub emit_unreferenced: Option<bool>,
}

impl ParserOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_kind(mut self, kind: DocumentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[inline]
    pub fn with_decode_error_policy(mut self, policy: DecodeErrorPolicy) -> Self {
        self.decode_error_policy = Some(policy);
        self
    }

    #[inline]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    #[inline]
    pub fn with_emit_unreferenced(mut self, emit: bool) -> Self {
        self.emit_unreferenced = Some(emit);
        self
    }
}

/// Parser that extracts text from Pages, Keynote and Numbers documents
#[derive(Debug, Clone, Default)]
pub struct ExtractTextParser {
    options: ParserOptions,
}

impl ExtractTextParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }
}

impl IwaParser for ExtractTextParser {
    type Context = DocumentContext;

    fn new_context(&self, document_name: Option<&str>) -> DocumentContext {
        DocumentContext::with_options(document_name, &self.options)
    }
}
