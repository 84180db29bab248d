//! Document Context
//!
//! Per-document parse state for text extraction: the object store, the
//! pending text blocks and the set of ignorable style objects. Message
//! handlers fill it while the index is streamed; [`DocumentContext::finalize`]
//! turns it into text callbacks once the whole index has been read.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::iwa::archive::{self, ArchiveInfo, MessageInfo};
use crate::iwa::bundle::IwaContext;
use crate::iwa::callback::{TextAttributes, TextTarget};
use crate::iwa::cancel::CancellationToken;
use crate::iwa::object::{ObjectId, ObjectKind, StoredObject};
use crate::iwa::parser::{DecodeErrorPolicy, ParserOptions};
use crate::iwa::protobuf::tsp::Reference;
use crate::iwa::protobuf::{tsd, tswp};
use crate::iwa::registry::MessageActions;
use crate::iwa::text::TextBlock;
use crate::iwa::{Error, Result, keynote, numbers};

/// `TSWP.StorageArchive`
pub const STORAGE_ARCHIVE: u32 = 2001;
/// `TSWP.PlaceholderSmartFieldArchive`
pub const PLACEHOLDER_SMART_FIELD: u32 = 2031;
/// `TSD.GroupArchive`
pub const GROUP_ARCHIVE: u32 = 3008;

/// Identifier of the document root object
pub const ROOT_OBJECT_ID: ObjectId = 1;

/// iWork application a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentKind {
    /// Unknown application; only the shared handlers run
    #[default]
    Generic,
    Pages,
    Keynote,
    Numbers,
}

impl DocumentKind {
    /// Detect the kind from a bundle or file name suffix
    pub fn from_document_name(name: &str) -> Self {
        let name = name.trim_end_matches('/').to_ascii_lowercase();
        if name.ends_with(".key") {
            DocumentKind::Keynote
        } else if name.ends_with(".numbers") {
            DocumentKind::Numbers
        } else if name.ends_with(".pages") {
            DocumentKind::Pages
        } else {
            DocumentKind::Generic
        }
    }

    /// Policy for undecodable messages when none is configured
    pub fn default_decode_error_policy(self) -> DecodeErrorPolicy {
        match self {
            DocumentKind::Keynote | DocumentKind::Numbers => DecodeErrorPolicy::Skip,
            DocumentKind::Generic | DocumentKind::Pages => DecodeErrorPolicy::Fail,
        }
    }

    /// Whether text no structural walk reached is emitted by default
    pub fn emits_unreferenced_text(self) -> bool {
        !matches!(self, DocumentKind::Keynote)
    }

    /// Whether typed lookups may fall back to embedded supertypes
    fn narrows_through_supertypes(self) -> bool {
        matches!(self, DocumentKind::Keynote)
    }
}

/// Handlers shared by every document kind
pub static COMMON_ACTIONS: Lazy<MessageActions<DocumentContext>> = Lazy::new(|| {
    let mut actions = MessageActions::new();
    actions.set_action(STORAGE_ARCHIVE, store_text);
    actions.set_action(
        PLACEHOLDER_SMART_FIELD,
        |_: tswp::PlaceholderSmartFieldArchive, archive, _, context: &mut DocumentContext, _| {
            context.add_ignorable_style(archive::object_id(archive));
            Ok(())
        },
    );
    actions.set_action(GROUP_ARCHIVE, store_object::<tsd::GroupArchive>);
    actions
});

/// Keep a decoded message in the object store under its record identifier
pub fn store_object<M: Into<StoredObject>>(
    message: M,
    archive: &ArchiveInfo,
    _info: &MessageInfo,
    context: &mut DocumentContext,
    _target: &mut TextTarget,
) -> Result<()> {
    context.store(archive::object_id(archive), message);
    Ok(())
}

fn store_text(
    storage: tswp::StorageArchive,
    archive: &ArchiveInfo,
    _info: &MessageInfo,
    context: &mut DocumentContext,
    _target: &mut TextTarget,
) -> Result<()> {
    if !storage.in_document.unwrap_or(false) || storage.text.is_empty() {
        return Ok(());
    }
    let id = archive::object_id(archive);
    if storage.text.len() > 1 {
        info!(id, runs = storage.text.len(), "storage has several text runs, keeping the first");
    }
    context.get_or_create_text_block(id).set_from_storage(&storage);
    Ok(())
}

/// Parse state of one document
#[derive(Debug)]
pub struct DocumentContext {
    kind: DocumentKind,
    document_name: Option<String>,
    current_file: Option<String>,
    objects: HashMap<ObjectId, StoredObject>,
    text_blocks: BTreeMap<ObjectId, TextBlock>,
    ignorable_styles: HashSet<ObjectId>,
    decode_error_policy: DecodeErrorPolicy,
    emit_unreferenced: bool,
    cancellation: CancellationToken,
}

impl DocumentContext {
    /// Context with the kind's default behavior
    pub fn new(document_name: Option<&str>, kind: DocumentKind) -> Self {
        Self {
            kind,
            document_name: document_name.map(str::to_string),
            current_file: None,
            objects: HashMap::new(),
            text_blocks: BTreeMap::new(),
            ignorable_styles: HashSet::new(),
            decode_error_policy: kind.default_decode_error_policy(),
            emit_unreferenced: kind.emits_unreferenced_text(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Context configured from parser options; options override defaults
    pub fn with_options(document_name: Option<&str>, options: &ParserOptions) -> Self {
        let kind = options
            .kind
            .or_else(|| document_name.map(DocumentKind::from_document_name))
            .unwrap_or_default();
        let mut context = Self::new(document_name, kind);
        if let Some(policy) = options.decode_error_policy {
            context.decode_error_policy = policy;
        }
        if let Some(emit) = options.emit_unreferenced {
            context.emit_unreferenced = emit;
        }
        if let Some(token) = &options.cancellation {
            context.cancellation = token.clone();
        }
        context
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document_name.as_deref()
    }

    /// The `.iwa` member currently being decoded
    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn decode_error_policy(&self) -> DecodeErrorPolicy {
        self.decode_error_policy
    }

    /// Store `object` under `id`, replacing any earlier object
    pub fn store(&mut self, id: ObjectId, object: impl Into<StoredObject>) {
        self.objects.insert(id, object.into());
    }

    /// The untyped object stored under `id`
    pub fn object(&self, id: ObjectId) -> Option<&StoredObject> {
        self.objects.get(&id)
    }

    /// Typed lookup.
    ///
    /// Returns `None` for unknown identifiers and for objects of an
    /// incompatible kind. Keynote documents also match through embedded
    /// supertypes, so a placeholder resolves as a shape info.
    pub fn get<T: ObjectKind>(&self, id: ObjectId) -> Option<&T> {
        let mut view = self.objects.get(&id)?.as_object_ref();
        loop {
            if let Some(object) = T::narrow(view) {
                return Some(object);
            }
            if !self.kind.narrows_through_supertypes() {
                return None;
            }
            view = view.supertype()?;
        }
    }

    pub fn get_ref<T: ObjectKind>(&self, reference: &Reference) -> Option<&T> {
        self.get(reference.identifier)
    }

    /// Resolve a list of references, dropping the unresolvable ones.
    ///
    /// For drawable kinds a reference to a group is replaced by its
    /// resolved children, recursively.
    pub fn resolve_many<T: ObjectKind>(&self, references: &[Reference]) -> Vec<&T> {
        let mut resolved = Vec::new();
        let mut groups = HashSet::new();
        self.resolve_into(references, &mut resolved, &mut groups);
        resolved
    }

    fn resolve_into<'a, T: ObjectKind>(
        &'a self,
        references: &[Reference],
        resolved: &mut Vec<&'a T>,
        groups: &mut HashSet<ObjectId>,
    ) {
        for reference in references {
            let id = reference.identifier;
            match self.get::<T>(id) {
                Some(object) => resolved.push(object),
                None if T::EXPANDS_GROUPS => {
                    if let Some(group) = self.get::<tsd::GroupArchive>(id)
                        && groups.insert(id)
                    {
                        self.resolve_into(&group.children, resolved, groups);
                    }
                },
                None => {},
            }
        }
    }

    pub fn get_or_create_text_block(&mut self, id: ObjectId) -> &mut TextBlock {
        self.text_blocks.entry(id).or_default()
    }

    pub fn text_block(&self, id: ObjectId) -> Option<&TextBlock> {
        self.text_blocks.get(&id)
    }

    pub fn add_ignorable_style(&mut self, id: ObjectId) {
        self.ignorable_styles.insert(id);
    }

    pub fn is_ignorable_style(&self, id: ObjectId) -> bool {
        self.ignorable_styles.contains(&id)
    }

    /// Emit the text block `storage` unless it is missing or already emitted
    pub fn emit_storage(
        &mut self,
        storage: ObjectId,
        attributes: TextAttributes,
        target: &mut TextTarget,
    ) {
        let block = self.text_blocks.get_mut(&storage);
        let Some(text) = block.and_then(TextBlock::take_for_emission) else {
            return;
        };
        target.on_text(text, attributes);
    }

    /// Run the end-of-index passes: placeholder redaction, the root walk of
    /// the document kind and the unreferenced text sweep
    pub fn finalize(&mut self, target: &mut TextTarget) {
        self.redact_placeholder_text();

        if self.objects.contains_key(&ROOT_OBJECT_ID) {
            self.process_root_object(target);
        } else {
            debug!(document = ?self.document_name(), "document has no root object");
        }

        if self.emit_unreferenced {
            self.emit_unreferenced_text(target);
        }
    }

    fn redact_placeholder_text(&mut self) {
        let ignorable = &self.ignorable_styles;
        for block in self.text_blocks.values_mut() {
            block.redact(|id| ignorable.contains(&id));
        }
    }

    fn process_root_object(&mut self, target: &mut TextTarget) {
        match self.kind {
            DocumentKind::Keynote => keynote::process_root(self, target),
            DocumentKind::Numbers | DocumentKind::Pages | DocumentKind::Generic => {},
        }
    }

    fn emit_unreferenced_text(&mut self, target: &mut TextTarget) {
        for block in self.text_blocks.values_mut() {
            if let Some(text) = block.take_for_emission() {
                target.on_text(text, TextAttributes::UNREFERENCED);
            }
        }
    }
}

impl IwaContext for DocumentContext {
    type Target = TextTarget;

    fn message_actions(&self) -> &'static MessageActions<Self> {
        match self.kind {
            DocumentKind::Keynote => Lazy::force(&keynote::KEYNOTE_ACTIONS),
            DocumentKind::Numbers => Lazy::force(&numbers::NUMBERS_ACTIONS),
            DocumentKind::Generic | DocumentKind::Pages => Lazy::force(&COMMON_ACTIONS),
        }
    }

    fn accept_iwa_file(&self, name: &str) -> bool {
        match self.kind {
            DocumentKind::Keynote => keynote::accept_iwa_file(name),
            _ => true,
        }
    }

    fn cancellation(&self) -> Option<&CancellationToken> {
        Some(&self.cancellation)
    }

    fn on_end_index(&mut self, target: &mut TextTarget) -> Result<()> {
        self.finalize(target);
        target.on_end_index();
        Ok(())
    }

    fn on_begin_iwa(&mut self, name: &str, target: &mut TextTarget) {
        self.current_file = Some(name.to_string());
        target.on_begin_iwa(name);
    }

    fn on_end_iwa(&mut self, name: &str, target: &mut TextTarget) {
        self.current_file = None;
        target.on_end_iwa(name);
    }

    fn handle_decode_error(
        &mut self,
        archive: &ArchiveInfo,
        info: &MessageInfo,
        error: prost::DecodeError,
    ) -> Result<()> {
        match self.decode_error_policy {
            DecodeErrorPolicy::Fail => Err(Error::Decode(error)),
            DecodeErrorPolicy::Skip => {
                debug!(
                    file = ?self.current_file(),
                    id = archive::object_id(archive),
                    message_type = info.r#type,
                    %error,
                    "skipping undecodable message"
                );
                Ok(())
            },
        }
    }
}
