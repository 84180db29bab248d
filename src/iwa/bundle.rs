//! iWork Bundle Walker
//!
//! iWork'13 documents come in three shapes:
//! - a bundle directory containing `Index.zip`
//! - a single zip file containing `<document>/Index.zip`
//! - a single zip file with the index members flattened under `Index/`
//!
//! The walker locates the index in each shape, streams every member
//! through the IWA decode loop and brackets the work with callbacks. Files
//! on disk are opened through the zip central directory; any other `Read`
//! is walked as a forward-only stream of local headers.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use tracing::{debug, trace};
use zip::ZipArchive;
use zip::read::read_zipfile_from_stream;

use crate::iwa::archive::{self, ArchiveInfo, MessageInfo};
use crate::iwa::budget::BudgetedReader;
use crate::iwa::callback::ParserCallback;
use crate::iwa::cancel::CancellationToken;
use crate::iwa::registry::MessageActions;
use crate::iwa::snappy::SnappyStream;
use crate::iwa::{Error, Result};

/// Name of the nested index archive
pub const INDEX_ZIP: &str = "Index.zip";

/// Prefix of flattened index members
pub const FLAT_INDEX_PREFIX: &str = "Index/";

/// Parse state for one index archive.
///
/// The lifecycle hooks default to forwarding to the target; contexts
/// override them to track the current member or run a finalization pass.
pub trait IwaContext: Sized + 'static {
    /// Callback type the context reports to
    type Target: ParserCallback + ?Sized;

    /// Actions applied to the messages of this context
    fn message_actions(&self) -> &'static MessageActions<Self>;

    /// Whether an `.iwa` member should be decoded; rejected members are
    /// reported through `on_skip`
    fn accept_iwa_file(&self, _name: &str) -> bool {
        true
    }

    fn cancellation(&self) -> Option<&CancellationToken> {
        None
    }

    fn on_begin_index(&mut self, target: &mut Self::Target) {
        target.on_begin_index();
    }

    /// Called once after every member of the index was consumed
    fn on_end_index(&mut self, target: &mut Self::Target) -> Result<()> {
        target.on_end_index();
        Ok(())
    }

    /// Called instead of [`IwaContext::on_end_index`] when the index failed
    fn on_abort_index(&mut self, target: &mut Self::Target) {
        target.on_end_index();
    }

    fn on_begin_iwa(&mut self, name: &str, target: &mut Self::Target) {
        target.on_begin_iwa(name);
    }

    fn on_end_iwa(&mut self, name: &str, target: &mut Self::Target) {
        target.on_end_iwa(name);
    }

    fn on_skip(&mut self, name: &str, data: &mut dyn Read, target: &mut Self::Target) {
        target.on_skip(name, data);
    }

    /// Decide what a malformed message does to the parse. Returning `Ok`
    /// drops the message and continues with the next one.
    fn handle_decode_error(
        &mut self,
        _archive: &ArchiveInfo,
        _info: &MessageInfo,
        error: prost::DecodeError,
    ) -> Result<()> {
        Err(Error::Decode(error))
    }
}

/// Entry point for parsing iWork documents into an [`IwaContext`]
pub trait IwaParser {
    type Context: IwaContext;

    /// Create the context for one document. `document_name` is the bundle or
    /// file name when known and drives document kind detection.
    fn new_context(&self, document_name: Option<&str>) -> Self::Context;

    /// Parse a bundle directory or a single-file document.
    ///
    /// Zip files on disk are read through their central directory, so
    /// entries whose sizes live in a trailing data descriptor are supported.
    fn parse_path<P: AsRef<Path>>(
        &self,
        path: P,
        target: &mut <Self::Context as IwaContext>::Target,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let path = path.as_ref();
        target.on_begin_document();
        let result = if path.is_dir() {
            walk_directory(self, path, target)
        } else {
            let name = path.file_name().and_then(|name| name.to_str());
            open_zip(path).and_then(|mut archive| walk_document(self, &mut archive, name, target))
        };
        target.on_end_document();
        result
    }

    /// Parse a single-file document from a stream.
    ///
    /// Members are read from their local headers only. Entries that defer
    /// their sizes to a data descriptor (general purpose flag bit 3) cannot
    /// be read this way and fail with [`Error::Zip`]; use
    /// [`IwaParser::parse_path`] for such files.
    fn parse_reader<R: Read>(
        &self,
        reader: R,
        target: &mut <Self::Context as IwaContext>::Target,
    ) -> Result<()>
    where
        Self: Sized,
    {
        target.on_begin_document();
        let result = walk_document(self, &mut StreamMembers(reader), None, target);
        target.on_end_document();
        result
    }
}

fn open_zip(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    Ok(ZipArchive::new(BufReader::new(File::open(path)?))?)
}

fn walk_directory<P: IwaParser>(
    parser: &P,
    dir: &Path,
    target: &mut <P::Context as IwaContext>::Target,
) -> Result<()> {
    let name = dir.file_name().and_then(|name| name.to_str());
    let mut context = parser.new_context(name);

    let index = dir.join(INDEX_ZIP);
    if !index.is_file() {
        return Err(Error::NotFound(format!("Could not find {}", index.display())));
    }
    debug!(path = %index.display(), "parsing bundle index");
    parse_index_archive(&mut open_zip(&index)?, &mut context, target)
}

/// If `name` is `<document>/Index.zip`, return `<document>`
fn nested_index_document(name: &str) -> Option<&str> {
    let document = name.strip_suffix(INDEX_ZIP)?.strip_suffix('/')?;
    (!document.is_empty() && !document.contains('/')).then_some(document)
}

/// Visitor over zip members; returns `false` to stop the walk
type MemberVisitor<'a> = dyn FnMut(&str, &mut dyn Read) -> Result<bool> + 'a;

/// Non-directory members of a zip archive, visited in archive order
trait ZipMembers {
    fn visit(&mut self, visitor: &mut MemberVisitor<'_>) -> Result<()>;

    /// Parse an `Index.zip` found among these members
    fn parse_nested<C: IwaContext>(
        entry: &mut dyn Read,
        context: &mut C,
        target: &mut C::Target,
    ) -> Result<()>;
}

/// Members read one local header at a time from a forward-only stream
struct StreamMembers<R>(R);

impl<R: Read> ZipMembers for StreamMembers<R> {
    fn visit(&mut self, visitor: &mut MemberVisitor<'_>) -> Result<()> {
        while let Some(mut entry) = read_zipfile_from_stream(&mut self.0)? {
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if !visitor(&name, &mut entry)? {
                break;
            }
        }
        Ok(())
    }

    fn parse_nested<C: IwaContext>(
        entry: &mut dyn Read,
        context: &mut C,
        target: &mut C::Target,
    ) -> Result<()> {
        parse_index_members(&mut StreamMembers(entry), context, target)
    }
}

impl<R: Read + Seek> ZipMembers for ZipArchive<R> {
    fn visit(&mut self, visitor: &mut MemberVisitor<'_>) -> Result<()> {
        for index in 0..self.len() {
            let mut entry = self.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if !visitor(&name, &mut entry)? {
                break;
            }
        }
        Ok(())
    }

    /// The nested archive is buffered so its central directory can be read
    fn parse_nested<C: IwaContext>(
        entry: &mut dyn Read,
        context: &mut C,
        target: &mut C::Target,
    ) -> Result<()> {
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        parse_index_archive(&mut ZipArchive::new(Cursor::new(data))?, context, target)
    }
}

fn walk_document<P: IwaParser, M: ZipMembers>(
    parser: &P,
    members: &mut M,
    fallback_name: Option<&str>,
    target: &mut <P::Context as IwaContext>::Target,
) -> Result<()> {
    let mut flat: Option<P::Context> = None;
    let outcome = scan_document(parser, members, fallback_name, &mut flat, target);

    match flat {
        Some(mut context) => finish_index(&mut context, outcome, target),
        None => match outcome? {
            FoundIndex::Nested => Ok(()),
            FoundIndex::Flat(_) | FoundIndex::None => Err(Error::NotFound(
                "Could not find Index.zip or Index/ entries".to_string(),
            )),
        },
    }
}

enum FoundIndex {
    None,
    Nested,
    /// Flattened layout; carries whether any `.iwa` member was seen
    Flat(bool),
}

fn scan_document<P: IwaParser, M: ZipMembers>(
    parser: &P,
    members: &mut M,
    fallback_name: Option<&str>,
    flat: &mut Option<P::Context>,
    target: &mut <P::Context as IwaContext>::Target,
) -> Result<FoundIndex> {
    let mut found = FoundIndex::None;

    members.visit(&mut |name: &str, entry: &mut dyn Read| -> Result<bool> {
        if flat.is_none()
            && let Some(document) = nested_index_document(name)
        {
            debug!(document, "parsing nested index");
            let mut context = parser.new_context(Some(document));
            M::parse_nested(entry, &mut context, target)?;
            found = FoundIndex::Nested;
            return Ok(false);
        }

        if name.starts_with(FLAT_INDEX_PREFIX) {
            if flat.is_none() {
                debug!("parsing flattened index");
                let mut context = parser.new_context(fallback_name);
                context.on_begin_index(target);
                *flat = Some(context);
            }
            if let Some(context) = flat.as_mut() {
                let is_iwa = parse_index_entry(entry, name, context, target)?;
                let seen = matches!(found, FoundIndex::Flat(true));
                found = FoundIndex::Flat(seen || is_iwa);
            }
        } else {
            trace!(name, "ignoring document member");
        }
        Ok(true)
    })?;

    Ok(found)
}

/// Parse an index archive streamed from `reader` into `context`
pub fn parse_index_zip<C: IwaContext, R: Read>(
    reader: R,
    context: &mut C,
    target: &mut C::Target,
) -> Result<()> {
    parse_index_members(&mut StreamMembers(reader), context, target)
}

/// Parse an index archive opened through its central directory
pub fn parse_index_archive<C: IwaContext, R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    context: &mut C,
    target: &mut C::Target,
) -> Result<()> {
    parse_index_members(archive, context, target)
}

fn parse_index_members<C: IwaContext, M: ZipMembers>(
    members: &mut M,
    context: &mut C,
    target: &mut C::Target,
) -> Result<()> {
    context.on_begin_index(target);
    let outcome = scan_index(members, context, target);
    finish_index(context, outcome, target)
}

fn scan_index<C: IwaContext, M: ZipMembers>(
    members: &mut M,
    context: &mut C,
    target: &mut C::Target,
) -> Result<FoundIndex> {
    let mut found_iwa = false;
    members.visit(&mut |name: &str, entry: &mut dyn Read| -> Result<bool> {
        found_iwa |= parse_index_entry(entry, name, context, target)?;
        Ok(true)
    })?;
    Ok(FoundIndex::Flat(found_iwa))
}

fn finish_index<C: IwaContext>(
    context: &mut C,
    outcome: Result<FoundIndex>,
    target: &mut C::Target,
) -> Result<()> {
    let outcome = outcome.and_then(|found| match found {
        FoundIndex::Flat(true) | FoundIndex::Nested => Ok(()),
        FoundIndex::Flat(false) | FoundIndex::None => {
            Err(Error::NotFound("Index does not contain any .iwa files".to_string()))
        },
    });

    match outcome {
        Ok(()) => context.on_end_index(target),
        Err(err) => {
            context.on_abort_index(target);
            Err(err)
        },
    }
}

/// Handle one index member; returns whether it was an `.iwa` file
fn parse_index_entry<C: IwaContext>(
    reader: &mut dyn Read,
    name: &str,
    context: &mut C,
    target: &mut C::Target,
) -> Result<bool> {
    if !name.ends_with(".iwa") {
        context.on_skip(name, reader, target);
        return Ok(false);
    }
    if !context.accept_iwa_file(name) {
        debug!(name, "skipping rejected IWA file");
        context.on_skip(name, reader, target);
        return Ok(true);
    }

    context.on_begin_iwa(name, target);
    let result = parse_iwa(reader, name, context, target);
    context.on_end_iwa(name, target);
    result.map(|()| true)
}

/// Decode one `.iwa` member and dispatch its messages
pub fn parse_iwa<C: IwaContext, R: Read>(
    reader: R,
    name: &str,
    context: &mut C,
    target: &mut C::Target,
) -> Result<()> {
    let actions = context.message_actions();
    let mut stream = BudgetedReader::new(SnappyStream::new(reader));
    let mut records = 0usize;

    loop {
        if context.cancellation().is_some_and(CancellationToken::is_cancelled) {
            debug!(name, records, "parse cancelled");
            break;
        }
        let Some(archive) = archive::read_archive_info(stream.get_mut())? else {
            break;
        };
        records += 1;

        for info in &archive.message_infos {
            stream.set_budget(u64::from(info.length));
            let result = match actions.on_message(&mut stream, &archive, info, context, target) {
                Err(Error::Decode(err)) => context.handle_decode_error(&archive, info, err),
                other => other,
            };
            let realigned = stream.skip_remaining();
            result?;
            realigned?;
        }
    }

    trace!(name, records, "finished IWA file");
    Ok(())
}
