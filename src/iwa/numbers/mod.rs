//! Numbers Spreadsheet Support
//!
//! Cell strings of a Numbers table are not stored in the cells themselves
//! but in a shared string list (`TST.TableDataList` of type `STRING`).
//! Each list is emitted as soon as it is decoded, entries in ascending key
//! order; all other text falls through to the unreferenced sweep.

use once_cell::sync::Lazy;
use tracing::debug;

use crate::iwa::archive::{self, ArchiveInfo, MessageInfo};
use crate::iwa::callback::{TextAttributes, TextTarget};
use crate::iwa::context::{COMMON_ACTIONS, DocumentContext, store_object};
use crate::iwa::protobuf::tn;
use crate::iwa::protobuf::tst::TableDataList;
use crate::iwa::protobuf::tst::table_data_list::{ListEntry, ListType};
use crate::iwa::registry::MessageActions;
use crate::iwa::Result;

pub const DOCUMENT_ARCHIVE: u32 = 1;
pub const TABLE_DATA_LIST: u32 = 6005;
pub const TABLE_DATA_LIST_SEGMENT: u32 = 6201;

/// Handlers for Numbers documents
pub static NUMBERS_ACTIONS: Lazy<MessageActions<DocumentContext>> = Lazy::new(|| {
    let mut actions = MessageActions::extend_from(&COMMON_ACTIONS);
    actions.set_action(DOCUMENT_ARCHIVE, store_object::<tn::DocumentArchive>);
    actions.set_actions(&[TABLE_DATA_LIST, TABLE_DATA_LIST_SEGMENT], table_data_list);
    actions
});

fn table_data_list(
    list: TableDataList,
    archive: &ArchiveInfo,
    _info: &MessageInfo,
    context: &mut DocumentContext,
    target: &mut TextTarget,
) -> Result<()> {
    if matches!(ListType::try_from(list.list_type), Ok(ListType::String)) {
        let strings = sorted_strings(&list.entries);
        debug!(id = archive::object_id(archive), count = strings.len(), "emitting table strings");
        for text in strings {
            target.on_text(text, TextAttributes::DOCUMENT);
        }
    }
    context.store(archive::object_id(archive), list);
    Ok(())
}

/// Strings of `entries` in ascending key order; equal keys keep list order.
/// An entry without a string yields `""`.
pub fn sorted_strings(entries: &[ListEntry]) -> Vec<&str> {
    let mut entries: Vec<&ListEntry> = entries.iter().collect();
    entries.sort_by_key(|entry| entry.key);
    entries
        .into_iter()
        .map(|entry| entry.string.as_deref().unwrap_or_default())
        .collect()
}
