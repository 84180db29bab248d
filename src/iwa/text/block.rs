//! Pending text of one storage object

use crate::iwa::object::ObjectId;
use crate::iwa::protobuf::tswp::StorageArchive;
use crate::iwa::text::redact::redact_placeholders;

/// Character position at which an attribute object starts to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMarker {
    /// Offset in UTF-16 code units
    pub character_index: u32,
    /// Attribute object taking effect; `None` clears the previous one
    pub object: Option<ObjectId>,
}

/// Text of a storage awaiting emission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub markers: Option<Vec<TextMarker>>,
    done: bool,
}

impl TextBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content with the first text run and the smart field
    /// markers of `storage`. Blocks already emitted are left untouched.
    pub fn set_from_storage(&mut self, storage: &StorageArchive) {
        if self.done {
            return;
        }
        self.text = storage.text.first().cloned().unwrap_or_default();
        self.markers = storage.table_smartfield.as_ref().map(|table| {
            table
                .entries
                .iter()
                .filter_map(|entry| {
                    Some(TextMarker {
                        character_index: entry.character_index?,
                        object: entry.object.as_ref().map(|object| object.identifier),
                    })
                })
                .collect()
        });
    }

    /// Whether the text has been emitted
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Mark the block emitted and hand out its text
    pub fn take_for_emission(&mut self) -> Option<&str> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(&self.text)
    }

    /// Mask every span introduced by an ignorable marker
    pub fn redact(&mut self, is_ignorable: impl Fn(ObjectId) -> bool) {
        if self.done {
            return;
        }
        let Some(markers) = self.markers.as_mut() else {
            return;
        };
        if let Some(redacted) = redact_placeholders(&self.text, markers, is_ignorable) {
            self.text = redacted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iwa::protobuf::tsp::Reference;
    use crate::iwa::protobuf::tswp::ObjectAttributeTable;
    use crate::iwa::protobuf::tswp::object_attribute_table::ObjectAttribute;

    fn storage(text: &str, entries: Vec<ObjectAttribute>) -> StorageArchive {
        StorageArchive {
            text: vec![text.to_string()],
            in_document: Some(true),
            table_smartfield: Some(ObjectAttributeTable { entries }),
            ..Default::default()
        }
    }

    #[test]
    fn test_markers_without_index_are_dropped() {
        let mut block = TextBlock::new();
        block.set_from_storage(&storage(
            "Hello",
            vec![
                ObjectAttribute {
                    character_index: Some(1),
                    object: Some(Reference { identifier: 3 }),
                },
                ObjectAttribute {
                    character_index: None,
                    object: Some(Reference { identifier: 4 }),
                },
            ],
        ));
        assert_eq!(block.text, "Hello");
        assert_eq!(
            block.markers,
            Some(vec![TextMarker {
                character_index: 1,
                object: Some(3)
            }])
        );
    }

    #[test]
    fn test_emitted_block_is_frozen() {
        let mut block = TextBlock::new();
        block.set_from_storage(&storage("First", Vec::new()));
        assert_eq!(block.take_for_emission(), Some("First"));
        assert!(block.is_done());
        assert_eq!(block.take_for_emission(), None);

        block.set_from_storage(&storage("Second", Vec::new()));
        assert_eq!(block.text, "First");
    }
}
