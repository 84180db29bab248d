//! Protobuf Message Support for iWork IWA Files
//!
//! The subset of the iWork'13 message schema the text extractor reads,
//! declared with prost's derive macros and grouped by the package names
//! Apple uses (`TSP`, `TSWP`, `TSD`, `KN`, `TN`, `TST`). Fields the extractor
//! never looks at are left out; prost skips unknown fields while decoding.
//!
//! Subclassing in the schema is expressed by a required `super` field holding
//! the parent message, e.g. `KN.PlaceholderArchive.super` is a
//! `TSWP.ShapeInfoArchive`. See [`crate::iwa::object::ObjectRef::supertype`].

/// Persistence layer (archive headers and object references)
pub mod tsp {
    /// Header preceding a group of messages in a decompressed IWA stream
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ArchiveInfo {
        #[prost(uint64, optional, tag = "1")]
        pub identifier: ::core::option::Option<u64>,
        #[prost(message, repeated, tag = "2")]
        pub message_infos: ::prost::alloc::vec::Vec<MessageInfo>,
        #[prost(bool, optional, tag = "3")]
        pub should_merge: ::core::option::Option<bool>,
    }

    /// Type code and byte length of one message following an [`ArchiveInfo`]
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MessageInfo {
        #[prost(uint32, required, tag = "1")]
        pub r#type: u32,
        #[prost(uint32, repeated, tag = "2")]
        pub version: ::prost::alloc::vec::Vec<u32>,
        #[prost(uint32, required, tag = "3")]
        pub length: u32,
        #[prost(uint64, repeated, tag = "5")]
        pub object_references: ::prost::alloc::vec::Vec<u64>,
    }

    /// Pointer to another object by identifier
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Reference {
        #[prost(uint64, required, tag = "1")]
        pub identifier: u64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Point {
        #[prost(float, required, tag = "1")]
        pub x: f32,
        #[prost(float, required, tag = "2")]
        pub y: f32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Size {
        #[prost(float, required, tag = "1")]
        pub width: f32,
        #[prost(float, required, tag = "2")]
        pub height: f32,
    }
}

/// Word processing (text storages and smart fields)
pub mod tswp {
    use super::{tsd, tsp};

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StorageArchive {
        #[prost(message, optional, tag = "2")]
        pub style_sheet: ::core::option::Option<tsp::Reference>,
        #[prost(string, repeated, tag = "3")]
        pub text: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
        #[prost(bool, optional, tag = "4")]
        pub has_itext: ::core::option::Option<bool>,
        #[prost(bool, optional, tag = "10")]
        pub in_document: ::core::option::Option<bool>,
        #[prost(message, optional, tag = "11")]
        pub table_smartfield: ::core::option::Option<ObjectAttributeTable>,
    }

    /// Character-indexed table of object attributes
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ObjectAttributeTable {
        #[prost(message, repeated, tag = "1")]
        pub entries: ::prost::alloc::vec::Vec<object_attribute_table::ObjectAttribute>,
    }

    pub mod object_attribute_table {
        use super::tsp;

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct ObjectAttribute {
            #[prost(uint32, optional, tag = "1")]
            pub character_index: ::core::option::Option<u32>,
            #[prost(message, optional, tag = "2")]
            pub object: ::core::option::Option<tsp::Reference>,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SmartFieldArchive {
        #[prost(message, optional, tag = "1")]
        pub style: ::core::option::Option<tsp::Reference>,
    }

    /// Marker object for placeholder ("click to edit") text
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PlaceholderSmartFieldArchive {
        #[prost(message, required, tag = "1")]
        pub super_: SmartFieldArchive,
    }

    /// A shape with an attached text storage
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ShapeInfoArchive {
        #[prost(message, required, tag = "1")]
        pub super_: tsd::ShapeArchive,
        #[prost(message, optional, tag = "2")]
        pub contained_storage: ::core::option::Option<tsp::Reference>,
        #[prost(message, optional, tag = "3")]
        pub text_flow: ::core::option::Option<tsp::Reference>,
    }
}

/// Drawables (geometry, shapes and groups)
pub mod tsd {
    use super::tsp;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GeometryArchive {
        #[prost(message, optional, tag = "1")]
        pub position: ::core::option::Option<tsp::Point>,
        #[prost(message, optional, tag = "2")]
        pub size: ::core::option::Option<tsp::Size>,
        #[prost(uint32, optional, tag = "3")]
        pub flags: ::core::option::Option<u32>,
        #[prost(float, optional, tag = "4")]
        pub angle: ::core::option::Option<f32>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DrawableArchive {
        #[prost(message, optional, tag = "1")]
        pub geometry: ::core::option::Option<GeometryArchive>,
        #[prost(message, optional, tag = "2")]
        pub parent: ::core::option::Option<tsp::Reference>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ShapeArchive {
        #[prost(message, required, tag = "1")]
        pub super_: DrawableArchive,
        #[prost(message, optional, tag = "2")]
        pub style: ::core::option::Option<tsp::Reference>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GroupArchive {
        #[prost(message, required, tag = "1")]
        pub super_: DrawableArchive,
        #[prost(message, repeated, tag = "2")]
        pub children: ::prost::alloc::vec::Vec<tsp::Reference>,
    }
}

/// Keynote
pub mod kn {
    use super::{tsp, tswp};

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DocumentArchive {
        #[prost(message, optional, tag = "2")]
        pub show: ::core::option::Option<tsp::Reference>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ShowArchive {
        #[prost(message, required, tag = "1")]
        pub slide_tree: SlideTreeArchive,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SlideTreeArchive {
        #[prost(message, optional, tag = "1")]
        pub root_slide_node: ::core::option::Option<tsp::Reference>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SlideNodeArchive {
        #[prost(message, repeated, tag = "1")]
        pub children: ::prost::alloc::vec::Vec<tsp::Reference>,
        #[prost(message, optional, tag = "2")]
        pub slide: ::core::option::Option<tsp::Reference>,
        #[prost(bool, optional, tag = "4")]
        pub is_hidden: ::core::option::Option<bool>,
        #[prost(bool, optional, tag = "5")]
        pub is_collapsed: ::core::option::Option<bool>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SlideArchive {
        #[prost(message, optional, tag = "1")]
        pub style: ::core::option::Option<tsp::Reference>,
        #[prost(message, optional, tag = "5")]
        pub title_placeholder: ::core::option::Option<tsp::Reference>,
        #[prost(message, optional, tag = "6")]
        pub body_placeholder: ::core::option::Option<tsp::Reference>,
        #[prost(message, optional, tag = "7")]
        pub object_placeholder: ::core::option::Option<tsp::Reference>,
        #[prost(message, repeated, tag = "8")]
        pub owned_drawables: ::prost::alloc::vec::Vec<tsp::Reference>,
        #[prost(string, optional, tag = "11")]
        pub name: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(message, optional, tag = "27")]
        pub note: ::core::option::Option<tsp::Reference>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PlaceholderArchive {
        #[prost(message, required, tag = "1")]
        pub super_: tswp::ShapeInfoArchive,
    }

    /// Speaker notes of one slide
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct NoteArchive {
        #[prost(message, optional, tag = "1")]
        pub contained_storage: ::core::option::Option<tsp::Reference>,
    }
}

/// Numbers
pub mod tn {
    use super::tsp;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DocumentArchive {
        #[prost(message, repeated, tag = "1")]
        pub sheets: ::prost::alloc::vec::Vec<tsp::Reference>,
    }
}

/// Tables
pub mod tst {
    /// Keyed list backing a table's strings, formats and styles
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TableDataList {
        #[prost(enumeration = "table_data_list::ListType", required, tag = "1")]
        pub list_type: i32,
        #[prost(uint32, required, tag = "2")]
        pub next_list_id: u32,
        #[prost(message, repeated, tag = "3")]
        pub entries: ::prost::alloc::vec::Vec<table_data_list::ListEntry>,
    }

    pub mod table_data_list {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct ListEntry {
            #[prost(uint32, required, tag = "1")]
            pub key: u32,
            #[prost(uint32, required, tag = "2")]
            pub refcount: u32,
            #[prost(string, optional, tag = "3")]
            pub string: ::core::option::Option<::prost::alloc::string::String>,
        }

        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum ListType {
            String = 1,
            Format = 2,
            Formula = 3,
            Style = 4,
            FormulaError = 5,
            CustomFormat = 6,
            MultipleChoiceListFormat = 7,
            RichTextPayload = 8,
            ConditionalStyle = 9,
            CommentStorage = 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_supertype_fields_roundtrip_through_wire() {
        let placeholder = kn::PlaceholderArchive {
            super_: tswp::ShapeInfoArchive {
                contained_storage: Some(tsp::Reference { identifier: 42 }),
                ..Default::default()
            },
        };
        let bytes = placeholder.encode_to_vec();
        let decoded = kn::PlaceholderArchive::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.super_.contained_storage.map(|r| r.identifier), Some(42));
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        // MessageInfo with an extra field 9 (varint) between known fields
        let data = [0x08, 0x2A, 0x48, 0x07, 0x18, 0x0A];
        let info = tsp::MessageInfo::decode(&data[..]).unwrap();
        assert_eq!(info.r#type, 42);
        assert_eq!(info.length, 10);
    }

    #[test]
    fn test_list_type_from_wire_value() {
        let list = tst::TableDataList {
            list_type: tst::table_data_list::ListType::String as i32,
            ..Default::default()
        };
        assert_eq!(
            tst::table_data_list::ListType::try_from(list.list_type),
            Ok(tst::table_data_list::ListType::String)
        );
    }
}
