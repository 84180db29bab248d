//! Stored Objects
//!
//! Decoded messages kept for the finalization pass. [`StoredObject`] owns a
//! message; [`ObjectRef`] borrows one, possibly the supertype part embedded
//! in another message. Typed lookups go through [`ObjectKind`].

use crate::iwa::protobuf::{kn, tn, tsd, tst, tswp};

/// Document-wide object identifier
pub type ObjectId = u64;

/// Messages of a kind that can be looked up in the object store
pub trait ObjectKind: Sized {
    /// Type name used in log output
    const NAME: &'static str;

    /// Whether multi-object resolution to this kind expands group children
    const EXPANDS_GROUPS: bool = false;

    /// Borrow the message if `object` is exactly this kind
    fn narrow(object: ObjectRef<'_>) -> Option<&Self>;
}

macro_rules! object_kinds {
    ($($variant:ident($ty:ty) $(, expands = $expands:expr)?;)*) => {
        /// An owned message held by the object store
        #[derive(Debug, Clone, PartialEq)]
        pub enum StoredObject {
            $($variant($ty),)*
        }

        /// A borrowed message, or the embedded supertype of one
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum ObjectRef<'a> {
            $($variant(&'a $ty),)*
        }

        impl StoredObject {
            pub fn as_object_ref(&self) -> ObjectRef<'_> {
                match self {
                    $(StoredObject::$variant(message) => ObjectRef::$variant(message),)*
                }
            }

            pub fn type_name(&self) -> &'static str {
                self.as_object_ref().type_name()
            }
        }

        impl ObjectRef<'_> {
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(ObjectRef::$variant(_) => <$ty as ObjectKind>::NAME,)*
                }
            }
        }

        $(
            impl From<$ty> for StoredObject {
                fn from(message: $ty) -> Self {
                    StoredObject::$variant(message)
                }
            }

            impl ObjectKind for $ty {
                const NAME: &'static str = stringify!($variant);
                $(const EXPANDS_GROUPS: bool = $expands;)?

                fn narrow(object: ObjectRef<'_>) -> Option<&Self> {
                    match object {
                        ObjectRef::$variant(message) => Some(message),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }
        )*
    };
}

object_kinds! {
    KeynoteDocument(kn::DocumentArchive);
    Show(kn::ShowArchive);
    SlideNode(kn::SlideNodeArchive);
    Slide(kn::SlideArchive);
    Placeholder(kn::PlaceholderArchive);
    Note(kn::NoteArchive);
    ShapeInfo(tswp::ShapeInfoArchive), expands = true;
    Shape(tsd::ShapeArchive), expands = true;
    Drawable(tsd::DrawableArchive), expands = true;
    Group(tsd::GroupArchive);
    NumbersDocument(tn::DocumentArchive);
    TableDataList(tst::TableDataList);
}

impl<'a> ObjectRef<'a> {
    /// The embedded parent message, following
    /// `Placeholder -> ShapeInfo -> Shape -> Drawable`
    pub fn supertype(self) -> Option<ObjectRef<'a>> {
        match self {
            ObjectRef::Placeholder(placeholder) => Some(ObjectRef::ShapeInfo(&placeholder.super_)),
            ObjectRef::ShapeInfo(shape_info) => Some(ObjectRef::Shape(&shape_info.super_)),
            ObjectRef::Shape(shape) => Some(ObjectRef::Drawable(&shape.super_)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iwa::protobuf::tsp::Reference;

    fn placeholder() -> StoredObject {
        kn::PlaceholderArchive {
            super_: tswp::ShapeInfoArchive {
                contained_storage: Some(Reference { identifier: 9 }),
                ..Default::default()
            },
        }
        .into()
    }

    #[test]
    fn test_narrow_exact_kind_only() {
        let object = placeholder();
        assert!(kn::PlaceholderArchive::narrow(object.as_object_ref()).is_some());
        assert!(tswp::ShapeInfoArchive::narrow(object.as_object_ref()).is_none());
    }

    #[test]
    fn test_supertype_chain() {
        let object = placeholder();
        let chain: Vec<&str> = std::iter::successors(Some(object.as_object_ref()), |view| view.supertype())
            .map(|view| view.type_name())
            .collect();
        assert_eq!(chain, vec!["Placeholder", "ShapeInfo", "Shape", "Drawable"]);

        let shape_info = object.as_object_ref().supertype().and_then(tswp::ShapeInfoArchive::narrow);
        assert_eq!(shape_info.and_then(|s| s.contained_storage.as_ref()).map(|r| r.identifier), Some(9));
    }

    #[test]
    fn test_group_expansion_flags() {
        assert!(tswp::ShapeInfoArchive::EXPANDS_GROUPS);
        assert!(!kn::SlideArchive::EXPANDS_GROUPS);
        assert_eq!(StoredObject::from(tsd::GroupArchive::default()).type_name(), "Group");
    }
}
