//! Keynote Presentation Support
//!
//! Keynote text lives in shapes owned by slides. Slides hang off a tree of
//! slide nodes rooted in the show, so text is emitted by walking that tree
//! once the whole index is known:
//!
//! ```text
//! Document(1) -> Show -> SlideTree -> SlideNode* -> Slide
//!                                                    |- title / object placeholder
//!                                                    |- owned drawables (groups expanded)
//!                                                    '- note -> storage (notes scope)
//! ```
//!
//! Master slide archives are skipped entirely; their placeholder text would
//! otherwise repeat on every slide.

pub mod slides;

use once_cell::sync::Lazy;
use tracing::info;

use crate::iwa::callback::TextTarget;
use crate::iwa::context::{COMMON_ACTIONS, DocumentContext, ROOT_OBJECT_ID, store_object};
use crate::iwa::protobuf::{kn, tswp};
use crate::iwa::registry::MessageActions;

pub use slides::{collect_slide_text, visit_slide_nodes};

pub const DOCUMENT_ARCHIVE: u32 = 1;
pub const SHOW_ARCHIVE: u32 = 2;
pub const SLIDE_NODE_ARCHIVE: u32 = 4;
pub const SLIDE_ARCHIVE: u32 = 5;
pub const TEMPLATE_SLIDE_ARCHIVE: u32 = 6;
pub const PLACEHOLDER_ARCHIVE: u32 = 7;
pub const NOTE_ARCHIVE: u32 = 15;
pub const SHAPE_INFO_ARCHIVE: u32 = 2011;

/// Handlers for Keynote documents
pub static KEYNOTE_ACTIONS: Lazy<MessageActions<DocumentContext>> = Lazy::new(|| {
    let mut actions = MessageActions::extend_from(&COMMON_ACTIONS);
    actions.set_action(DOCUMENT_ARCHIVE, store_object::<kn::DocumentArchive>);
    actions.set_action(SHOW_ARCHIVE, store_object::<kn::ShowArchive>);
    actions.set_action(SLIDE_NODE_ARCHIVE, store_object::<kn::SlideNodeArchive>);
    actions.set_actions(&[SLIDE_ARCHIVE, TEMPLATE_SLIDE_ARCHIVE], store_object::<kn::SlideArchive>);
    actions.set_action(PLACEHOLDER_ARCHIVE, store_object::<kn::PlaceholderArchive>);
    actions.set_action(NOTE_ARCHIVE, store_object::<kn::NoteArchive>);
    actions.set_action(SHAPE_INFO_ARCHIVE, store_object::<tswp::ShapeInfoArchive>);
    actions
});

/// Keynote decodes every `.iwa` member except master slides
pub fn accept_iwa_file(name: &str) -> bool {
    !name.contains("/MasterSlide")
}

/// Emit slide and note text in slide tree order
pub fn process_root(context: &mut DocumentContext, target: &mut TextTarget) {
    let Some(document) = context.get::<kn::DocumentArchive>(ROOT_OBJECT_ID) else {
        info!(
            root = ?context.object(ROOT_OBJECT_ID).map(|object| object.type_name()),
            "unsupported root object"
        );
        return;
    };

    let show = document.show.as_ref();
    let Some(show) = show.and_then(|show| context.get_ref::<kn::ShowArchive>(show)) else {
        info!("document has no show");
        return;
    };
    let Some(root_node) = show.slide_tree.root_slide_node.as_ref() else {
        info!("slide tree has no root node");
        return;
    };

    let mut plan = Vec::new();
    for node in visit_slide_nodes(context, root_node.identifier) {
        if let Some(slide) = context
            .get::<kn::SlideNodeArchive>(node)
            .and_then(|node| node.slide.as_ref())
            .and_then(|slide| context.get_ref::<kn::SlideArchive>(slide))
        {
            collect_slide_text(context, slide, &mut plan);
        }
    }

    for (storage, attributes) in plan {
        context.emit_storage(storage, attributes, target);
    }
}

