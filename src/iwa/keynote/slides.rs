//! Slide Tree Walk
//!
//! Slide nodes are visited breadth first, one level at a time. A node seen
//! before is logged and skipped, so malformed trees with cycles terminate.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::info;

use crate::iwa::callback::TextAttributes;
use crate::iwa::context::DocumentContext;
use crate::iwa::object::ObjectId;
use crate::iwa::protobuf::{kn, tswp};

/// Slide node identifiers in visiting order, starting at `root`
pub fn visit_slide_nodes(context: &DocumentContext, root: ObjectId) -> Vec<ObjectId> {
    let mut visited = Vec::new();
    let mut seen = HashSet::new();
    let mut level = vec![root];
    let mut next_level = Vec::new();

    while !level.is_empty() {
        for &id in &level {
            if !seen.insert(id) {
                info!(id, "circular slide node reference");
                continue;
            }
            let Some(node) = context.get::<kn::SlideNodeArchive>(id) else {
                continue;
            };
            visited.push(id);
            next_level.extend(
                node.children
                    .iter()
                    .map(|child| child.identifier)
                    .filter(|&child| context.get::<kn::SlideNodeArchive>(child).is_some()),
            );
        }
        level.clear();
        std::mem::swap(&mut level, &mut next_level);
    }

    visited
}

/// Append the storages of one slide to `plan`: title and object
/// placeholders plus owned drawables in reading order, then the notes.
/// The body placeholder only holds template text and is left out.
pub fn collect_slide_text(
    context: &DocumentContext,
    slide: &kn::SlideArchive,
    plan: &mut Vec<(ObjectId, TextAttributes)>,
) {
    let placeholders = [&slide.title_placeholder, &slide.object_placeholder];
    let mut shapes: Vec<&tswp::ShapeInfoArchive> = placeholders
        .into_iter()
        .flatten()
        .filter_map(|placeholder| context.get_ref::<tswp::ShapeInfoArchive>(placeholder))
        .collect();
    shapes.extend(context.resolve_many::<tswp::ShapeInfoArchive>(&slide.owned_drawables));

    shapes.sort_by(|a, b| compare_reading_order(a, b));
    plan.extend(
        shapes
            .iter()
            .filter_map(|shape| shape.contained_storage.as_ref())
            .map(|storage| (storage.identifier, TextAttributes::DOCUMENT)),
    );

    if let Some(storage) = slide
        .note
        .as_ref()
        .and_then(|note| context.get_ref::<kn::NoteArchive>(note))
        .and_then(|note| note.contained_storage.as_ref())
    {
        plan.push((storage.identifier, TextAttributes::NOTES));
    }
}

/// Top-left position of a shape; shapes without geometry sort last
fn position(shape: &tswp::ShapeInfoArchive) -> (f32, f32) {
    shape
        .super_
        .super_
        .geometry
        .as_ref()
        .and_then(|geometry| geometry.position.as_ref())
        .map_or((f32::INFINITY, f32::INFINITY), |point| (point.y, point.x))
}

/// Top to bottom, then left to right
fn compare_reading_order(a: &tswp::ShapeInfoArchive, b: &tswp::ShapeInfoArchive) -> Ordering {
    let (ay, ax) = position(a);
    let (by, bx) = position(b);
    ay.total_cmp(&by).then(ax.total_cmp(&bx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iwa::callback::{Scope, TextCollector};
    use crate::iwa::context::{DocumentKind, ROOT_OBJECT_ID};
    use crate::iwa::keynote::process_root;
    use crate::iwa::protobuf::tsd;
    use crate::iwa::protobuf::tsp::{Point, Reference};

    fn reference(id: ObjectId) -> Reference {
        Reference { identifier: id }
    }

    fn node(children: &[ObjectId], slide: Option<ObjectId>) -> kn::SlideNodeArchive {
        kn::SlideNodeArchive {
            children: children.iter().copied().map(reference).collect(),
            slide: slide.map(reference),
            ..Default::default()
        }
    }

    fn shape_at(storage: ObjectId, x: f32, y: f32) -> tswp::ShapeInfoArchive {
        let mut shape = tswp::ShapeInfoArchive {
            contained_storage: Some(reference(storage)),
            ..Default::default()
        };
        shape.super_.super_.geometry = Some(tsd::GeometryArchive {
            position: Some(Point { x, y }),
            ..Default::default()
        });
        shape
    }

    fn text(context: &mut DocumentContext, storage: ObjectId, text: &str) {
        context.get_or_create_text_block(storage).text = text.to_string();
    }

    #[test]
    fn test_cyclic_tree_terminates() {
        let mut context = DocumentContext::new(None, DocumentKind::Keynote);
        context.store(10, node(&[11, 12], None));
        context.store(11, node(&[10], None));
        context.store(12, node(&[11, 13], None));
        context.store(13, node(&[10, 13], None));

        assert_eq!(visit_slide_nodes(&context, 10), vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_unknown_children_are_dropped() {
        let mut context = DocumentContext::new(None, DocumentKind::Keynote);
        context.store(10, node(&[99, 11], None));
        context.store(11, node(&[], None));
        assert_eq!(visit_slide_nodes(&context, 10), vec![10, 11]);
        assert!(visit_slide_nodes(&context, 404).is_empty());
    }

    #[test]
    fn test_slide_text_order() {
        let mut context = DocumentContext::new(None, DocumentKind::Keynote);
        context.store(20, kn::PlaceholderArchive { super_: shape_at(200, 0.0, 10.0) });
        context.store(21, kn::PlaceholderArchive { super_: shape_at(201, 0.0, 50.0) });
        context.store(22, shape_at(202, 300.0, 100.0));
        context.store(23, shape_at(203, 10.0, 100.0));
        context.store(
            24,
            tsd::GroupArchive {
                children: vec![reference(25)],
                ..Default::default()
            },
        );
        context.store(25, shape_at(205, 0.0, 5.0));
        context.store(
            26,
            kn::NoteArchive {
                contained_storage: Some(reference(206)),
            },
        );

        let slide = kn::SlideArchive {
            title_placeholder: Some(reference(20)),
            body_placeholder: Some(reference(21)),
            owned_drawables: vec![reference(22), reference(23), reference(24)],
            note: Some(reference(26)),
            ..Default::default()
        };

        let mut plan = Vec::new();
        collect_slide_text(&context, &slide, &mut plan);
        assert_eq!(
            plan,
            vec![
                (205, TextAttributes::DOCUMENT),
                (200, TextAttributes::DOCUMENT),
                (203, TextAttributes::DOCUMENT),
                (202, TextAttributes::DOCUMENT),
                (206, TextAttributes::NOTES),
            ]
        );
    }

    #[test]
    fn test_shapes_without_geometry_sort_last() {
        let mut context = DocumentContext::new(None, DocumentKind::Keynote);
        context.store(
            30,
            tswp::ShapeInfoArchive {
                contained_storage: Some(reference(300)),
                ..Default::default()
            },
        );
        context.store(31, shape_at(301, 40.0, 20.0));
        context.store(32, shape_at(302, 40.0, 20.0));
        context.store(33, shape_at(303, 0.0, 80.0));

        let slide = kn::SlideArchive {
            owned_drawables: vec![reference(30), reference(31), reference(32), reference(33)],
            ..Default::default()
        };

        let mut plan = Vec::new();
        collect_slide_text(&context, &slide, &mut plan);
        let order: Vec<ObjectId> = plan.iter().map(|(storage, _)| *storage).collect();
        assert_eq!(order, vec![301, 302, 303, 300]);
    }

    #[test]
    fn test_process_root_emits_each_storage_once() {
        let mut context = DocumentContext::new(Some("Deck.key"), DocumentKind::Keynote);
        context.store(
            ROOT_OBJECT_ID,
            kn::DocumentArchive {
                show: Some(reference(2)),
            },
        );
        context.store(
            2,
            kn::ShowArchive {
                slide_tree: kn::SlideTreeArchive {
                    root_slide_node: Some(reference(3)),
                },
            },
        );
        context.store(3, node(&[4], None));
        context.store(4, node(&[3], Some(5)));
        context.store(
            5,
            kn::SlideArchive {
                owned_drawables: vec![reference(6), reference(6)],
                note: Some(reference(7)),
                ..Default::default()
            },
        );
        context.store(6, shape_at(60, 0.0, 0.0));
        context.store(
            7,
            kn::NoteArchive {
                contained_storage: Some(reference(70)),
            },
        );
        text(&mut context, 60, "Welcome");
        text(&mut context, 70, "Say hello");
        text(&mut context, 80, "Never placed");

        let mut collector = TextCollector::new();
        context.finalize(&mut collector);

        assert_eq!(collector.texts(Scope::Document), vec!["Welcome"]);
        assert_eq!(collector.texts(Scope::Notes), vec!["Say hello"]);
        assert!(collector.texts(Scope::Unreferenced).is_empty());
    }

    #[test]
    fn test_unsupported_root_emits_nothing() {
        let mut context = DocumentContext::new(None, DocumentKind::Keynote);
        context.store(ROOT_OBJECT_ID, kn::NoteArchive::default());
        text(&mut context, 60, "Welcome");

        let mut collector = TextCollector::new();
        process_root(&mut context, &mut collector);
        assert!(collector.blocks.is_empty());
    }

    #[test]
    fn test_master_slides_rejected() {
        assert!(!crate::iwa::keynote::accept_iwa_file("Index/MasterSlide-1.iwa"));
        assert!(crate::iwa::keynote::accept_iwa_file("Index/Slide-1.iwa"));
    }
}
