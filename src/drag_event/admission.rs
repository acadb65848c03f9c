//! Small policy checks for whether a node may take part in a drag at all.

use crate::node::{DragNodeAttrs, NodeId, NodeKind, NodeTree};

use super::options::DeviceType;
use super::recognizer::{InputEventType, TouchRestrict};

/// Node-local admission: axis input never drags, a customer-disabled node never drags, and a
/// `drag_forbidden` flag anywhere on the ancestor chain vetoes the whole subtree.
pub(super) fn is_current_node_status_suitable<T: NodeTree>(
    tree: &T,
    node: NodeId,
    restrict: &TouchRestrict,
) -> bool {
    if restrict.input_event_type == InputEventType::Axis {
        return false;
    }
    let Some(attrs) = tree.drag_attrs(node) else {
        return false;
    };
    if attrs.is_customer_non_draggable() || attrs.drag_forbidden {
        return false;
    }
    !tree
        .ancestors(node)
        .into_iter()
        .any(|ancestor| tree.drag_attrs(ancestor).is_some_and(|a| a.drag_forbidden))
}

/// Whether the blurred backdrop goes up behind a lifted preview.
///
/// Web content gets it only for image drags on phones; everything else only inside a bound
/// overlay on phones.
pub(super) fn backdrop_allowed(kind: NodeKind, attrs: &DragNodeAttrs, device: DeviceType) -> bool {
    if device != DeviceType::Phone {
        return false;
    }
    if kind == NodeKind::Web {
        return attrs.web_image_drag;
    }
    attrs.bind_overlay
}
