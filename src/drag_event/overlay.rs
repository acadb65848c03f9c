use egui::Pos2;

use crate::node::{NodeId, NodeTree};

use super::constants::PIXELMAP_ANIMATION_DURATION_MS;
use super::gather::GatherNodeChildInfo;
use super::scheduler::{AnimatedProperty, AnimationOption, Curve};
use super::{ActuatorId, DeferredTask, DragPipeline, uniform};

/// The floating preview currently mounted in the overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelMapOverlay {
    pub column: NodeId,
    pub image: NodeId,
    pub source: NodeId,
    pub owner: ActuatorId,

    /// Where the image started, used when it animates back.
    pub origin: Pos2,
    pub is_text: bool,
}

/// Bookkeeping of the nodes the drag pipeline mounted into the window.
///
/// The overlay is the single owner of these nodes; actuators only keep handles.
#[derive(Clone, Debug, Default)]
pub struct OverlayManager {
    pixel_map: Option<PixelMapOverlay>,
    pixel_map_removing: bool,
    filter: Option<NodeId>,
    pub(super) filter_on_animation: bool,
    event_column: Option<(NodeId, ActuatorId)>,
    gather: Option<NodeId>,
    gather_children: Vec<GatherNodeChildInfo>,
    badge: Option<NodeId>,
}

impl OverlayManager {
    pub fn has_pixel_map(&self) -> bool {
        self.pixel_map.is_some()
    }

    pub fn pixel_map(&self) -> Option<&PixelMapOverlay> {
        self.pixel_map.as_ref()
    }

    pub fn pixel_map_column(&self) -> Option<NodeId> {
        self.pixel_map.map(|p| p.column)
    }

    pub fn pixel_map_image(&self) -> Option<NodeId> {
        self.pixel_map.map(|p| p.image)
    }

    /// The removal animation is running; the nodes are still mounted.
    pub fn is_pixel_map_removing(&self) -> bool {
        self.pixel_map_removing
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn filter_column(&self) -> Option<NodeId> {
        self.filter
    }

    pub fn is_filter_on_animation(&self) -> bool {
        self.filter_on_animation
    }

    pub fn event_column(&self) -> Option<NodeId> {
        self.event_column.map(|(column, _)| column)
    }

    pub fn gather_node(&self) -> Option<NodeId> {
        self.gather
    }

    pub fn gather_children(&self) -> &[GatherNodeChildInfo] {
        &self.gather_children
    }

    pub fn badge_node(&self) -> Option<NodeId> {
        self.badge
    }

    /// Nothing mounted at all.
    pub fn is_empty(&self) -> bool {
        self.pixel_map.is_none()
            && self.filter.is_none()
            && self.event_column.is_none()
            && self.gather.is_none()
            && self.badge.is_none()
    }
}

impl<T: NodeTree> DragPipeline<T> {
    pub(super) fn mount_pixel_map(&mut self, pixel_map: PixelMapOverlay) {
        let root = self.tree.root();
        if !self.tree.mount(root, pixel_map.column) {
            self.tree.remove_node(pixel_map.column);
            return;
        }
        self.tree.mark_dirty(root);
        self.overlay.pixel_map = Some(pixel_map);
        self.overlay.pixel_map_removing = false;
    }

    pub(super) fn remove_pixel_map(&mut self) {
        let Some(pixel_map) = self.overlay.pixel_map.take() else {
            return;
        };
        self.overlay.pixel_map_removing = false;
        self.tree.remove_node(pixel_map.column);
        self.tree.mark_dirty(self.tree.root());
    }

    /// Animates the floating image back (toward `target`, or to where it came from) and removes
    /// it when the animation ends.
    pub(super) fn remove_pixel_map_animation(&mut self, target: Option<Pos2>) {
        let Some(pixel_map) = self.overlay.pixel_map else {
            return;
        };
        if self.overlay.pixel_map_removing {
            return;
        }
        self.overlay.pixel_map_removing = true;

        let size = self
            .tree
            .render(pixel_map.image)
            .map(|props| props.size)
            .unwrap_or_default();
        let position = target.map_or(pixel_map.origin, |target| target - size / 2.0);
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_DURATION_MS, Curve::lift_spring()),
            vec![
                (pixel_map.image, AnimatedProperty::Scale(uniform(1.0))),
                (pixel_map.image, AnimatedProperty::Position(position)),
            ],
            Some(DeferredTask::RemovePixelMap {
                column: pixel_map.column,
            }),
        );
    }

    pub(super) fn mount_filter(&mut self, parent: NodeId, column: NodeId) -> bool {
        if !self.tree.mount(parent, column) {
            self.tree.remove_node(column);
            return false;
        }
        self.tree.mark_dirty(parent);
        self.overlay.filter = Some(column);
        self.overlay.filter_on_animation = true;
        true
    }

    /// Takes the backdrop out of the bookkeeping. The node itself fades and is destroyed later.
    pub(super) fn take_filter(&mut self) -> Option<NodeId> {
        self.overlay.filter_on_animation = false;
        self.overlay.filter.take()
    }

    pub(super) fn mount_event_column(&mut self, owner: ActuatorId, column: NodeId) {
        self.remove_event_column();
        let root = self.tree.root();
        if !self.tree.mount(root, column) {
            self.tree.remove_node(column);
            return;
        }
        self.tree.mark_dirty(root);
        self.overlay.event_column = Some((column, owner));
    }

    pub(super) fn remove_event_column(&mut self) {
        let Some((column, _)) = self.overlay.event_column.take() else {
            return;
        };
        self.tree.remove_node(column);
    }

    pub(super) fn event_column_owner(&self) -> Option<ActuatorId> {
        self.overlay.event_column.map(|(_, owner)| owner)
    }

    pub(super) fn mount_gather_node(&mut self, gather: NodeId, children: Vec<GatherNodeChildInfo>) {
        if self.overlay.gather == Some(gather) {
            self.overlay.gather_children = children;
            return;
        }
        self.remove_gather_node();
        let root = self.tree.root();
        if !self.tree.mount(root, gather) {
            return;
        }
        self.tree.mark_dirty(root);
        self.overlay.gather = Some(gather);
        self.overlay.gather_children = children;
        self.manager.has_gather_node = true;
    }

    /// Remounts the gather node on top, above a backdrop mounted after it.
    pub(super) fn raise_gather_node(&mut self) {
        let Some(gather) = self.overlay.gather else {
            return;
        };
        let root = self.tree.root();
        if self.tree.unmount(gather) {
            self.tree.mount(root, gather);
            self.tree.mark_dirty(root);
        }
    }

    pub(super) fn remove_gather_node(&mut self) {
        self.overlay.gather_children.clear();
        self.manager.has_gather_node = false;
        let Some(gather) = self.overlay.gather.take() else {
            return;
        };
        self.tree.remove_node(gather);
        self.tree.mark_dirty(self.tree.root());
    }

    /// Fades the peers back to where they were lifted from, then destroys the gather node.
    pub(super) fn remove_gather_node_with_animation(&mut self) {
        let Some(gather) = self.overlay.gather.take() else {
            return;
        };
        let children = std::mem::take(&mut self.overlay.gather_children);
        self.manager.has_gather_node = false;

        let window_offset = self.tree.window_offset();
        let mut properties = Vec::with_capacity(children.len() * 4);
        for child in &children {
            properties.push((child.image, AnimatedProperty::Position(child.offset - window_offset)));
            properties.push((child.image, AnimatedProperty::Scale(uniform(1.0))));
            properties.push((child.image, AnimatedProperty::Rotation(0.0)));
            properties.push((child.image, AnimatedProperty::Opacity(0.0)));
        }
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_DURATION_MS, Curve::Sharp),
            properties,
            Some(DeferredTask::DestroyNode(gather)),
        );
    }

    pub(super) fn mount_badge(&mut self, badge: NodeId) {
        self.remove_badge();
        let root = self.tree.root();
        if !self.tree.mount(root, badge) {
            self.tree.remove_node(badge);
            return;
        }
        self.overlay.badge = Some(badge);
    }

    pub(super) fn remove_badge(&mut self) {
        if let Some(badge) = self.overlay.badge.take() {
            self.tree.remove_node(badge);
        }
    }
}
