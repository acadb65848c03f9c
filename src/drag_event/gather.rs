use egui::{Pos2, Vec2, vec2};

use crate::node::{NodeId, NodeKind, NodeTree};

use super::constants::{
    BADGE_DIGIT_WIDTH_VP, BADGE_RELATIVE_OFFSET_VP, BADGE_SIZE_VP, FIRST_GATHER_PIXELMAP_ANGLE,
    FIRST_GATHER_PIXELMAP_OPACITY, PIXELMAP_ANIMATION_DURATION_MS, PIXELMAP_ANIMATION_TIME_MS,
    SCALE_NUMBER, SECOND_GATHER_PIXELMAP_ANGLE, SECOND_GATHER_PIXELMAP_OPACITY,
};
use super::geometry::{badge_origin, centered_origin, fit_scale, full_window_hot_zone};
use super::scheduler::{AnimatedProperty, AnimationOption, Curve};
use super::{ActuatorId, DragPipeline, uniform};

/// One peer image of a gather node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GatherNodeChildInfo {
    pub image: NodeId,

    /// Screen-space top-left of the peer when it was lifted.
    pub offset: Pos2,
    pub width: f32,
    pub height: f32,
    pub half_width: f32,
    pub half_height: f32,

    /// The list/grid item this image stands in for.
    pub source: NodeId,
}

impl GatherNodeChildInfo {
    pub fn size(&self) -> Vec2 {
        vec2(self.width, self.height)
    }
}

impl<T: NodeTree> DragPipeline<T> {
    /// A multi-select item that may drag, and is selected.
    pub(super) fn is_selected_item_node(&self, node: NodeId) -> bool {
        let (Some(kind), Some(attrs)) = (self.tree.kind(node), self.tree.drag_attrs(node)) else {
            return false;
        };
        attrs.preview_option.is_multi_selection_enabled
            && attrs.is_allowed_drag()
            && kind.is_selectable_item()
            && attrs.selected
    }

    /// The grid/list an item lives in.
    pub(super) fn find_item_parent_node(&self, node: NodeId) -> Option<NodeId> {
        let container = self.tree.kind(node)?.item_container()?;
        self.tree
            .ancestors(node)
            .into_iter()
            .find(|ancestor| self.tree.kind(*ancestor) == Some(container))
    }

    /// True when `node` sits inside a selected item: the item drags, not its content.
    ///
    /// As a side effect, records whether `node` is itself a selected item and its container.
    pub(super) fn is_belong_to_multi_item_node(&mut self, id: ActuatorId, node: NodeId) -> bool {
        let is_selected_item = self.is_selected_item_node(node);
        let item_parent = if is_selected_item {
            self.find_item_parent_node(node)
        } else {
            None
        };
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_selected_item_node = is_selected_item;
            actuator.item_parent = item_parent;
        }
        if is_selected_item {
            return false;
        }
        self.tree
            .ancestors(node)
            .into_iter()
            .any(|ancestor| self.is_selected_item_node(ancestor))
    }

    /// A selected item whose container shows at least one other selected item.
    pub(super) fn is_need_gather(&self, id: ActuatorId) -> bool {
        let Some(actuator) = self.actuators.get(id.0) else {
            return false;
        };
        if !actuator.is_selected_item_node {
            return false;
        }
        let Some(parent) = actuator.item_parent.filter(|p| self.tree.contains(*p)) else {
            return false;
        };
        let node = actuator.node;
        self.tree
            .visible_selected_items(parent)
            .into_iter()
            .any(|item| item != node)
    }

    /// Builds the stack of peer images for a multi-select drag: one image per other visible
    /// selected item, placed where that item is on screen. Not mounted yet.
    pub(super) fn create_gather_node(&mut self, id: ActuatorId) -> Option<NodeId> {
        if self.overlay.gather_node().is_some() || !self.is_need_gather(id) {
            return None;
        }
        let actuator = self.actuators.get(id.0)?;
        let node = actuator.node;
        let parent = actuator.item_parent?;
        let items = self.tree.visible_selected_items(parent);
        let window_offset = self.tree.window_offset();

        let stack = self.tree.create_node(NodeKind::Stack);
        if let Some(props) = self.tree.render_mut(stack) {
            props.position = Some(Pos2::ZERO);
            props.match_parent = true;
        }
        let mut children = Vec::with_capacity(items.len().saturating_sub(1));
        for item in items.into_iter().rev() {
            if item == node {
                continue;
            }
            let Some(child) = self.create_image_node(item, window_offset) else {
                continue;
            };
            self.tree.mount(stack, child.image);
            children.push(child);
        }

        let actuator = self.actuators.get_mut(id.0)?;
        actuator.gather_node = Some(stack);
        actuator.gather_children = children;
        Some(stack)
    }

    fn create_image_node(&mut self, item: NodeId, window_offset: Vec2) -> Option<GatherNodeChildInfo> {
        let frame = self.tree.frame_rect(item)?;
        let bitmap = self.preview_bitmap_for(item)?;
        let size = bitmap.size();
        let origin = centered_origin(frame, size);

        let image = self.tree.create_node(NodeKind::Image);
        let props = self.tree.render_mut(image)?;
        props.position = Some(origin);
        props.size = size;
        props.bitmap = Some(bitmap);
        props.rotation_deg = 0.0;
        props.clip_edge = true;
        props.border_radius = Some(egui::CornerRadius::ZERO);
        props.opacity = Some(1.0);
        props.click_effect_scale = Some(SCALE_NUMBER);

        Some(GatherNodeChildInfo {
            image,
            offset: origin + window_offset,
            width: size.x,
            height: size.y,
            half_width: size.x / 2.0,
            half_height: size.y / 2.0,
            source: item,
        })
    }

    /// Mounts the actuator's gather node and shrinks the peers slightly, ahead of the lift.
    pub(super) fn play_gather_animation_before_lifting(&mut self, id: ActuatorId) {
        let Some(actuator) = self.actuators.get(id.0) else {
            return;
        };
        let Some(gather) = actuator.gather_node else {
            return;
        };
        let children = actuator.gather_children.clone();
        self.mount_gather_node(gather, children.clone());

        let properties = children
            .iter()
            .map(|child| (child.image, AnimatedProperty::Scale(uniform(SCALE_NUMBER))))
            .collect();
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_DURATION_MS, Curve::Sharp),
            properties,
            None,
        );
    }

    pub(super) fn play_node_animation_before_lifting(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_DURATION_MS, Curve::Sharp),
            vec![(node, AnimatedProperty::Scale(uniform(SCALE_NUMBER)))],
            None,
        );
    }

    /// Undoes the before-lifting shrink of the source node.
    pub(super) fn play_node_reset_animation(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let shrunk = self
            .tree
            .render(node)
            .is_some_and(|props| props.scale != uniform(1.0));
        if !shrunk {
            return;
        }
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_DURATION_MS, Curve::Sharp),
            vec![(node, AnimatedProperty::Scale(uniform(1.0)))],
            None,
        );
    }

    /// Converges the peers onto the floating image: centered on it, scaled down to fit, the top
    /// two fanned out at ±8° and faded, the rest hidden behind.
    pub(super) fn play_gather_animation(&mut self, image: NodeId) {
        let children = self.overlay.gather_children().to_vec();
        if children.is_empty() {
            return;
        }
        let Some(target) = self.tree.frame_rect(image) else {
            return;
        };
        let center = target.center();

        let mut properties = Vec::with_capacity(children.len() * 4);
        for (index, child) in children.iter().enumerate() {
            let scale = fit_scale(child.size(), target.size());
            let position = center - vec2(child.half_width, child.half_height);
            properties.push((child.image, AnimatedProperty::Position(position)));
            properties.push((child.image, AnimatedProperty::Scale(uniform(scale))));
            let (rotation, opacity) = match index {
                0 => (FIRST_GATHER_PIXELMAP_ANGLE, FIRST_GATHER_PIXELMAP_OPACITY),
                1 => (SECOND_GATHER_PIXELMAP_ANGLE, SECOND_GATHER_PIXELMAP_OPACITY),
                _ => (0.0, 0.0),
            };
            properties.push((child.image, AnimatedProperty::Rotation(rotation)));
            properties.push((child.image, AnimatedProperty::Opacity(opacity)));
        }
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_TIME_MS, Curve::lift_spring()),
            properties,
            None,
        );
    }

    /// Pops a count badge onto the floating image when more than one item drags.
    pub(super) fn show_preview_badge_animation(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let Some(image_rect) = self
            .overlay
            .pixel_map_image()
            .and_then(|image| self.tree.frame_rect(image))
        else {
            return;
        };
        let dragged = self.overlay.gather_children().len() + 1;
        let Some(count) = self
            .tree
            .drag_attrs(node)
            .and_then(|attrs| attrs.preview_option.badge_count(dragged))
        else {
            return;
        };

        let text = count.to_string();
        let extra_digits = text.len().saturating_sub(1) as f32;
        let height = self.vp_to_px(BADGE_SIZE_VP);
        let width = height + self.vp_to_px(BADGE_DIGIT_WIDTH_VP) * extra_digits;
        let size = vec2(width, height);
        let offset = self.vp_to_px(BADGE_RELATIVE_OFFSET_VP);

        let badge = self.tree.create_node(NodeKind::Text);
        if let Some(props) = self.tree.render_mut(badge) {
            props.position = Some(badge_origin(image_rect, size, offset));
            props.size = size;
            props.text = Some(text);
            props.scale = uniform(0.0);
        }
        self.mount_badge(badge);
        if self.overlay.badge_node() != Some(badge) {
            return;
        }
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_DURATION_MS, Curve::lift_spring()),
            vec![(badge, AnimatedProperty::Scale(uniform(1.0)))],
            None,
        );
    }

    /// Moves every peer by `delta` so the bundle tracks a moving preview.
    ///
    /// `delta` goes into the translate, on top of wherever the peer currently sits: its stored
    /// offset before the lift, the preview center after it. Positions are left alone so a
    /// running gather animation is not snapped back.
    pub(super) fn update_gather_animate_position(
        &mut self,
        children: &[GatherNodeChildInfo],
        delta: Vec2,
    ) {
        for child in children {
            let Some(props) = self.tree.render_mut(child.image) else {
                continue;
            };
            props.translate = delta;
        }
    }

    /// Puts the gather node above a backdrop that was mounted after it.
    pub(super) fn set_gather_node_above_filter(&mut self, id: ActuatorId) {
        if !self.is_need_gather(id) || !self.overlay.has_filter() {
            return;
        }
        self.raise_gather_node();
    }

    /// While peers are gathered, the source accepts touches anywhere in the window so the lift
    /// can continue even if the finger leaves the shrunk node.
    pub(super) fn set_response_region_full(&mut self, id: ActuatorId) {
        if !self.is_need_gather(id) {
            return;
        }
        let Some(actuator) = self.actuators.get(id.0) else {
            return;
        };
        if actuator.is_response_region_full {
            return;
        }
        let node = actuator.node;
        let root = self.tree.root();
        let (Some(node_rect), Some(window)) = (self.tree.frame_rect(node), self.tree.frame_rect(root))
        else {
            return;
        };
        let Some(attrs) = self.tree.drag_attrs_mut(node) else {
            return;
        };
        let saved = std::mem::replace(
            &mut attrs.response_region,
            vec![full_window_hot_zone(node_rect, window)],
        );
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.saved_response_region = saved;
            actuator.is_response_region_full = true;
        }
    }

    pub(super) fn reset_response_region(&mut self, id: ActuatorId) {
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        if !actuator.is_response_region_full {
            return;
        }
        actuator.is_response_region_full = false;
        let saved = std::mem::take(&mut actuator.saved_response_region);
        let node = actuator.node;
        if let Some(attrs) = self.tree.drag_attrs_mut(node) {
            attrs.response_region = saved;
        }
    }

    /// Drops the actuator's handles to its gather node.
    pub(super) fn clear_gather(&mut self, id: ActuatorId) {
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.gather_node = None;
            actuator.gather_children.clear();
        }
    }
}
