use egui::{Color32, Pos2, Shadow, Vec2};

use crate::node::{BackgroundEffect, BlurStyle, Bitmap, NodeId, NodeKind, NodeTree};
use crate::preview_option::{DragPreviewOption, OptionsAfterApplied};

use super::admission::backdrop_allowed;
use super::arbiter::Disposal;
use super::constants::{
    DEFAULT_OPACITY, FILTER_BLUR_RADIUS, FILTER_TIMES_MS, MAX_OPACITY, MIN_OPACITY,
    PIXELMAP_ANIMATION_DURATION_MS, PIXELMAP_BORDER_RADIUS_VP, PIXELMAP_DRAG_SCALE_MULTIPLE,
    PREVIEW_BORDER_RADIUS_VP, SCALE_NUMBER,
};
use super::geometry::{blur_radius_to_sigma, centered_origin, corner_radius};
use super::overlay::PixelMapOverlay;
use super::recognizer::RecognizerSlot;
use super::scheduler::{AnimatedProperty, AnimationOption, Curve};
use super::{ActuatorId, DeferredTask, DragPipeline, uniform};

/// The shadow a preview gets when `is_default_shadow_enabled` is set.
pub(super) fn default_preview_shadow() -> Shadow {
    Shadow {
        offset: [0, 8],
        blur: 24,
        spread: 0,
        color: Color32::from_black_alpha(48),
    }
}

impl<T: NodeTree> DragPipeline<T> {
    /// Preview bitmap of `node`: a node found by inspector id wins, then an application bitmap,
    /// then a live snapshot.
    pub(super) fn preview_bitmap_for(&mut self, node: NodeId) -> Option<Bitmap> {
        let attrs = self.tree.drag_attrs(node)?;
        let inspector_id = attrs.preview_inspector_id.clone();
        let user_bitmap = attrs.preview_bitmap.clone();

        if let Some(inspector_id) = inspector_id {
            if let Some(preview_node) = self.tree.find_by_inspector_id(&inspector_id) {
                if let Some(bitmap) = self.tree.snapshot(preview_node) {
                    return Some(bitmap);
                }
            }
        }
        if let Some(bitmap) = user_bitmap {
            return Some(bitmap);
        }
        self.tree.snapshot(node)
    }

    /// Floats the preview image of the actuator's node into the overlay and plays its lift-in
    /// transition. Does nothing if a preview is already floating.
    pub(super) fn set_pixel_map(&mut self, id: ActuatorId) {
        if self.overlay.has_pixel_map() {
            return;
        }
        let Some(node) = self.node_of(id) else {
            return;
        };
        let Some(frame) = self.tree.frame_rect(node) else {
            return;
        };
        let cached = self.actuators.get(id.0).and_then(|a| a.pixel_map.clone());
        let Some(bitmap) = cached.or_else(|| self.preview_bitmap_for(node)) else {
            self.debug_log_event("set pixel map: no preview bitmap");
            return;
        };

        let size = bitmap.size();
        let origin = centered_origin(frame, size);
        let image = self.tree.create_node(NodeKind::Image);
        if let Some(props) = self.tree.render_mut(image) {
            props.position = Some(origin);
            props.size = size;
            props.bitmap = Some(bitmap);
            props.click_effect_scale = Some(SCALE_NUMBER);
        }
        let column = self.tree.create_node(NodeKind::Column);
        if let Some(props) = self.tree.render_mut(column) {
            props.match_parent = true;
        }
        self.tree.mount(column, image);
        self.mount_pixel_map(PixelMapOverlay {
            column,
            image,
            source: node,
            owner: id,
            origin,
            is_text: false,
        });
        if !self.overlay.has_pixel_map() {
            return;
        }
        self.show_pixel_map_animation(id, image, node);
    }

    fn show_pixel_map_animation(&mut self, id: ActuatorId, image: NodeId, node: NodeId) {
        let Some(attrs) = self.tree.drag_attrs(node) else {
            return;
        };
        let has_context_menu = attrs.has_context_menu;
        let before_lifting = attrs.preview_option.default_animation_before_lifting;

        if let Some(props) = self.tree.render_mut(image) {
            props.opacity = Some(MAX_OPACITY);
            if before_lifting {
                props.scale = uniform(SCALE_NUMBER);
            }
        }
        if before_lifting {
            if let Some(props) = self.tree.render_mut(node) {
                props.visible = false;
            }
        }

        self.apply_newest_option_to_node(node, image);
        let Some(props) = self.tree.render(image) else {
            return;
        };
        let mut properties = vec![(
            image,
            AnimatedProperty::Opacity(props.opacity.unwrap_or(DEFAULT_OPACITY)),
        )];
        if has_context_menu {
            let radius = corner_radius(self.vp_to_px(PIXELMAP_BORDER_RADIUS_VP));
            properties.push((image, AnimatedProperty::BorderRadius(radius)));
        } else if let Some(radius) = props.border_radius {
            properties.push((image, AnimatedProperty::BorderRadius(radius)));
        }
        if before_lifting {
            properties.push((image, AnimatedProperty::Scale(uniform(1.0))));
        }
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_DURATION_MS, Curve::Sharp),
            properties,
            Some(DeferredTask::PixelMapShown { actuator: id, image }),
        );
    }

    /// The lift-in transition ended: the source node shows again.
    pub(super) fn finish_pixel_map_shown(&mut self, id: ActuatorId, image: NodeId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        if self.overlay.pixel_map_image() != Some(image) {
            return;
        }
        if let Some(props) = self.tree.render_mut(node) {
            props.visible = true;
        }
    }

    /// Styling defaults before the modifier runs.
    pub(super) fn update_preview_option_default_attr(&self, option: &DragPreviewOption) -> OptionsAfterApplied {
        let mut applied = OptionsAfterApplied {
            opacity: DEFAULT_OPACITY,
            ..Default::default()
        };
        if option.is_default_shadow_enabled {
            applied.shadow = Some(default_preview_shadow());
        }
        if option.is_default_radius_enabled || option.is_multi_selection_enabled {
            applied.border_radius = Some(corner_radius(self.vp_to_px(PREVIEW_BORDER_RADIUS_VP)));
        }
        applied
    }

    /// Recomputes the preview styling of the actuator's node: defaults first, then the
    /// application modifier, run against a throwaway node.
    pub(super) fn update_preview_option_from_modifier(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let Some(option) = self.tree.drag_attrs(node).map(|a| a.preview_option.clone()) else {
            return;
        };
        let mut applied = self.update_preview_option_default_attr(&option);

        if let Some(modifier) = &option.on_apply {
            let scratch = self.tree.create_node(NodeKind::Image);
            let styled = self.tree.render_mut(scratch).map(|props| {
                modifier.apply(props);
                props.clone()
            });
            self.tree.remove_node(scratch);

            if let Some(styled) = styled {
                if let Some(opacity) = styled.opacity {
                    applied.opacity = if opacity > MIN_OPACITY && opacity <= MAX_OPACITY {
                        opacity
                    } else {
                        DEFAULT_OPACITY
                    };
                }
                if styled.shadow.is_some() {
                    applied.shadow = styled.shadow;
                }
                if styled.border_radius.is_some() {
                    applied.border_radius = styled.border_radius;
                }
                if let Some(effect) = styled.background_effect.filter(BackgroundEffect::is_valid) {
                    applied.background_effect = Some(effect);
                } else if let Some(style) = styled.back_blur_style {
                    applied.blur_style = Some(style);
                    applied.background_effect = BackgroundEffect::from_blur_style(style);
                }
            }
        }

        if let Some(attrs) = self.tree.drag_attrs_mut(node) {
            attrs.preview_option.options = applied.clone();
        }
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.options_after_applied = applied;
        }
    }

    /// Copies the latest computed styling of `source` onto the floating `image`.
    pub(super) fn apply_newest_option_to_node(&mut self, source: NodeId, image: NodeId) {
        let Some(options) = self.tree.drag_attrs(source).map(|a| a.preview_option.options.clone())
        else {
            return;
        };
        let Some(props) = self.tree.render_mut(image) else {
            return;
        };
        props.opacity = Some(options.opacity);
        if let Some(shadow) = options.shadow {
            props.shadow = Some(shadow);
        }
        if let Some(radius) = options.border_radius {
            props.border_radius = Some(radius);
            props.clip_edge = true;
        }
        if let Some(effect) = options.background_effect.filter(BackgroundEffect::is_valid) {
            props.background_effect = Some(effect);
            props.blur_sigma = blur_radius_to_sigma(effect.radius);
        }
    }

    /// Mounts the blurred backdrop under the window's top-level container, if policy allows.
    pub(super) fn set_filter(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        if self.overlay.has_filter() || self.overlay.is_filter_on_animation() {
            return;
        }
        let (Some(kind), Some(attrs)) = (self.tree.kind(node), self.tree.drag_attrs(node)) else {
            return;
        };
        if !backdrop_allowed(kind, attrs, self.options.device_type) {
            return;
        }
        let chain = std::iter::once(node).chain(self.tree.ancestors(node));
        let Some(container) = chain
            .into_iter()
            .find(|candidate| self.tree.depth(*candidate) == Some(1))
        else {
            self.debug_log_event("set filter: no top-level container");
            return;
        };

        let column = self.tree.create_node(NodeKind::Column);
        if let Some(props) = self.tree.render_mut(column) {
            props.match_parent = true;
            props.blur_sigma = blur_radius_to_sigma(FILTER_BLUR_RADIUS);
        }
        if !self.mount_filter(container, column) {
            return;
        }
        self.manager.drag_filter_showing = true;
        self.animate(
            AnimationOption::new(FILTER_TIMES_MS, Curve::Sharp),
            vec![(column, AnimatedProperty::BackBlur(Some(BlurStyle::BackgroundThin)))],
            Some(DeferredTask::FilterSettled { column }),
        );
    }

    /// Fades the backdrop out and destroys it.
    pub(super) fn hide_filter(&mut self) {
        let Some(column) = self.take_filter() else {
            return;
        };
        self.manager.drag_filter_showing = false;
        self.animate(
            AnimationOption::new(FILTER_TIMES_MS, Curve::Sharp),
            vec![(column, AnimatedProperty::BackBlur(None))],
            Some(DeferredTask::DestroyNode(column)),
        );
    }

    /// Mounts a full-window column that swallows input while the preview floats.
    pub(super) fn set_event_column(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let bind_overlay = self
            .tree
            .drag_attrs(node)
            .is_some_and(|attrs| attrs.bind_overlay);
        let root = self.tree.root();
        let root_size = self
            .tree
            .frame_rect(root)
            .map(|rect| rect.size())
            .unwrap_or(Vec2::ZERO);

        let column = self.tree.create_node(NodeKind::Column);
        if let Some(props) = self.tree.render_mut(column) {
            props.position = Some(Pos2::ZERO);
            props.size = root_size;
            props.match_parent = true;
            props.hit_test_block = !bind_overlay;
        }
        self.mount_event_column(id, column);
    }

    pub(super) fn hide_event_column(&mut self) {
        self.remove_event_column();
    }

    /// Takes the floating preview down. When not starting a drag, the badge and gather node go
    /// too.
    pub(super) fn hide_pixel_map(&mut self, start_drag: bool, target: Option<Pos2>, animate: bool) {
        if !start_drag {
            self.remove_badge();
            self.remove_gather_node_with_animation();
        }
        if animate {
            self.remove_pixel_map_animation(target);
        } else {
            self.remove_pixel_map();
        }
    }

    /// The host reports a click on the event-blocking column.
    pub fn click_event_column(&mut self) {
        let owner = self.event_column_owner();
        self.hide_event_column();
        let Some(id) = owner else {
            return;
        };
        let Some(node) = self.node_of(id) else {
            self.hide_pixel_map(false, None, false);
            return;
        };
        let is_text = self
            .tree
            .drag_attrs(node)
            .is_some_and(|attrs| attrs.text_draggable);
        if is_text {
            self.hide_text_animation(id, false, None);
            self.manager.drag_node_need_clean = true;
        } else {
            self.hide_pixel_map(false, None, true);
            self.hide_filter();
        }
    }

    /// Floats the selected text of a text-draggable node.
    pub(super) fn set_text_animation(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        if self.overlay.has_pixel_map() {
            return;
        }
        let Some(attrs) = self.tree.drag_attrs(node) else {
            return;
        };
        if !attrs.text_selected {
            return;
        }
        let Some(frame) = self.tree.frame_rect(node) else {
            return;
        };
        let cached = self.actuators.get(id.0).and_then(|a| a.text_pixel_map.clone());
        let Some(bitmap) = cached.or_else(|| self.tree.snapshot(node)) else {
            return;
        };
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.text_pixel_map = Some(bitmap.clone());
        }

        let size = bitmap.size();
        let origin = centered_origin(frame, size);
        let image = self.tree.create_node(NodeKind::Text);
        if let Some(props) = self.tree.render_mut(image) {
            props.position = Some(origin);
            props.size = size;
            props.bitmap = Some(bitmap);
        }
        let column = self.tree.create_node(NodeKind::Column);
        if let Some(props) = self.tree.render_mut(column) {
            props.match_parent = true;
        }
        self.tree.mount(column, image);
        self.mount_pixel_map(PixelMapOverlay {
            column,
            image,
            source: node,
            owner: id,
            origin,
            is_text: true,
        });
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_DURATION_MS, Curve::Sharp),
            vec![(image, AnimatedProperty::Scale(uniform(PIXELMAP_DRAG_SCALE_MULTIPLE)))],
            None,
        );
    }

    /// Sinks the floating text back and removes it.
    pub(super) fn hide_text_animation(&mut self, id: ActuatorId, start_drag: bool, target: Option<Pos2>) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let allowed = self
            .tree
            .drag_attrs(node)
            .is_some_and(|attrs| attrs.text_draggable && attrs.is_allowed_drag());
        if !allowed || !self.overlay.pixel_map().is_some_and(|p| p.is_text) {
            return;
        }
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.pixel_map = None;
        }
        self.remove_pixel_map_animation(if start_drag { target } else { None });
    }

    /// A mouse text drag starts from the cached text bitmap.
    pub(super) fn set_text_pixel_map(&mut self, id: ActuatorId) {
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        if let Some(bitmap) = actuator.text_pixel_map.take() {
            actuator.pixel_map = Some(bitmap);
        }
    }

    pub(super) fn handle_text_drag_callback(&mut self, id: ActuatorId, offset: Pos2) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let selected = self
            .tree
            .drag_attrs(node)
            .is_some_and(|attrs| attrs.text_selected);
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        if selected {
            if let Some(callback) = actuator.thumbnail_callback.clone() {
                callback(offset);
            }
        } else {
            actuator.pixel_map = None;
        }
    }

    /// Computes the drag-time bitmap: `window_scale * 1.05`, inline or on the next tick.
    pub(super) fn prepare_final_pixel_map_for_drag_through_touch(
        &mut self,
        id: ActuatorId,
        bitmap: Bitmap,
        immediately: bool,
    ) {
        let scale = self.manager.window_scale * PIXELMAP_DRAG_SCALE_MULTIPLE;
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        actuator.pre_scaled_pixel_map = None;
        if immediately {
            actuator.pre_scaled_pixel_map = Some(bitmap.scaled(scale));
            actuator.pre_scale_value = scale;
        } else {
            self.scheduler.post(DeferredTask::ScalePixelMap {
                actuator: id,
                bitmap,
                scale,
            });
        }
    }

    pub(super) fn capture_thumbnail(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let Some(bitmap) = self.preview_bitmap_for(node) else {
            self.debug_log_event("thumbnail capture failed");
            return;
        };
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.pixel_map = Some(bitmap.clone());
        }
        self.prepare_final_pixel_map_for_drag_through_touch(id, bitmap, false);
    }

    /// Captures the thumbnail (now or deferred) and, unless the long-press already lost or
    /// lifting is disabled, stages the before-lifting gather.
    pub(super) fn get_thumbnail_pixel_map(&mut self, id: ActuatorId, is_sync: bool) {
        if is_sync {
            self.capture_thumbnail_now(id);
        } else {
            self.scheduler.post(DeferredTask::CaptureThumbnail { actuator: id });
        }

        let Some(node) = self.node_of(id) else {
            return;
        };
        let lifting_disabled = self
            .tree
            .drag_attrs(node)
            .is_none_or(|attrs| attrs.preview_option.is_lifting_disabled);
        let long_press_rejected = self
            .actuators
            .get(id.0)
            .is_none_or(|a| a.arbiter.disposal(RecognizerSlot::LongPress) == Disposal::Rejected);

        if long_press_rejected || lifting_disabled {
            self.set_before_lifting(id, false);
            return;
        }
        if self.create_gather_node(id).is_none() {
            self.set_before_lifting(id, false);
            return;
        }
        self.set_before_lifting(id, true);
        self.play_gather_animation_before_lifting(id);
        self.play_node_animation_before_lifting(id);
        self.set_response_region_full(id);
    }

    fn capture_thumbnail_now(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let Some(bitmap) = self.preview_bitmap_for(node) else {
            return;
        };
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.pixel_map = Some(bitmap.clone());
        }
        self.prepare_final_pixel_map_for_drag_through_touch(id, bitmap, true);
    }

    fn set_before_lifting(&mut self, id: ActuatorId, value: bool) {
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_on_before_lifting_animation = value;
        }
    }

    /// Synchronous thumbnail on the 500 ms long-press, unless the early timer already did it.
    pub(super) fn try_trigger_thumbnail_callback(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let Some(actuator) = self.actuators.get(id.0) else {
            return;
        };
        if actuator.is_thumbnail_triggered {
            return;
        }
        let skip = self.tree.kind(node) == Some(NodeKind::Web)
            || self
                .tree
                .drag_attrs(node)
                .is_some_and(|attrs| attrs.text_draggable);
        if skip {
            return;
        }
        self.get_thumbnail_pixel_map(id, true);
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_thumbnail_triggered = true;
        }
    }
}
