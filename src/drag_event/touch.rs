use egui::Pos2;

use crate::node::NodeTree;

use super::admission::is_current_node_status_suitable;
use super::arbiter::Disposal;
use super::geometry::{damped_point, menu_preview_scale};
use super::manager::MenuPreviewUpdate;
use super::recognizer::{RecognizerSlot, TouchEventInfo, TouchRestrict, TouchType};
use super::{ActuatorId, DragPipeline};

impl<T: NodeTree> DragPipeline<T> {
    /// Registers (or drops) the raw touch listener of the actuator for the coming gesture.
    ///
    /// Returns whether the host should route touches to [`Self::handle_touch_event`].
    pub fn add_touch_listener(&mut self, id: ActuatorId, restrict: &TouchRestrict) -> bool {
        let Some(actuator) = self.actuators.get(id.0) else {
            return false;
        };
        if actuator.user_callback.is_none() {
            return false;
        }
        let Some(node) = self.node_of(id) else {
            return false;
        };
        let listening = self.manager.is_global_status_suitable_for_dragging()
            && is_current_node_status_suitable(&self.tree, node, restrict)
            && !self.is_belong_to_multi_item_node(id, node);
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.has_touch_listener = listening;
        }
        listening
    }

    /// Raw touch routed by the listener: tracks fingers, drives context-menu damping and cleans
    /// up the before-lifting stage.
    pub fn handle_touch_event(&mut self, id: ActuatorId, info: &TouchEventInfo) {
        self.handle_touch_event_with(id, info, false);
    }

    /// Touch of a restarted drag of a lifted preview: only feeds damping.
    pub fn handle_restart_drag_touch_event(&mut self, id: ActuatorId, info: &TouchEventInfo) {
        self.handle_touch_event_with(id, info, true);
    }

    fn handle_touch_event_with(
        &mut self,
        id: ActuatorId,
        info: &TouchEventInfo,
        is_restart_drag: bool,
    ) {
        let Some(first) = info.touches.first().copied() else {
            return;
        };
        let Some(actuator) = self.actuators.get(id.0) else {
            return;
        };
        if !actuator.has_touch_listener && !is_restart_drag {
            return;
        }
        let has_context_menu = actuator.has_context_menu;
        if self.node_of(id).is_none() {
            return;
        }
        for touch in &info.touches {
            self.manager.update_point_info_for_finger(touch.finger_id, touch.global);
        }

        if is_restart_drag {
            match first.touch_type {
                TouchType::Down => self.set_drag_damp_start_point_info(id, first.global, first.finger_id),
                TouchType::Move => self.handle_drag_damping_move(id, first.global, first.finger_id, true),
                TouchType::Up | TouchType::Cancel => {}
            }
            return;
        }

        match first.touch_type {
            TouchType::Up => {
                self.manager.release_pointer(first.finger_id);
                self.handle_touch_up_event(id);
            }
            TouchType::Cancel => {
                self.manager.release_pointer(first.finger_id);
                self.handle_touch_cancel_event(id);
            }
            TouchType::Move => {
                if has_context_menu {
                    self.handle_drag_damping_move(id, first.global, first.finger_id, false);
                }
                self.handle_touch_move_event(id);
            }
            TouchType::Down => {}
        }
    }

    fn handle_touch_up_event(&mut self, id: ActuatorId) {
        self.play_node_reset_animation(id);
        self.reset_response_region(id);
        let has_gather = self
            .actuators
            .get(id.0)
            .is_some_and(|a| a.gather_node.is_some());
        if has_gather && !self.manager.gather_with_menu {
            self.clear_gather(id);
            self.remove_gather_node_with_animation();
        }
    }

    fn handle_touch_cancel_event(&mut self, id: ActuatorId) {
        self.reset_response_region(id);
    }

    /// A move after the long-press lost drops a before-lifting gather at once.
    fn handle_touch_move_event(&mut self, id: ActuatorId) {
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        let lost = actuator.is_on_before_lifting_animation
            && actuator.arbiter.disposal(RecognizerSlot::LongPress) == Disposal::Rejected;
        if !lost {
            return;
        }
        actuator.is_on_before_lifting_animation = false;
        self.clear_gather(id);
        self.remove_gather_node();
        self.reset_response_region(id);
        self.play_node_reset_animation(id);
    }

    /// Anchors context-menu damping at `point` for `pointer_id`.
    pub(super) fn set_drag_damp_start_point_info(
        &mut self,
        id: ActuatorId,
        point: Pos2,
        pointer_id: i32,
    ) {
        self.manager.reset_context_menu_drag_position();
        self.manager.set_damp_start_point(point);
        self.manager.set_dragging_pointer(pointer_id);
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_redrag_start = false;
        }
    }

    /// Eased follow of a lifted context-menu preview before the drag commits.
    ///
    /// The preview tracks `ratio` of the finger movement. Once it has travelled more than
    /// `threshold * ratio`, the overflow latch is set once; later moves are ignored until the
    /// manager is reset.
    pub(super) fn handle_drag_damping_move(
        &mut self,
        id: ActuatorId,
        point: Pos2,
        pointer_id: i32,
        is_redrag_start: bool,
    ) {
        if self.manager.is_about_to_preview()
            || self.manager.is_dragging()
            || !self.manager.is_same_dragging_pointer(pointer_id)
        {
            return;
        }
        let ratio = self.options.drag_start_damping_ratio;
        let limit = self.vp_to_px(self.options.drag_start_pan_distance_threshold) * ratio;
        let distance = self.manager.drag_total_move().length();
        if distance > limit {
            if self.manager.is_damping_overflow() {
                return;
            }
            self.manager.latch_damping_overflow();
            self.debug_log_event(format!("damping overflow at {distance:.1}px"));
        }

        let scale = menu_preview_scale(distance, limit);
        let offset = damped_point(point, self.manager.damp_start_point(), ratio);
        let first_redrag = is_redrag_start
            && self
                .actuators
                .get_mut(id.0)
                .is_some_and(|a| !std::mem::replace(&mut a.is_redrag_start, true));
        self.manager.set_menu_preview(MenuPreviewUpdate { offset, scale });
        self.manager.update_drag_move_position(offset, first_redrag);

        let delta = offset - self.manager.damp_start_point();
        let children = self.overlay.gather_children().to_vec();
        self.update_gather_animate_position(&children, delta);
    }
}
