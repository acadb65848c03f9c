//! Recognizer wiring and the per-phase handlers.
//!
//! | message                      | precondition                                              | effect                                                        |
//! |------------------------------|-----------------------------------------------------------|---------------------------------------------------------------|
//! | long-press (500 ms)          | touch source, long-press not rejected                     | prepare node, styling, `ReadyToTriggerDragAction`             |
//! | preview long-press (800 ms)  | nothing floating, not staging/dragging/cleaning, pan ok   | float preview, gather, badge, lift, `PreviewLiftStarted`      |
//! | pan start                    | long-press won (touch), not dragging, status < landed     | hide staging overlays, user start, commit the drag            |
//! | pan update                   |                                                           | user update                                                   |
//! | pan end                      |                                                           | tear the preview down, user end                               |
//! | sequence cancel              | long-press won (touch)                                    | `ActionCanceledBeforeDrag` if not lifted, tear down, user cancel |
//! | pan reject                   | a gather node that is not bundled with a menu             | drop the gather node                                          |

use egui::{Pos2, Vec2};

use crate::node::{NodeKind, NodeTree};

use super::admission::is_current_node_status_suitable;
use super::arbiter::{Disposal, Phase, Verdict};
use super::constants::{
    PIXELMAP_ANIMATION_DURATION_MS, PIXELMAP_ANIMATION_TIME_MS, PIXELMAP_DRAG_SCALE_MULTIPLE,
    PRE_DRAG_TIMER_DEADLINE_MS,
};
use super::manager::DragDropState;
use super::pre_drag::PreDragStatus;
use super::recognizer::{
    ArmedRecognizer, GestureCallback, GestureInfo, InputEventType, RecognizerKind, RecognizerSlot,
    RecognizerSpec, SourceType, TouchRestrict,
};
use super::scheduler::{AnimatedProperty, AnimationOption, Curve};
use super::{ActuatorId, DeferredTask, DragPipeline, uniform};

impl<T: NodeTree> DragPipeline<T> {
    /// Hit-test entry point: decides whether the actuator's node takes part in the gesture and
    /// returns the recognizers the host should arm for it.
    ///
    /// An empty result means the node opted out.
    pub fn on_collect_touch_target(
        &mut self,
        id: ActuatorId,
        coordinate_offset: Vec2,
        restrict: &TouchRestrict,
    ) -> Vec<ArmedRecognizer> {
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return Vec::new();
        };
        actuator.armed.clear();
        if actuator.user_callback.is_none() {
            return Vec::new();
        }
        actuator.is_thumbnail_triggered = false;
        let node = actuator.node;
        let (fingers, direction, distance) = (actuator.fingers, actuator.direction, actuator.distance);

        if !self.tree.contains(node) {
            return Vec::new();
        }
        self.manager.set_prepare_drag_node(None);
        if !self.manager.is_global_status_suitable_for_dragging()
            || !is_current_node_status_suitable(&self.tree, node, restrict)
            || self.is_belong_to_multi_item_node(id, node)
        {
            self.debug_log_event(format!("collect rejected node={node:?}"));
            return Vec::new();
        }

        let (has_context_menu, is_allowed_drag) = self
            .tree
            .drag_attrs(node)
            .map_or((false, false), |attrs| (attrs.has_context_menu, attrs.is_allowed_drag()));
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return Vec::new();
        };
        actuator.touch_down_point = Some(restrict.touch_event.global);
        actuator.last_touch_finger_id = restrict.touch_event.id;
        actuator.has_context_menu = has_context_menu;
        actuator.arbiter.reset(restrict.source_type);

        self.manager.disable_default_drop_animation = false;
        self.manager.drag_node_need_clean = false;
        self.manager.set_pre_drag_status(PreDragStatus::ActionDetectingStatus);
        self.manager.drag_filter_showing = false;

        let pan = |distance: f32| RecognizerSpec {
            slot: RecognizerSlot::Pan,
            kind: RecognizerKind::Pan {
                fingers,
                direction,
                distance,
            },
            coordinate_offset,
        };

        let specs = if restrict.source_type.is_touch_like() {
            let long_press = RecognizerSpec {
                slot: RecognizerSlot::LongPress,
                kind: RecognizerKind::LongPress {
                    duration_ms: self.options.long_press_duration_ms,
                    fingers,
                    thumbnail_deadline_ms: is_allowed_drag.then_some(PRE_DRAG_TIMER_DEADLINE_MS),
                },
                coordinate_offset,
            };
            let preview_long_press = RecognizerSpec {
                slot: RecognizerSlot::PreviewLongPress,
                kind: RecognizerKind::LongPress {
                    duration_ms: self.options.preview_long_press_duration_ms,
                    fingers,
                    thumbnail_deadline_ms: Some(PRE_DRAG_TIMER_DEADLINE_MS),
                },
                coordinate_offset,
            };
            vec![
                RecognizerSpec {
                    slot: RecognizerSlot::Sequence,
                    kind: RecognizerKind::Sequence {
                        members: vec![long_press, pan(distance)],
                        event_handover: true,
                    },
                    coordinate_offset,
                },
                preview_long_press,
            ]
        } else {
            self.manager.any_draggable_hit = is_allowed_drag;
            let mouse_distance = self.vp_to_px(self.options.mouse_pan_distance);
            vec![RecognizerSpec {
                slot: RecognizerSlot::Sequence,
                kind: RecognizerKind::Sequence {
                    members: vec![pan(mouse_distance)],
                    event_handover: false,
                },
                coordinate_offset,
            }]
        };

        let armed: Vec<ArmedRecognizer> = specs
            .into_iter()
            .map(|spec| ArmedRecognizer { actuator: id, spec })
            .collect();
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.armed = armed.clone();
        }
        self.debug_log_event(format!(
            "collect node={node:?} source={:?} armed={}",
            restrict.source_type,
            armed.len()
        ));
        armed
    }

    /// Delivers one recognizer outcome to the actuator.
    ///
    /// Messages for detached actuators are dropped; a late pan end or start still clears what
    /// the dead actuator left floating.
    pub fn dispatch_gesture(&mut self, id: ActuatorId, callback: GestureCallback) {
        if !self.actuators.contains(id.0) {
            self.debug_log_event(format!("{} for detached actuator", callback.name()));
            match callback {
                GestureCallback::PanEnd(_) => {
                    if self.manager.is_about_to_preview() {
                        self.manager.reset_dragging(DragDropState::Idle);
                    }
                    self.remove_pixel_map();
                }
                GestureCallback::PanStart(_) | GestureCallback::SequenceCancel => {
                    self.reset_drag_status();
                }
                _ => {}
            }
            return;
        }

        match callback {
            GestureCallback::Disposal { slot, disposal } => {
                if let Some(actuator) = self.actuators.get_mut(id.0) {
                    actuator.arbiter.record(slot, disposal);
                }
            }
            GestureCallback::LongPressAction(info) => {
                if self.admit(id, Phase::LongPressAction) {
                    if let Some(actuator) = self.actuators.get_mut(id.0) {
                        if actuator.arbiter.disposal(RecognizerSlot::LongPress) == Disposal::Pending {
                            actuator.arbiter.record(RecognizerSlot::LongPress, Disposal::Accepted);
                        }
                    }
                    self.handle_long_press_action(id, &info);
                }
            }
            GestureCallback::ThumbnailTimer(point) => self.handle_thumbnail_timer(id, point),
            GestureCallback::PreviewLongPressAction(info) => {
                if self.admit(id, Phase::PreviewLongPressAction) {
                    self.handle_preview_long_press_action(id, &info);
                } else {
                    self.debug_log_event("preview long-press ignored: drag action rejected");
                }
            }
            GestureCallback::PreviewLongPressCancel => self.handle_preview_long_press_cancel(id),
            GestureCallback::PreviewThumbnailTimer(_) => self.handle_preview_thumbnail_timer(id),
            GestureCallback::PanStart(info) => {
                if self.admit(id, Phase::PanStart) {
                    self.handle_action_start(id, &info);
                } else {
                    self.debug_log_event("pan start ignored: long-press has not won");
                }
            }
            GestureCallback::PanUpdate(info) => self.handle_action_update(id, &info),
            GestureCallback::PanEnd(info) => self.handle_action_end(id, &info),
            GestureCallback::PanActionCancel => self.handle_on_pan_action_cancel(id),
            GestureCallback::PanReject => self.handle_pan_reject(id),
            GestureCallback::SequenceCancel => self.handle_action_cancel(id),
        }
    }

    fn admit(&self, id: ActuatorId, phase: Phase) -> bool {
        self.actuators
            .get(id.0)
            .is_some_and(|actuator| actuator.arbiter.admit(phase) == Verdict::Proceed)
    }

    /// Clears every overlay the pipeline may have mounted.
    fn reset_drag_status(&mut self) {
        self.remove_badge();
        self.remove_gather_node();
        self.remove_pixel_map();
        self.remove_event_column();
    }

    fn handle_action_start(&mut self, id: ActuatorId, info: &GestureInfo) {
        self.debug_log_event("pan action start");
        self.reset_response_region(id);
        self.clear_gather(id);
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_drag_prepare_finish = false;
        }
        if self.manager.is_dragging() || self.manager.is_msdp_dragging() {
            self.debug_log_event(format!(
                "already dragging: dragging={} msdp={}",
                self.manager.is_dragging(),
                self.manager.is_msdp_dragging()
            ));
            return;
        }
        let Some(node) = self.node_of(id) else {
            return;
        };
        let is_mouse = info.source_device == SourceType::Mouse;
        let is_restart = self.actuators.get(id.0).is_some_and(|a| a.is_restart_drag);
        if self.manager.pre_drag_status() >= PreDragStatus::PreviewLandingFinished
            || (!is_mouse && !is_restart && self.manager.prepare_drag_node() != Some(node))
        {
            self.debug_log_event("drag preview landed or node not prepared, stop dragging");
            return;
        }
        if self.manager.drag_node_need_clean {
            self.debug_log_event("drag node cleaned by click, stop dragging");
            return;
        }
        let Some(attrs) = self.tree.drag_attrs(node) else {
            self.debug_log_event("drag node has no drag attributes, stop dragging");
            return;
        };
        let (text_draggable, text_selected) = (attrs.text_draggable, attrs.text_selected);
        self.manager.reset_dragging(DragDropState::AboutToPreview);

        if is_mouse {
            self.manager.show_badge_animation = true;
            if text_draggable {
                if !text_selected {
                    self.manager.reset_dragging(DragDropState::Idle);
                    self.debug_log_event("text not selected, stop dragging");
                    return;
                }
                let point = self
                    .actuators
                    .get(id.0)
                    .and_then(|a| a.touch_down_point)
                    .unwrap_or(info.global_location);
                self.handle_text_drag_callback(id, point);
            } else {
                self.hide_event_column();
                self.hide_pixel_map(true, Some(info.global_location), true);
                self.hide_filter();
                self.update_preview_option_from_modifier(id);
            }
        } else if text_draggable {
            if !text_selected {
                self.manager.reset_dragging(DragDropState::Idle);
                self.debug_log_event("text not selected, stop dragging");
                return;
            }
            self.set_text_pixel_map(id);
        } else {
            self.hide_event_column();
            self.hide_filter();
            let applied = self
                .actuators
                .get(id.0)
                .map(|a| a.options_after_applied.clone());
            if let (Some(applied), Some(attrs)) = (applied, self.tree.drag_attrs_mut(node)) {
                attrs.preview_option.options = applied;
            }
        }

        let Some(actuator) = self.actuators.get(id.0) else {
            return;
        };
        let (user, custom) = (actuator.user(), actuator.custom());
        self.manager.start_dragging(node, info.pointer_id);
        self.debug_log_event(format!("drag committed node={node:?} pointer={}", info.pointer_id));
        if let Some(user) = user {
            user.start(info);
        }
        if let Some(custom) = custom {
            custom.start(info);
        }
    }

    fn handle_action_update(&mut self, id: ActuatorId, info: &GestureInfo) {
        let Some(actuator) = self.actuators.get(id.0) else {
            return;
        };
        if let Some(user) = actuator.user() {
            user.update(info);
        }
        if let Some(custom) = actuator.custom() {
            custom.update(info);
        }
    }

    fn handle_action_end(&mut self, id: ActuatorId, info: &GestureInfo) {
        self.debug_log_event("pan action end");
        self.manager.has_gather_node = false;
        if self.manager.is_about_to_preview() {
            self.manager.reset_dragging(DragDropState::Idle);
        }
        self.manager.drag_node_need_clean = false;
        self.manager.disable_default_drop_animation = true;

        let Some(node) = self.node_of(id) else {
            self.remove_pixel_map();
            return;
        };
        self.hide_event_column();
        let text_draggable = self
            .tree
            .drag_attrs(node)
            .is_some_and(|attrs| attrs.text_draggable);
        if text_draggable {
            if let Some(actuator) = self.actuators.get_mut(id.0) {
                actuator.text_pixel_map = None;
            }
            self.hide_text_animation(id, false, None);
        } else {
            self.hide_pixel_map(false, None, true);
        }

        let Some(actuator) = self.actuators.get(id.0) else {
            return;
        };
        let (user, custom) = (actuator.user(), actuator.custom());
        if let Some(user) = user {
            user.end(info);
        }
        if let Some(custom) = custom {
            custom.end(info);
        }
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_not_in_preview_state = false;
        }
    }

    /// Cancel of the whole sequence (or of the lone mouse pan).
    fn handle_action_cancel(&mut self, id: ActuatorId) {
        self.debug_log_event("drag action cancel");
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_drag_prepare_finish = false;
        }
        let Some(node) = self.node_of(id) else {
            return;
        };
        if !self.admit(id, Phase::SequenceCancel) {
            self.debug_log_event("cancel before long-press won, nothing staged");
            return;
        }
        self.reset_response_region(id);
        self.clear_gather(id);

        let Some(attrs) = self.tree.drag_attrs(node) else {
            return;
        };
        let text_draggable = attrs.text_draggable;
        let text_selected = attrs.text_selected;
        let hides_preview = attrs.bind_menu_hides_preview;
        let is_mouse = self
            .actuators
            .get(id.0)
            .is_some_and(|a| a.arbiter.source() == SourceType::Mouse);
        let not_in_preview = self
            .actuators
            .get(id.0)
            .is_some_and(|a| a.is_not_in_preview_state);

        if !self.manager.menu_showing && not_in_preview && !text_draggable {
            self.execute_pre_drag_action(PreDragStatus::ActionCanceledBeforeDrag, Some(node));
        }

        if !hides_preview {
            if text_draggable {
                if text_selected {
                    self.hide_event_column();
                    if let Some(actuator) = self.actuators.get_mut(id.0) {
                        actuator.text_pixel_map = None;
                    }
                    self.hide_text_animation(id, false, None);
                }
            } else {
                let radius = self.tree.render(node).and_then(|props| props.border_radius);
                if let Some(radius) = radius {
                    self.animate(
                        AnimationOption::new(PIXELMAP_ANIMATION_DURATION_MS, Curve::Friction),
                        vec![(node, AnimatedProperty::BorderRadius(radius))],
                        None,
                    );
                }
                self.hide_pixel_map(false, None, true);
                self.hide_filter();
            }
        } else if is_mouse && !text_draggable {
            self.hide_event_column();
            self.hide_pixel_map(false, None, true);
            self.hide_filter();
        }

        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        actuator.is_not_in_preview_state = false;
        let (user, custom) = (actuator.user(), actuator.custom());
        if let Some(user) = user {
            user.cancel();
        }
        if let Some(custom) = custom {
            custom.cancel();
        }
    }

    /// The pan recognizer itself was cancelled. Only nodes that may not drag report it to the
    /// user, since for draggable ones the sequence cancel does.
    pub(super) fn handle_on_pan_action_cancel(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let allowed = self
            .tree
            .drag_attrs(node)
            .is_some_and(|attrs| attrs.is_allowed_drag());
        if allowed {
            return;
        }
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        let Some(user) = actuator.user() else {
            return;
        };
        actuator.is_drag_prepare_finish = false;
        user.cancel();
    }

    fn handle_pan_reject(&mut self, id: ActuatorId) {
        self.debug_log_event("pan reject");
        self.reset_response_region(id);
        let has_gather = self
            .actuators
            .get(id.0)
            .is_some_and(|a| a.gather_node.is_some());
        if self.manager.gather_with_menu || !has_gather {
            return;
        }
        self.clear_gather(id);
        if self.manager.pre_drag_status() <= PreDragStatus::ReadyToTriggerDragAction {
            self.remove_gather_node();
        } else {
            self.remove_gather_node_with_animation();
        }
    }

    /// The 500 ms long-press: the node becomes the prepare-drag node and the drag is ready.
    fn handle_long_press_action(&mut self, id: ActuatorId, info: &GestureInfo) {
        self.debug_log_event("long press 500ms");
        let Some(node) = self.node_of(id) else {
            return;
        };
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_not_in_preview_state = true;
        }
        self.try_trigger_thumbnail_callback(id);

        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        let long_press = (!actuator.is_drag_prepare_finish)
            .then(|| actuator.user())
            .flatten();
        actuator.is_drag_prepare_finish = true;
        let has_context_menu = actuator.has_context_menu;
        if let Some(user) = long_press {
            user.long_press(info);
        }

        self.manager.show_badge_animation = true;
        self.manager.set_prepare_drag_node(Some(node));
        let text_draggable = self
            .tree
            .drag_attrs(node)
            .is_some_and(|attrs| attrs.text_draggable);
        if !text_draggable {
            self.update_preview_option_from_modifier(id);
            self.execute_pre_drag_action(PreDragStatus::ReadyToTriggerDragAction, Some(node));
        }
        if has_context_menu {
            self.set_drag_damp_start_point_info(id, info.global_location, info.pointer_id);
        }
    }

    /// The 800 ms long-press: float the preview and lift it.
    fn handle_preview_long_press_action(&mut self, id: ActuatorId, info: &GestureInfo) {
        self.debug_log_event("long press 800ms");
        if self.overlay.has_pixel_map() {
            return;
        }
        if self.manager.is_about_to_preview()
            || self.manager.is_dragging()
            || self.manager.drag_node_need_clean
        {
            self.debug_log_event(format!(
                "no preview: about_to_preview={} dragging={} need_clean={}",
                self.manager.is_about_to_preview(),
                self.manager.is_dragging(),
                self.manager.drag_node_need_clean
            ));
            return;
        }
        let Some(node) = self.node_of(id) else {
            return;
        };
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_on_before_lifting_animation = false;
        }
        let (Some(kind), Some(attrs)) = (self.tree.kind(node), self.tree.drag_attrs(node)) else {
            return;
        };
        if attrs.bind_menu_hides_preview {
            self.debug_log_event("no preview: bound context menu shows its own");
            return;
        }
        let option = &attrs.preview_option;
        if !self.options.lifting_enabled || !option.is_drag_preview_enabled || option.is_lifting_disabled {
            self.debug_log_event("no preview: lifting disabled");
            return;
        }
        let text_draggable = attrs.text_draggable;
        let text_selected = attrs.text_selected;
        let allowed = attrs.is_allowed_drag();
        let has_context_menu = attrs.has_context_menu;

        if text_draggable {
            if let Some(actuator) = self.actuators.get_mut(id.0) {
                actuator.is_not_in_preview_state = false;
            }
            if text_selected {
                self.set_text_animation(id);
                self.set_event_column(id);
            }
            return;
        }
        if !allowed {
            if let Some(actuator) = self.actuators.get_mut(id.0) {
                actuator.long_press_info = Some(*info);
                actuator.is_received_long_press = true;
            }
            self.debug_log_event("long press stored until the node may drag");
            return;
        }

        self.manager.set_prepare_drag_node(Some(node));
        if kind == NodeKind::Web {
            self.set_filter(id);
        }
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_not_in_preview_state = false;
        }
        self.set_gather_node_above_filter(id);
        self.set_pixel_map(id);
        let Some(image) = self.overlay.pixel_map_image() else {
            return;
        };
        if self.is_need_gather(id) {
            self.play_gather_animation(image);
            self.show_preview_badge_animation(id);
        }

        self.execute_pre_drag_action(PreDragStatus::PreviewLiftStarted, None);
        self.manager.set_dragging_pointer(info.pointer_id);
        self.manager.set_dragging_pressed(true);
        self.animate(
            AnimationOption::new(PIXELMAP_ANIMATION_TIME_MS, Curve::lift_spring()),
            vec![(image, AnimatedProperty::Scale(uniform(PIXELMAP_DRAG_SCALE_MULTIPLE)))],
            Some(DeferredTask::LiftFinished {
                actuator: id,
                pointer_id: info.pointer_id,
                has_context_menu,
            }),
        );
        self.set_event_column(id);
    }

    /// Cancel of a preview long-press that had already fired.
    fn handle_preview_long_press_cancel(&mut self, id: ActuatorId) {
        self.debug_log_event("preview long press cancel");
        self.hide_event_column();
        self.hide_pixel_map(true, None, false);
        self.hide_filter();
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_not_in_preview_state = false;
        }
    }

    fn handle_preview_thumbnail_timer(&mut self, id: ActuatorId) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let text_draggable = self
            .tree
            .drag_attrs(node)
            .is_some_and(|attrs| attrs.text_draggable);
        if !text_draggable {
            self.execute_pre_drag_action(PreDragStatus::ActionDetectingStatus, Some(node));
        }
    }

    /// Early timer of the 500 ms long-press: capture the thumbnail in the background and stage
    /// the before-lifting gather.
    fn handle_thumbnail_timer(&mut self, id: ActuatorId, _point: Pos2) {
        let Some(node) = self.node_of(id) else {
            return;
        };
        let Some(actuator) = self.actuators.get(id.0) else {
            return;
        };
        if actuator.is_thumbnail_triggered {
            return;
        }
        let allowed = self
            .tree
            .drag_attrs(node)
            .is_some_and(|attrs| attrs.is_allowed_drag() && !attrs.text_draggable);
        if !allowed || self.tree.kind(node) == Some(NodeKind::Web) {
            return;
        }
        self.debug_log_event("thumbnail timer");
        self.get_thumbnail_pixel_map(id, false);
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_thumbnail_triggered = true;
        }
    }

    /// Re-runs the drag start for a preview that is already lifted, e.g. after the context menu
    /// let go of it.
    pub fn restart_drag_task(&mut self, id: ActuatorId, info: &GestureInfo) {
        if info.input_event_type == InputEventType::Axis || info.from_axis {
            self.debug_log_event("restart drag ignored: axis input");
            return;
        }
        if self.node_of(id).is_none() {
            return;
        }
        self.update_preview_option_from_modifier(id);
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        actuator.is_restart_drag = true;
        self.debug_log_event("restart drag for lifting status");
        self.handle_action_start(id, info);
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.is_restart_drag = false;
        }
    }

    /// Replays a preview long-press that arrived while the node could not drag yet.
    pub fn start_long_press_action(&mut self, id: ActuatorId) {
        let Some(actuator) = self.actuators.get_mut(id.0) else {
            return;
        };
        if !actuator.is_received_long_press {
            return;
        }
        let Some(info) = actuator.long_press_info else {
            return;
        };
        actuator.is_received_long_press = false;
        self.debug_log_event("replay stored long press");
        self.handle_preview_long_press_action(id, &info);
    }
}
