use std::fmt;
use std::rc::Rc;

use egui::{Pos2, Rect};

use crate::node::{Bitmap, NodeId};
use crate::preview_option::OptionsAfterApplied;

use super::arbiter::GestureArbiter;
use super::constants::{PAN_DISTANCE, PAN_FINGER};
use super::gather::GatherNodeChildInfo;
use super::pre_drag::PreDragStatus;
use super::recognizer::{ArmedRecognizer, GestureInfo, PanDirection};

pub type GestureFn = Rc<dyn Fn(&GestureInfo)>;
pub type CancelFn = Rc<dyn Fn()>;
pub type PreDragFn = Rc<dyn Fn(PreDragStatus)>;

/// Called with the touch-down point when a text drag wants its selection floated.
pub type ThumbnailFn = Rc<dyn Fn(Pos2)>;

/// Drag callbacks of one node.
///
/// Cloning shares the closures.
#[derive(Clone, Default)]
pub struct DragCallbacks {
    pub action_start: Option<GestureFn>,
    pub action_update: Option<GestureFn>,
    pub action_end: Option<GestureFn>,
    pub action_cancel: Option<CancelFn>,
    pub long_press: Option<GestureFn>,
    pub on_pre_drag: Option<PreDragFn>,
}

impl fmt::Debug for DragCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragCallbacks")
            .field("action_start", &self.action_start.is_some())
            .field("action_update", &self.action_update.is_some())
            .field("action_end", &self.action_end.is_some())
            .field("action_cancel", &self.action_cancel.is_some())
            .field("long_press", &self.long_press.is_some())
            .field("on_pre_drag", &self.on_pre_drag.is_some())
            .finish()
    }
}

impl DragCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_action_start(mut self, f: impl Fn(&GestureInfo) + 'static) -> Self {
        self.action_start = Some(Rc::new(f));
        self
    }

    pub fn on_action_update(mut self, f: impl Fn(&GestureInfo) + 'static) -> Self {
        self.action_update = Some(Rc::new(f));
        self
    }

    pub fn on_action_end(mut self, f: impl Fn(&GestureInfo) + 'static) -> Self {
        self.action_end = Some(Rc::new(f));
        self
    }

    pub fn on_action_cancel(mut self, f: impl Fn() + 'static) -> Self {
        self.action_cancel = Some(Rc::new(f));
        self
    }

    pub fn on_long_press(mut self, f: impl Fn(&GestureInfo) + 'static) -> Self {
        self.long_press = Some(Rc::new(f));
        self
    }

    pub fn on_pre_drag(mut self, f: impl Fn(PreDragStatus) + 'static) -> Self {
        self.on_pre_drag = Some(Rc::new(f));
        self
    }

    pub(super) fn start(&self, info: &GestureInfo) {
        if let Some(f) = &self.action_start {
            f(info);
        }
    }

    pub(super) fn update(&self, info: &GestureInfo) {
        if let Some(f) = &self.action_update {
            f(info);
        }
    }

    pub(super) fn end(&self, info: &GestureInfo) {
        if let Some(f) = &self.action_end {
            f(info);
        }
    }

    pub(super) fn cancel(&self) {
        if let Some(f) = &self.action_cancel {
            f();
        }
    }

    pub(super) fn long_press(&self, info: &GestureInfo) {
        if let Some(f) = &self.long_press {
            f(info);
        }
    }

    pub(super) fn pre_drag(&self, status: PreDragStatus) {
        if let Some(f) = &self.on_pre_drag {
            f(status);
        }
    }
}

/// Per-node drag gesture state.
///
/// Owned by [`super::DragPipeline`] and addressed through an [`super::ActuatorId`]; the node it
/// serves is a non-owning [`NodeId`] that every handler re-resolves.
pub struct DragEventActuator {
    pub(super) node: NodeId,
    pub(super) direction: PanDirection,
    pub(super) fingers: u32,
    pub(super) distance: f32,

    pub(super) user_callback: Option<DragCallbacks>,
    pub(super) custom_callback: Option<DragCallbacks>,
    pub(super) thumbnail_callback: Option<ThumbnailFn>,

    pub(super) armed: Vec<ArmedRecognizer>,
    pub(super) arbiter: GestureArbiter,
    pub(super) has_touch_listener: bool,
    pub(super) has_context_menu: bool,

    pub(super) gather_node: Option<NodeId>,
    pub(super) gather_children: Vec<GatherNodeChildInfo>,
    pub(super) item_parent: Option<NodeId>,
    pub(super) is_selected_item_node: bool,

    pub(super) is_not_in_preview_state: bool,
    pub(super) is_on_before_lifting_animation: bool,
    pub(super) is_response_region_full: bool,
    pub(super) saved_response_region: Vec<Rect>,

    pub(super) pixel_map: Option<Bitmap>,
    pub(super) text_pixel_map: Option<Bitmap>,
    pub(super) pre_scaled_pixel_map: Option<Bitmap>,
    pub(super) pre_scale_value: f32,

    pub(super) is_drag_prepare_finish: bool,
    pub(super) is_thumbnail_triggered: bool,
    pub(super) last_touch_finger_id: i32,
    pub(super) touch_down_point: Option<Pos2>,

    pub(super) long_press_info: Option<GestureInfo>,
    pub(super) is_received_long_press: bool,
    pub(super) is_redrag_start: bool,
    pub(super) is_restart_drag: bool,
    pub(super) last_notified_status: Option<PreDragStatus>,
    pub(super) options_after_applied: OptionsAfterApplied,
}

impl fmt::Debug for DragEventActuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragEventActuator")
            .field("node", &self.node)
            .field("direction", &self.direction)
            .field("fingers", &self.fingers)
            .field("distance", &self.distance)
            .field("user_callback", &self.user_callback)
            .field("custom_callback", &self.custom_callback)
            .field("thumbnail_callback", &self.thumbnail_callback.is_some())
            .field("arbiter", &self.arbiter)
            .field("gather_node", &self.gather_node)
            .field("gather_children", &self.gather_children.len())
            .field("is_restart_drag", &self.is_restart_drag)
            .field("last_notified_status", &self.last_notified_status)
            .finish_non_exhaustive()
    }
}

impl DragEventActuator {
    /// Fingers are clamped to at least one and the pan distance to at least 5.
    pub(super) fn new(node: NodeId, direction: PanDirection, fingers: u32, distance: f32) -> Self {
        Self {
            node,
            direction,
            fingers: fingers.max(PAN_FINGER),
            distance: if distance >= PAN_DISTANCE {
                distance
            } else {
                PAN_DISTANCE
            },
            user_callback: None,
            custom_callback: None,
            thumbnail_callback: None,
            armed: Vec::new(),
            arbiter: GestureArbiter::default(),
            has_touch_listener: false,
            has_context_menu: false,
            gather_node: None,
            gather_children: Vec::new(),
            item_parent: None,
            is_selected_item_node: false,
            is_not_in_preview_state: false,
            is_on_before_lifting_animation: false,
            is_response_region_full: false,
            saved_response_region: Vec::new(),
            pixel_map: None,
            text_pixel_map: None,
            pre_scaled_pixel_map: None,
            pre_scale_value: 1.0,
            is_drag_prepare_finish: false,
            is_thumbnail_triggered: false,
            last_touch_finger_id: 0,
            touch_down_point: None,
            long_press_info: None,
            is_received_long_press: false,
            is_redrag_start: false,
            is_restart_drag: false,
            last_notified_status: None,
            options_after_applied: OptionsAfterApplied::default(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn direction(&self) -> PanDirection {
        self.direction
    }

    pub fn fingers(&self) -> u32 {
        self.fingers
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Recognizers armed by the last touch-target collection.
    pub fn armed(&self) -> &[ArmedRecognizer] {
        &self.armed
    }

    pub fn gather_node(&self) -> Option<NodeId> {
        self.gather_node
    }

    pub fn gather_children(&self) -> &[GatherNodeChildInfo] {
        &self.gather_children
    }

    pub fn is_selected_item_node(&self) -> bool {
        self.is_selected_item_node
    }

    pub fn item_parent(&self) -> Option<NodeId> {
        self.item_parent
    }

    /// The 500 ms long-press fired but the preview has not lifted yet.
    pub fn is_not_in_preview_state(&self) -> bool {
        self.is_not_in_preview_state
    }

    pub fn is_on_before_lifting_animation(&self) -> bool {
        self.is_on_before_lifting_animation
    }

    pub fn is_response_region_full(&self) -> bool {
        self.is_response_region_full
    }

    pub fn pixel_map(&self) -> Option<&Bitmap> {
        self.pixel_map.as_ref()
    }

    pub fn pre_scaled_pixel_map(&self) -> Option<&Bitmap> {
        self.pre_scaled_pixel_map.as_ref()
    }

    pub fn pre_scale_value(&self) -> f32 {
        self.pre_scale_value
    }

    pub fn is_thumbnail_triggered(&self) -> bool {
        self.is_thumbnail_triggered
    }

    pub fn is_received_long_press(&self) -> bool {
        self.is_received_long_press
    }

    pub fn has_touch_listener(&self) -> bool {
        self.has_touch_listener
    }

    pub fn touch_down_point(&self) -> Option<Pos2> {
        self.touch_down_point
    }

    pub fn last_touch_finger_id(&self) -> i32 {
        self.last_touch_finger_id
    }

    /// Last status this actuator asked the pre-drag machine for.
    pub fn last_notified_status(&self) -> Option<PreDragStatus> {
        self.last_notified_status
    }

    pub fn options_after_applied(&self) -> &OptionsAfterApplied {
        &self.options_after_applied
    }

    pub(super) fn user(&self) -> Option<DragCallbacks> {
        self.user_callback.clone()
    }

    pub(super) fn custom(&self) -> Option<DragCallbacks> {
        self.custom_callback.clone()
    }
}
