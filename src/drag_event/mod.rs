use std::collections::VecDeque;

use egui::{Pos2, Vec2};

use crate::arena::{Arena, Key};
use crate::node::{Bitmap, NodeId, NodeTree, RenderProps};

mod actuator;
mod admission;
mod arbiter;
mod constants;
mod debug;
mod gather;
mod geometry;
mod gesture;
mod manager;
mod options;
mod overlay;
mod pre_drag;
mod preview;
mod recognizer;
mod scheduler;
mod touch;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod lift_tests;
#[cfg(test)]
mod damping_tests;

pub use actuator::{CancelFn, DragCallbacks, DragEventActuator, GestureFn, PreDragFn, ThumbnailFn};
pub use arbiter::Disposal;
pub use constants::*;
pub use gather::GatherNodeChildInfo;
pub use manager::{DragDropManager, DragDropState, MenuPreviewUpdate};
pub use options::{DeviceType, DragGestureOptions, OptionsError};
pub use overlay::{OverlayManager, PixelMapOverlay};
pub use pre_drag::{PreDragStatus, PreDragTransition};
pub use recognizer::{
    ArmedRecognizer, GestureCallback, GestureInfo, InputEventType, PanDirection, RecognizerKind,
    RecognizerSlot, RecognizerSpec, SourceType, TouchEventInfo, TouchLocation, TouchPoint,
    TouchRestrict, TouchType,
};
pub use scheduler::{AnimatedProperty, AnimatedTransition, AnimationOption, Curve, Scheduler};

/// Generational handle to a [`DragEventActuator`] owned by a [`DragPipeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActuatorId(Key);

/// Work deferred to a later tick: posted tasks and animation completions.
///
/// Every variant that names an actuator is dropped silently if that actuator was detached in the
/// meantime.
#[derive(Clone, Debug, PartialEq)]
pub enum DeferredTask {
    /// The lift scale animation ended.
    LiftFinished {
        actuator: ActuatorId,
        pointer_id: i32,
        has_context_menu: bool,
    },

    /// Pre-drag notifications that are delivered one tick late.
    DeliverPreDrag {
        actuator: ActuatorId,
        status: PreDragStatus,
    },

    /// The lift-in transition of the floating image ended.
    PixelMapShown { actuator: ActuatorId, image: NodeId },

    /// Removal animation of the floating image ended.
    RemovePixelMap { column: NodeId },

    DestroyNode(NodeId),

    /// The backdrop blur reached its target.
    FilterSettled { column: NodeId },

    /// Deferred thumbnail capture.
    CaptureThumbnail { actuator: ActuatorId },

    /// Deferred pre-scaling of a captured thumbnail.
    ScalePixelMap {
        actuator: ActuatorId,
        bitmap: Bitmap,
        scale: f32,
    },
}

/// Coordinates drag gestures of every draggable node of one window.
///
/// The pipeline owns the shared [`DragDropManager`], the overlay bookkeeping, the scheduler and
/// all actuators. The host:
/// - attaches an actuator per draggable node ([`Self::attach`]),
/// - calls [`Self::on_collect_touch_target`] during hit-testing and arms the returned recognizers,
/// - reports recognizer outcomes with [`Self::dispatch_gesture`] and raw touches with
///   [`Self::handle_touch_event`],
/// - drives time with [`Self::advance_to`] / [`Self::run_pending`],
/// - calls [`Self::reset_drag`] when a committed drag ends.
///
/// At most one node is ever in the `Dragging` state per pipeline.
pub struct DragPipeline<T: NodeTree> {
    pub options: DragGestureOptions,
    pub tree: T,

    manager: DragDropManager,
    overlay: OverlayManager,
    scheduler: Scheduler<DeferredTask>,
    actuators: Arena<DragEventActuator>,
    actuator_by_node: ahash::HashMap<NodeId, ActuatorId>,

    debug_tick: u64,
    debug_log: VecDeque<String>,
}

impl<T: NodeTree> DragPipeline<T> {
    pub fn new(tree: T) -> Self {
        Self::new_with_options(tree, DragGestureOptions::default())
    }

    /// Out-of-range options are clamped, see [`DragGestureOptions::sanitized`].
    pub fn new_with_options(tree: T, options: DragGestureOptions) -> Self {
        Self {
            options: options.sanitized(),
            tree,
            manager: DragDropManager::default(),
            overlay: OverlayManager::default(),
            scheduler: Scheduler::default(),
            actuators: Arena::default(),
            actuator_by_node: ahash::HashMap::default(),
            debug_tick: 0,
            debug_log: VecDeque::new(),
        }
    }

    /// # Errors
    /// Returns the validation error instead of clamping.
    pub fn try_new_with_options(tree: T, options: DragGestureOptions) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self::new_with_options(tree, options))
    }

    /// Attaches an actuator to `node` using the configured pan parameters.
    ///
    /// A node has at most one actuator; attaching again replaces the callbacks of the existing one.
    pub fn attach(&mut self, node: NodeId, callbacks: DragCallbacks) -> ActuatorId {
        let direction = self.options.pan_direction;
        let fingers = self.options.pan_fingers;
        let distance = self.options.pan_distance;
        self.attach_with(node, direction, fingers, distance, callbacks)
    }

    pub fn attach_with(
        &mut self,
        node: NodeId,
        direction: PanDirection,
        fingers: u32,
        distance: f32,
        callbacks: DragCallbacks,
    ) -> ActuatorId {
        if let Some(&id) = self.actuator_by_node.get(&node) {
            if let Some(actuator) = self.actuators.get_mut(id.0) {
                actuator.direction = direction;
                actuator.fingers = fingers.max(PAN_FINGER);
                actuator.distance = distance.max(PAN_DISTANCE);
                actuator.user_callback = Some(callbacks);
                return id;
            }
        }

        let mut actuator = DragEventActuator::new(node, direction, fingers, distance);
        actuator.user_callback = Some(callbacks);
        let id = ActuatorId(self.actuators.insert(actuator));
        self.actuator_by_node.insert(node, id);
        id
    }

    /// Drops the actuator. Pending tasks and late recognizer callbacks for it become no-ops.
    pub fn detach(&mut self, id: ActuatorId) -> bool {
        let Some(actuator) = self.actuators.remove(id.0) else {
            return false;
        };
        if self.actuator_by_node.get(&actuator.node) == Some(&id) {
            self.actuator_by_node.remove(&actuator.node);
        }
        true
    }

    pub fn actuator(&self, id: ActuatorId) -> Option<&DragEventActuator> {
        self.actuators.get(id.0)
    }

    pub fn actuator_for_node(&self, node: NodeId) -> Option<ActuatorId> {
        self.actuator_by_node
            .get(&node)
            .copied()
            .filter(|id| self.actuators.contains(id.0))
    }

    /// Framework-level callbacks, fired after the user ones.
    pub fn set_custom_callbacks(&mut self, id: ActuatorId, callbacks: DragCallbacks) {
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.custom_callback = Some(callbacks);
        }
    }

    pub fn set_thumbnail_callback(&mut self, id: ActuatorId, callback: impl Fn(Pos2) + 'static) {
        if let Some(actuator) = self.actuators.get_mut(id.0) {
            actuator.thumbnail_callback = Some(std::rc::Rc::new(callback));
        }
    }

    /// Makes `target` behave like `source`: shared user and framework callbacks, its thumbnail
    /// callback and any deferred long-press. `target` keeps its own pan parameters and starts with
    /// no armed recognizers.
    pub fn copy_drag_event(&mut self, target: ActuatorId, source: ActuatorId) {
        let Some(source) = self.actuators.get(source.0) else {
            return;
        };
        let user = source.user_callback.clone();
        let custom = source.custom_callback.clone();
        let thumbnail = source.thumbnail_callback.clone();
        let long_press_info = source.long_press_info;
        let received = source.is_received_long_press;

        let Some(target) = self.actuators.get_mut(target.0) else {
            return;
        };
        target.user_callback = user;
        target.custom_callback = custom;
        target.thumbnail_callback = thumbnail;
        target.long_press_info = long_press_info;
        target.is_received_long_press = received;
        target.armed.clear();
        target.is_not_in_preview_state = false;
    }

    pub fn manager(&self) -> &DragDropManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut DragDropManager {
        &mut self.manager
    }

    pub fn overlay(&self) -> &OverlayManager {
        &self.overlay
    }

    pub fn scheduler(&self) -> &Scheduler<DeferredTask> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<DeferredTask> {
        &mut self.scheduler
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Ends a committed drag: the manager goes back to idle and the pre-drag machine to detecting.
    pub fn reset_drag(&mut self) {
        self.debug_log_event("reset drag");
        self.manager.reset();
    }

    /// Runs everything that was queued before this call. Work queued while running waits for the
    /// next call, which is what "next tick" means here.
    pub fn run_pending(&mut self) {
        self.debug_tick += 1;
        for task in self.scheduler.take_ready() {
            self.run_task(task);
        }
    }

    /// Moves the virtual clock to `now_ms` and runs one tick.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.scheduler.advance_to(now_ms);
        self.run_pending();
    }

    pub fn advance_by(&mut self, delta_ms: u64) {
        let now = self.scheduler.now_ms() + delta_ms;
        self.advance_to(now);
    }

    /// Runs ticks until nothing is ready, without moving the clock.
    pub fn settle(&mut self) {
        for _ in 0..64 {
            if !self.scheduler.has_ready() {
                return;
            }
            self.run_pending();
        }
        log::warn!("drag pipeline did not settle after 64 ticks");
    }

    fn run_task(&mut self, task: DeferredTask) {
        match task {
            DeferredTask::LiftFinished {
                actuator,
                pointer_id,
                has_context_menu,
            } => {
                let Some(node) = self.actuators.get(actuator.0).map(|a| a.node) else {
                    return;
                };
                if self.manager.is_dragging_pressed(pointer_id) || has_context_menu {
                    self.execute_pre_drag_action(PreDragStatus::PreviewLiftFinished, Some(node));
                } else {
                    self.debug_log_event(format!(
                        "lift finished without press pointer={pointer_id}, notification suppressed"
                    ));
                }
            }
            DeferredTask::DeliverPreDrag { actuator, status } => {
                let Some(user) = self.actuators.get(actuator.0).and_then(|a| a.user()) else {
                    return;
                };
                user.pre_drag(status);
            }
            DeferredTask::PixelMapShown { actuator, image } => {
                self.finish_pixel_map_shown(actuator, image);
            }
            DeferredTask::RemovePixelMap { column } => {
                if self.overlay.pixel_map_column() == Some(column) {
                    self.remove_pixel_map();
                }
            }
            DeferredTask::DestroyNode(node) => {
                self.tree.remove_node(node);
            }
            DeferredTask::FilterSettled { column } => {
                if self.overlay.filter_column() == Some(column) {
                    self.overlay.filter_on_animation = false;
                }
            }
            DeferredTask::CaptureThumbnail { actuator } => {
                self.capture_thumbnail(actuator);
            }
            DeferredTask::ScalePixelMap {
                actuator,
                bitmap,
                scale,
            } => {
                if let Some(actuator) = self.actuators.get_mut(actuator.0) {
                    actuator.pre_scaled_pixel_map = Some(bitmap.scaled(scale));
                    actuator.pre_scale_value = scale;
                }
            }
        }
    }

    /// Writes the end values into the tree and hands the transitions to the scheduler.
    fn animate(
        &mut self,
        option: AnimationOption,
        properties: Vec<(NodeId, AnimatedProperty)>,
        on_finish: Option<DeferredTask>,
    ) {
        for (node, property) in &properties {
            if let Some(props) = self.tree.render_mut(*node) {
                apply_property(props, *property);
            }
        }
        self.scheduler.animate(option, properties, on_finish);
    }

    fn node_of(&self, id: ActuatorId) -> Option<NodeId> {
        let node = self.actuators.get(id.0)?.node;
        self.tree.contains(node).then_some(node)
    }

    fn vp_to_px(&self, vp: f32) -> f32 {
        self.options.vp_to_px(vp)
    }
}

fn apply_property(props: &mut RenderProps, property: AnimatedProperty) {
    match property {
        AnimatedProperty::Scale(scale) => props.scale = scale,
        AnimatedProperty::Position(pos) => props.position = Some(pos),
        AnimatedProperty::Opacity(opacity) => props.opacity = Some(opacity),
        AnimatedProperty::Rotation(deg) => props.rotation_deg = deg,
        AnimatedProperty::BorderRadius(radius) => props.border_radius = Some(radius),
        AnimatedProperty::BackBlur(style) => props.back_blur_style = style,
    }
}

impl<T: NodeTree + std::fmt::Debug> std::fmt::Debug for DragPipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragPipeline")
            .field("options", &self.options)
            .field("tree", &self.tree)
            .field("manager", &self.manager)
            .field("overlay", &self.overlay)
            .field("actuators", &self.actuators.len())
            .finish_non_exhaustive()
    }
}

/// Uniform scale helper for the `Scale` property.
fn uniform(scale: f32) -> Vec2 {
    Vec2::splat(scale)
}
