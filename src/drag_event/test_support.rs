use std::cell::RefCell;
use std::rc::Rc;

use egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::memory_tree::MemoryTree;
use crate::node::{NodeId, NodeKind, NodeTree};

use super::{
    ActuatorId, DragCallbacks, DragGestureOptions, DragPipeline, GestureCallback, GestureInfo,
    PreDragStatus, TouchEventInfo, TouchRestrict, TouchType,
};

/// What the application saw, in order.
#[derive(Clone, Debug, PartialEq)]
pub(super) enum Seen {
    Start(i32),
    Update,
    End,
    Cancel,
    LongPress,
    PreDrag(PreDragStatus),
}

#[derive(Clone, Default)]
pub(super) struct Recorder(Rc<RefCell<Vec<Seen>>>);

impl Recorder {
    pub(super) fn callbacks(&self) -> DragCallbacks {
        let start = self.0.clone();
        let update = self.0.clone();
        let end = self.0.clone();
        let cancel = self.0.clone();
        let long_press = self.0.clone();
        let pre_drag = self.0.clone();
        DragCallbacks::new()
            .on_action_start(move |info| start.borrow_mut().push(Seen::Start(info.pointer_id)))
            .on_action_update(move |_| update.borrow_mut().push(Seen::Update))
            .on_action_end(move |_| end.borrow_mut().push(Seen::End))
            .on_action_cancel(move || cancel.borrow_mut().push(Seen::Cancel))
            .on_long_press(move |_| long_press.borrow_mut().push(Seen::LongPress))
            .on_pre_drag(move |status| pre_drag.borrow_mut().push(Seen::PreDrag(status)))
    }

    pub(super) fn seen(&self) -> Vec<Seen> {
        self.0.borrow().clone()
    }

    pub(super) fn pre_drag(&self) -> Vec<PreDragStatus> {
        self.0
            .borrow()
            .iter()
            .filter_map(|seen| match seen {
                Seen::PreDrag(status) => Some(*status),
                _ => None,
            })
            .collect()
    }

    pub(super) fn count(&self, wanted: &Seen) -> usize {
        self.0.borrow().iter().filter(|seen| *seen == wanted).count()
    }
}

pub(super) fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::from_min_size(pos2(x, y), vec2(w, h))
}

/// Routes `log` output through the test harness; repeated calls are fine.
pub(super) fn init_logger() {
    let _: Result<(), _> = env_logger::builder().is_test(true).try_init();
}

pub(super) fn test_options() -> DragGestureOptions {
    init_logger();
    DragGestureOptions {
        debug_event_log: true,
        ..Default::default()
    }
}

/// A 400x800 window with one column holding `count` images stacked vertically.
pub(super) fn window_with_images(count: usize) -> (DragPipeline<MemoryTree>, Vec<NodeId>) {
    let mut tree = MemoryTree::new(rect(0.0, 0.0, 400.0, 800.0));
    let root = tree.root();
    let column = tree.add_child(root, NodeKind::Column, rect(0.0, 0.0, 400.0, 800.0));
    let images = (0..count)
        .map(|i| {
            let top = 100.0 + 120.0 * i as f32;
            tree.add_child(column, NodeKind::Image, rect(100.0, top, 80.0, 60.0))
        })
        .collect();
    (DragPipeline::new_with_options(tree, test_options()), images)
}

pub(super) fn center_of<T: NodeTree>(pipeline: &DragPipeline<T>, node: NodeId) -> Pos2 {
    pipeline
        .tree
        .frame_rect(node)
        .expect("node has a frame")
        .center()
}

/// Touch-down on the actuator's node: collection plus the touch listener.
pub(super) fn touch_down<T: NodeTree>(
    pipeline: &mut DragPipeline<T>,
    id: ActuatorId,
    pointer: i32,
    at: Pos2,
) -> usize {
    let restrict = TouchRestrict::touch(pointer, at);
    let armed = pipeline.on_collect_touch_target(id, Vec2::ZERO, &restrict);
    pipeline.add_touch_listener(id, &restrict);
    armed.len()
}

/// Touch-down and a 500 ms hold.
pub(super) fn press_and_hold<T: NodeTree>(
    pipeline: &mut DragPipeline<T>,
    id: ActuatorId,
    pointer: i32,
    at: Pos2,
) {
    let armed = touch_down(pipeline, id, pointer, at);
    assert!(armed > 0, "touch-down must arm recognizers");
    let now = pipeline.now_ms();
    pipeline.advance_to(now + 500);
    pipeline.dispatch_gesture(id, GestureCallback::LongPressAction(GestureInfo::touch(pointer, at)));
}

/// Keeps holding until the 800 ms preview long-press fires.
pub(super) fn hold_until_lift<T: NodeTree>(
    pipeline: &mut DragPipeline<T>,
    id: ActuatorId,
    pointer: i32,
    at: Pos2,
) {
    let now = pipeline.now_ms();
    pipeline.advance_to(now + 300);
    pipeline.dispatch_gesture(
        id,
        GestureCallback::PreviewLongPressAction(GestureInfo::touch(pointer, at)),
    );
}

pub(super) fn touch<T: NodeTree>(
    pipeline: &mut DragPipeline<T>,
    id: ActuatorId,
    pointer: i32,
    touch_type: TouchType,
    at: Pos2,
) {
    pipeline.handle_touch_event(id, &TouchEventInfo::single(pointer, touch_type, at));
}
