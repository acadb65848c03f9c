use egui::{Pos2, Vec2, pos2, vec2};

use crate::memory_tree::MemoryTree;
use crate::node::{NodeId, NodeKind, NodeTree};

use super::test_support::{
    Recorder, center_of, hold_until_lift, press_and_hold, rect, test_options, touch,
};
use super::{ActuatorId, DragGestureOptions, DragPipeline, TouchEventInfo, TouchType};

/// ratio 0.25 and threshold 8 at 1 px/pt: overflow once the damped preview moved more than 2 px.
fn damping_options() -> DragGestureOptions {
    DragGestureOptions {
        drag_start_damping_ratio: 0.25,
        drag_start_pan_distance_threshold: 8.0,
        pixels_per_point: 1.0,
        ..test_options()
    }
}

fn menu_image() -> (DragPipeline<MemoryTree>, ActuatorId, Pos2) {
    let mut tree = MemoryTree::new(rect(0.0, 0.0, 400.0, 800.0));
    let root = tree.root();
    let image = tree.add_child(root, NodeKind::Image, rect(100.0, 100.0, 80.0, 60.0));
    if let Some(attrs) = tree.drag_attrs_mut(image) {
        attrs.has_context_menu = true;
    }
    let mut pipeline = DragPipeline::new_with_options(tree, damping_options());
    let id = pipeline.attach(image, Recorder::default().callbacks());
    let at = center_of(&pipeline, image);
    press_and_hold(&mut pipeline, id, 1, at);
    (pipeline, id, at)
}

fn move_to(pipeline: &mut DragPipeline<MemoryTree>, id: ActuatorId, pointer: i32, at: Pos2) {
    touch(pipeline, id, pointer, TouchType::Move, at);
}

#[test]
fn preview_follows_a_quarter_of_the_finger_and_latches_once() {
    let (mut pipeline, id, start) = menu_image();
    assert_eq!(pipeline.manager().damp_start_point(), start);

    let mut offsets = Vec::new();
    let mut scales = Vec::new();
    let mut latched = Vec::new();
    for step in 1..=6 {
        move_to(&mut pipeline, id, 1, start + vec2(4.0 * step as f32, 0.0));
        let preview = pipeline.manager().menu_preview().expect("damped");
        offsets.push(preview.offset.x - start.x);
        scales.push(preview.scale);
        latched.push(pipeline.manager().damping_overflow_count());
    }

    assert_eq!(offsets, vec![1.0, 2.0, 3.0, 4.0, 5.0, 5.0]);
    assert_eq!(scales[0], 1.0);
    assert_eq!(scales[1], 1.0);
    assert!((scales[2] - 0.975).abs() < 1e-6);
    assert!((scales[3] - 0.95).abs() < 1e-6);
    assert!((scales[4] - 0.95).abs() < 1e-6, "clamped at the floor");
    assert_eq!(latched, vec![0, 0, 0, 0, 1, 1]);
    assert_eq!(pipeline.manager().drag_total_move(), vec2(4.0, 0.0));
    assert_eq!(
        pipeline.debug_log_lines().filter(|line| line.contains("damping overflow")).count(),
        1
    );
}

#[test]
fn other_pointers_do_not_move_the_preview() {
    let (mut pipeline, id, start) = menu_image();

    move_to(&mut pipeline, id, 2, start + vec2(40.0, 0.0));

    assert_eq!(pipeline.manager().menu_preview(), None);
    assert_eq!(pipeline.manager().finger_point(2), Some(start + vec2(40.0, 0.0)));
}

#[test]
fn committed_drag_stops_damping() {
    let (mut pipeline, id, start) = menu_image();
    let node = pipeline.actuator(id).map(|a| a.node()).expect("attached");

    pipeline.manager_mut().start_dragging(node, 1);
    move_to(&mut pipeline, id, 1, start + vec2(4.0, 0.0));

    assert_eq!(pipeline.manager().menu_preview(), None);
}

#[test]
fn reset_drag_clears_the_latch() {
    let (mut pipeline, id, start) = menu_image();
    for step in 1..=5 {
        move_to(&mut pipeline, id, 1, start + vec2(4.0 * step as f32, 0.0));
    }
    assert!(pipeline.manager().is_damping_overflow());

    pipeline.reset_drag();

    assert!(!pipeline.manager().is_damping_overflow());
    assert_eq!(pipeline.manager().drag_total_move(), Vec2::ZERO);
    assert_eq!(pipeline.manager().menu_preview(), None);
}

#[test]
fn without_context_menu_moves_are_not_damped() {
    let mut tree = MemoryTree::new(rect(0.0, 0.0, 400.0, 800.0));
    let root = tree.root();
    let image = tree.add_child(root, NodeKind::Image, rect(100.0, 100.0, 80.0, 60.0));
    let mut pipeline = DragPipeline::new_with_options(tree, damping_options());
    let id = pipeline.attach(image, Recorder::default().callbacks());
    let at = center_of(&pipeline, image);
    press_and_hold(&mut pipeline, id, 1, at);

    move_to(&mut pipeline, id, 1, at + vec2(8.0, 0.0));

    assert_eq!(pipeline.manager().menu_preview(), None);
}

#[test]
fn restarted_drag_reanchors_and_skips_the_jump() {
    let (mut pipeline, id, start) = menu_image();
    move_to(&mut pipeline, id, 1, start + vec2(4.0, 0.0));
    move_to(&mut pipeline, id, 1, start + vec2(8.0, 0.0));
    assert_eq!(pipeline.manager().drag_total_move(), vec2(1.0, 0.0));

    let anchor = start + vec2(0.0, 40.0);
    pipeline.handle_restart_drag_touch_event(id, &TouchEventInfo::single(1, TouchType::Down, anchor));
    assert_eq!(pipeline.manager().damp_start_point(), anchor);
    assert_eq!(pipeline.manager().drag_total_move(), Vec2::ZERO);

    pipeline.handle_restart_drag_touch_event(
        id,
        &TouchEventInfo::single(1, TouchType::Move, anchor + vec2(0.0, 4.0)),
    );
    pipeline.handle_restart_drag_touch_event(
        id,
        &TouchEventInfo::single(1, TouchType::Move, anchor + vec2(0.0, 8.0)),
    );
    let preview = pipeline.manager().menu_preview().expect("damped");
    assert_eq!(preview.offset, anchor + vec2(0.0, 2.0));
    assert_eq!(pipeline.manager().drag_total_move(), vec2(0.0, 1.0));
}

/// Two selected context-menu grid items in a window offset by (10, 20), held on the second.
fn held_pair() -> (DragPipeline<MemoryTree>, ActuatorId, Pos2) {
    let mut tree = MemoryTree::new(rect(0.0, 0.0, 400.0, 800.0));
    tree.set_window_offset(vec2(10.0, 20.0));
    let root = tree.root();
    let grid = tree.add_child(root, NodeKind::Grid, rect(0.0, 0.0, 400.0, 400.0));
    let items: Vec<NodeId> = [0.0, 120.0]
        .into_iter()
        .map(|x| {
            let item = tree.add_child(grid, NodeKind::GridItem, rect(x, 0.0, 100.0, 100.0));
            if let Some(attrs) = tree.drag_attrs_mut(item) {
                attrs.selected = true;
                attrs.has_context_menu = true;
                attrs.preview_option.is_multi_selection_enabled = true;
            }
            item
        })
        .collect();
    let mut pipeline = DragPipeline::new_with_options(tree, damping_options());
    let id = pipeline.attach(items[1], Recorder::default().callbacks());
    let at = center_of(&pipeline, items[1]);
    press_and_hold(&mut pipeline, id, 1, at);
    (pipeline, id, at)
}

#[test]
fn gathered_peers_travel_with_the_damped_preview() {
    let (mut pipeline, id, at) = held_pair();
    assert_eq!(pipeline.overlay().gather_children().len(), 1);
    let peer = pipeline.overlay().gather_children()[0];
    assert_eq!(peer.offset, pos2(10.0, 20.0));

    move_to(&mut pipeline, id, 1, at + vec2(8.0, 4.0));

    let props = pipeline.tree.render(peer.image).expect("peer alive");
    assert_eq!(props.translate, vec2(2.0, 1.0));
    assert_eq!(
        props.position,
        Some(peer.offset - pipeline.tree.window_offset()),
        "translated from the window-local spot it was lifted from"
    );
}

#[test]
fn damped_move_after_lift_keeps_the_gathered_position() {
    let (mut pipeline, id, at) = held_pair();
    hold_until_lift(&mut pipeline, id, 1, at);
    let peer = pipeline.overlay().gather_children()[0].image;
    let gathered = pipeline.tree.render(peer).and_then(|props| props.position);

    move_to(&mut pipeline, id, 1, at + vec2(8.0, 4.0));

    let props = pipeline.tree.render(peer).expect("peer alive");
    assert_eq!(props.position, gathered);
    assert_eq!(props.translate, vec2(2.0, 1.0));
}
