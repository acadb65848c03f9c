use egui::{Color32, CornerRadius, Shadow, vec2};

use crate::node::{BackgroundEffect, NodeKind, NodeTree};
use crate::preview_option::DragPreviewOption;

use super::PreDragStatus as S;
use super::test_support::{
    Recorder, Seen, center_of, hold_until_lift, press_and_hold, touch, touch_down,
    window_with_images,
};
use super::{AnimatedProperty, GestureCallback, GestureInfo, TouchType};

#[test]
fn hold_reports_ready_then_lifts_and_finishes_next_tick() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    let recorder = Recorder::default();
    let id = pipeline.attach(image, recorder.callbacks());
    let at = center_of(&pipeline, image);

    press_and_hold(&mut pipeline, id, 1, at);
    assert_eq!(recorder.pre_drag(), vec![S::ReadyToTriggerDragAction]);
    assert_eq!(recorder.count(&Seen::LongPress), 1);
    assert_eq!(pipeline.manager().prepare_drag_node(), Some(image));
    assert!(!pipeline.overlay().has_pixel_map());

    hold_until_lift(&mut pipeline, id, 1, at);
    assert_eq!(
        recorder.pre_drag(),
        vec![S::ReadyToTriggerDragAction, S::PreviewLiftStarted]
    );
    let floating = pipeline
        .overlay()
        .pixel_map_image()
        .expect("preview floats after 800 ms");
    assert!(pipeline.overlay().event_column().is_some());
    let lift = pipeline
        .scheduler()
        .transitions_for(floating)
        .find(|t| matches!(t.property, AnimatedProperty::Scale(_)) && t.option.duration_ms == 800)
        .copied()
        .expect("lift scale animation");
    assert_eq!(lift.property, AnimatedProperty::Scale(vec2(1.05, 1.05)));

    pipeline.advance_to(1600);
    assert_eq!(
        recorder.pre_drag(),
        vec![S::ReadyToTriggerDragAction, S::PreviewLiftStarted],
        "lift finished is delivered one tick after the animation ends"
    );
    pipeline.run_pending();
    assert_eq!(
        recorder.pre_drag(),
        vec![
            S::ReadyToTriggerDragAction,
            S::PreviewLiftStarted,
            S::PreviewLiftFinished
        ]
    );
    assert_eq!(pipeline.manager().pre_drag_status(), S::PreviewLiftFinished);
    assert!(pipeline.debug_log_text().contains("long press 800ms"));
}

#[test]
fn touch_up_before_long_press_is_a_quiet_no_op() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    let recorder = Recorder::default();
    let id = pipeline.attach(image, recorder.callbacks());
    let at = center_of(&pipeline, image);

    assert_eq!(touch_down(&mut pipeline, id, 1, at), 2);
    pipeline.advance_to(200);
    touch(&mut pipeline, id, 1, TouchType::Up, at);
    pipeline.advance_to(2000);
    pipeline.settle();

    assert!(recorder.seen().is_empty());
    assert!(pipeline.overlay().is_empty());
    assert!(pipeline.scheduler().transitions().is_empty());
    assert_eq!(pipeline.manager().pre_drag_status(), S::ActionDetectingStatus);
    assert_eq!(pipeline.tree.render(image).map(|p| p.scale), Some(vec2(1.0, 1.0)));
}

#[test]
fn release_during_lift_suppresses_lift_finished() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    let recorder = Recorder::default();
    let id = pipeline.attach(image, recorder.callbacks());
    let at = center_of(&pipeline, image);

    press_and_hold(&mut pipeline, id, 4, at);
    hold_until_lift(&mut pipeline, id, 4, at);
    pipeline.advance_to(1000);
    touch(&mut pipeline, id, 4, TouchType::Up, at);

    pipeline.advance_to(1600);
    pipeline.settle();
    assert_eq!(
        recorder.pre_drag(),
        vec![S::ReadyToTriggerDragAction, S::PreviewLiftStarted]
    );
    assert_eq!(pipeline.manager().pre_drag_status(), S::PreviewLiftStarted);
}

#[test]
fn context_menu_forces_lift_finished_after_release() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    if let Some(attrs) = pipeline.tree.drag_attrs_mut(image) {
        attrs.has_context_menu = true;
    }
    let recorder = Recorder::default();
    let id = pipeline.attach(image, recorder.callbacks());
    let at = center_of(&pipeline, image);

    press_and_hold(&mut pipeline, id, 4, at);
    hold_until_lift(&mut pipeline, id, 4, at);
    touch(&mut pipeline, id, 4, TouchType::Up, at);
    pipeline.advance_to(1600);
    pipeline.settle();

    assert_eq!(
        recorder.pre_drag().last().copied(),
        Some(S::PreviewLiftFinished)
    );
}

#[test]
fn stored_status_never_moves_backwards() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    let recorder = Recorder::default();
    pipeline.attach(image, recorder.callbacks());

    let requests = [
        S::ReadyToTriggerDragAction,
        S::ActionDetectingStatus,
        S::PreviewLiftStarted,
        S::ReadyToTriggerDragAction,
        S::PreviewLiftFinished,
        S::PreviewLiftStarted,
        S::PreviewLandingStarted,
        S::PreviewLandingFinished,
        S::PreviewLiftFinished,
    ];
    let mut stored = Vec::new();
    for status in requests {
        pipeline.execute_pre_drag_action(status, Some(image));
        stored.push(pipeline.manager().pre_drag_status());
    }
    pipeline.settle();

    assert!(stored.windows(2).all(|w| w[0] <= w[1]), "stored={stored:?}");
    assert_eq!(stored.last().copied(), Some(S::PreviewLandingFinished));
    assert_eq!(recorder.pre_drag().len(), requests.len(), "every request notifies");
    assert!(pipeline.manager().drag_node_need_clean, "landing start marks the node");

    pipeline.execute_pre_drag_action(S::ActionCanceledBeforeDrag, Some(image));
    assert_eq!(pipeline.manager().pre_drag_status(), S::ActionCanceledBeforeDrag);
    pipeline.execute_pre_drag_action(S::PreviewLiftStarted, Some(image));
    assert_eq!(pipeline.manager().pre_drag_status(), S::ActionCanceledBeforeDrag);

    pipeline.reset_drag();
    assert_eq!(pipeline.manager().pre_drag_status(), S::ActionDetectingStatus);
}

#[test]
fn teardown_twice_leaves_overlay_unchanged() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    let id = pipeline.attach(image, Recorder::default().callbacks());
    let at = center_of(&pipeline, image);

    let nodes_before = pipeline.tree.len();
    pipeline.hide_event_column();
    pipeline.hide_filter();
    pipeline.hide_pixel_map(false, None, false);
    pipeline.remove_gather_node();
    assert!(pipeline.overlay().is_empty());
    assert_eq!(pipeline.tree.len(), nodes_before);

    press_and_hold(&mut pipeline, id, 1, at);
    hold_until_lift(&mut pipeline, id, 1, at);
    assert!(!pipeline.overlay().is_empty());

    pipeline.hide_event_column();
    pipeline.hide_filter();
    pipeline.hide_pixel_map(false, None, false);
    pipeline.remove_gather_node();
    let first = format!("{:?}", pipeline.overlay());
    let nodes = pipeline.tree.len();

    pipeline.hide_event_column();
    pipeline.hide_filter();
    pipeline.hide_pixel_map(false, None, false);
    pipeline.remove_gather_node();
    assert_eq!(format!("{:?}", pipeline.overlay()), first);
    assert_eq!(pipeline.tree.len(), nodes);
    assert!(pipeline.overlay().is_empty());
}

#[test]
fn modifier_styling_survives_onto_a_fresh_node() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    let shadow = Shadow {
        offset: [2, 4],
        blur: 10,
        spread: 1,
        color: Color32::from_black_alpha(80),
    };
    let effect = BackgroundEffect {
        radius: 12.0,
        saturation: 1.2,
        brightness: 0.9,
        color: Color32::WHITE,
    };
    if let Some(attrs) = pipeline.tree.drag_attrs_mut(image) {
        attrs.preview_option = DragPreviewOption::default().with_modifier(move |props| {
            props.opacity = Some(0.5);
            props.shadow = Some(shadow);
            props.border_radius = Some(CornerRadius::same(6));
            props.background_effect = Some(effect);
        });
    }
    let id = pipeline.attach(image, Recorder::default().callbacks());

    pipeline.update_preview_option_from_modifier(id);
    let fresh = pipeline.tree.create_node(NodeKind::Image);
    pipeline.apply_newest_option_to_node(image, fresh);

    let props = pipeline.tree.render(fresh).expect("fresh node").clone();
    assert_eq!(props.opacity, Some(0.5));
    assert_eq!(props.shadow, Some(shadow));
    assert_eq!(props.border_radius, Some(CornerRadius::same(6)));
    assert_eq!(props.background_effect, Some(effect));
    assert!(props.clip_edge);
    let applied = pipeline.actuator(id).expect("actuator").options_after_applied().clone();
    assert_eq!(applied.opacity, 0.5);
}

#[test]
fn out_of_range_opacity_falls_back_to_default() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    if let Some(attrs) = pipeline.tree.drag_attrs_mut(image) {
        attrs.preview_option = DragPreviewOption {
            is_default_shadow_enabled: true,
            is_default_radius_enabled: true,
            ..Default::default()
        }
        .with_modifier(|props| props.opacity = Some(1.5));
    }
    let id = pipeline.attach(image, Recorder::default().callbacks());

    pipeline.update_preview_option_from_modifier(id);
    let fresh = pipeline.tree.create_node(NodeKind::Image);
    pipeline.apply_newest_option_to_node(image, fresh);

    let props = pipeline.tree.render(fresh).expect("fresh node");
    assert_eq!(props.opacity, Some(0.95));
    assert!(props.shadow.is_some(), "default shadow kept");
    assert_eq!(props.border_radius, Some(CornerRadius::same(12)));
}

#[test]
fn late_callbacks_after_detach_are_dropped() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    let recorder = Recorder::default();
    let id = pipeline.attach(image, recorder.callbacks());
    let at = center_of(&pipeline, image);

    press_and_hold(&mut pipeline, id, 1, at);
    hold_until_lift(&mut pipeline, id, 1, at);
    let seen_before = recorder.seen();
    assert!(pipeline.detach(id));

    pipeline.advance_to(1600);
    pipeline.settle();
    pipeline.dispatch_gesture(id, GestureCallback::PanUpdate(GestureInfo::touch(1, at)));
    pipeline.dispatch_gesture(id, GestureCallback::PanEnd(GestureInfo::touch(1, at)));
    touch(&mut pipeline, id, 1, TouchType::Up, at);

    assert_eq!(recorder.seen(), seen_before);
    assert!(!pipeline.overlay().has_pixel_map(), "late pan end clears the orphan preview");
    assert!(pipeline.actuator(id).is_none());
}

#[test]
fn removed_node_makes_handlers_back_off() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    let recorder = Recorder::default();
    let id = pipeline.attach(image, recorder.callbacks());
    let at = center_of(&pipeline, image);

    press_and_hold(&mut pipeline, id, 1, at);
    pipeline.tree.remove_node(image);
    hold_until_lift(&mut pipeline, id, 1, at);
    pipeline.dispatch_gesture(id, GestureCallback::PanStart(GestureInfo::touch(1, at)));
    pipeline.settle();

    assert!(!pipeline.overlay().has_pixel_map());
    assert!(!pipeline.manager().is_dragging());
    assert_eq!(recorder.count(&Seen::Start(1)), 0);
}

#[test]
fn not_yet_draggable_long_press_is_replayed() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    if let Some(attrs) = pipeline.tree.drag_attrs_mut(image) {
        attrs.draggable = false;
    }
    let recorder = Recorder::default();
    let id = pipeline.attach(image, recorder.callbacks());
    let at = center_of(&pipeline, image);

    press_and_hold(&mut pipeline, id, 1, at);
    assert!(recorder.pre_drag().is_empty(), "a node that may not drag gets no statuses");
    hold_until_lift(&mut pipeline, id, 1, at);
    assert!(!pipeline.overlay().has_pixel_map());
    assert!(pipeline.actuator(id).is_some_and(|a| a.is_received_long_press()));

    if let Some(attrs) = pipeline.tree.drag_attrs_mut(image) {
        attrs.draggable = true;
    }
    pipeline.start_long_press_action(id);
    assert!(pipeline.overlay().has_pixel_map());
    assert!(pipeline.actuator(id).is_some_and(|a| !a.is_received_long_press()));
}

#[test]
fn selected_text_floats_without_pre_drag_statuses() {
    let (mut pipeline, images) = window_with_images(1);
    let text = images[0];
    if let Some(attrs) = pipeline.tree.drag_attrs_mut(text) {
        attrs.text_draggable = true;
        attrs.text_selected = true;
    }
    let recorder = Recorder::default();
    let id = pipeline.attach(text, recorder.callbacks());
    let at = center_of(&pipeline, text);

    press_and_hold(&mut pipeline, id, 1, at);
    hold_until_lift(&mut pipeline, id, 1, at);

    assert!(recorder.pre_drag().is_empty());
    assert!(pipeline.overlay().pixel_map().is_some_and(|p| p.is_text));
    assert!(pipeline.overlay().event_column().is_some());

    pipeline.click_event_column();
    assert!(pipeline.overlay().event_column().is_none());
    assert!(pipeline.manager().drag_node_need_clean);
    pipeline.advance_by(300);
    pipeline.settle();
    assert!(!pipeline.overlay().has_pixel_map());
}

#[test]
fn event_column_click_sinks_the_preview() {
    let (mut pipeline, images) = window_with_images(1);
    let image = images[0];
    let id = pipeline.attach(image, Recorder::default().callbacks());
    let at = center_of(&pipeline, image);

    press_and_hold(&mut pipeline, id, 1, at);
    hold_until_lift(&mut pipeline, id, 1, at);
    pipeline.click_event_column();

    assert!(pipeline.overlay().event_column().is_none());
    assert!(pipeline.overlay().is_pixel_map_removing());
    let origin = pipeline.overlay().pixel_map().map(|p| p.origin);
    let image_node = pipeline.overlay().pixel_map_image().expect("still mounted while sinking");
    assert_eq!(
        pipeline.tree.render(image_node).and_then(|p| p.position),
        origin,
        "sinks back to where it lifted from"
    );

    pipeline.advance_by(300);
    pipeline.settle();
    assert!(!pipeline.overlay().has_pixel_map());
    assert!(!pipeline.tree.contains(image_node));
    assert!(pipeline.tree.contains(image));
}
