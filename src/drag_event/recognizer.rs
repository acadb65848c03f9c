//! The recognizer surface: what the pipeline arms, and what the host reports back.
//!
//! Recognizers themselves (slop tracking, timers, referee) belong to the host. The pipeline only
//! describes which ones to arm via [`RecognizerSpec`] and receives their outcomes as
//! [`GestureCallback`] messages.

use egui::{Pos2, Vec2};

use super::ActuatorId;
use super::arbiter::Disposal;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceType {
    Touch,
    Mouse,
    Pen,
    Keyboard,
    Unknown,
}

impl SourceType {
    /// Touch and pen go through the long-press sequence, everything else pans directly.
    pub fn is_touch_like(self) -> bool {
        matches!(self, Self::Touch | Self::Pen)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputEventType {
    Touch,
    Mouse,
    Axis,
    Key,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PanDirection {
    #[default]
    All,
    Horizontal,
    Vertical,
    Left,
    Right,
    Up,
    Down,
}

/// The touch (or mouse press) that started hit-testing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    pub id: i32,
    pub global: Pos2,
    pub screen: Pos2,
    pub time_ms: u64,
}

/// Hit-test context handed to [`super::DragPipeline::on_collect_touch_target`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchRestrict {
    pub source_type: SourceType,
    pub input_event_type: InputEventType,
    pub touch_event: TouchPoint,
}

impl TouchRestrict {
    pub fn touch(id: i32, global: Pos2) -> Self {
        Self {
            source_type: SourceType::Touch,
            input_event_type: InputEventType::Touch,
            touch_event: TouchPoint {
                id,
                global,
                screen: global,
                time_ms: 0,
            },
        }
    }

    pub fn mouse(global: Pos2) -> Self {
        Self {
            source_type: SourceType::Mouse,
            input_event_type: InputEventType::Mouse,
            touch_event: TouchPoint {
                id: 0,
                global,
                screen: global,
                time_ms: 0,
            },
        }
    }
}

/// Payload of recognizer callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureInfo {
    pub source_device: SourceType,
    pub input_event_type: InputEventType,
    pub pointer_id: i32,
    pub global_location: Pos2,
    pub screen_location: Pos2,

    /// Synthesized from a wheel/trackpad axis rather than a press.
    pub from_axis: bool,
    pub time_ms: u64,
}

impl GestureInfo {
    pub fn touch(pointer_id: i32, global: Pos2) -> Self {
        Self {
            source_device: SourceType::Touch,
            input_event_type: InputEventType::Touch,
            pointer_id,
            global_location: global,
            screen_location: global,
            from_axis: false,
            time_ms: 0,
        }
    }

    pub fn mouse(global: Pos2) -> Self {
        Self {
            source_device: SourceType::Mouse,
            input_event_type: InputEventType::Mouse,
            pointer_id: 0,
            global_location: global,
            screen_location: global,
            from_axis: false,
            time_ms: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchType {
    Down,
    Up,
    Move,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchLocation {
    pub finger_id: i32,
    pub touch_type: TouchType,
    pub global: Pos2,
    pub screen: Pos2,
}

impl TouchLocation {
    pub fn new(finger_id: i32, touch_type: TouchType, global: Pos2) -> Self {
        Self {
            finger_id,
            touch_type,
            global,
            screen: global,
        }
    }
}

/// One raw touch event, as seen by the touch listener.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TouchEventInfo {
    pub touches: Vec<TouchLocation>,
}

impl TouchEventInfo {
    pub fn single(finger_id: i32, touch_type: TouchType, global: Pos2) -> Self {
        Self {
            touches: vec![TouchLocation::new(finger_id, touch_type, global)],
        }
    }
}

/// Which of an actuator's recognizers a message or disposal refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecognizerSlot {
    /// 500 ms long-press (first member of the touch sequence).
    LongPress,

    /// 800 ms long-press that lifts the preview.
    PreviewLongPress,
    Pan,
    Sequence,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecognizerKind {
    Pan {
        fingers: u32,
        direction: PanDirection,
        distance: f32,
    },
    LongPress {
        duration_ms: u32,
        fingers: u32,

        /// Fires [`GestureCallback::ThumbnailTimer`] / [`GestureCallback::PreviewThumbnailTimer`]
        /// this long after touch-down.
        thumbnail_deadline_ms: Option<u32>,
    },
    Sequence {
        members: Vec<RecognizerSpec>,

        /// Events are handed from one member to the next without re-hit-testing.
        event_handover: bool,
    },
}

/// Description of one recognizer to arm.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognizerSpec {
    pub slot: RecognizerSlot,
    pub kind: RecognizerKind,
    pub coordinate_offset: Vec2,
}

impl RecognizerSpec {
    /// The slots this spec covers, including sequence members.
    pub fn slots(&self) -> Vec<RecognizerSlot> {
        let mut out = vec![self.slot];
        if let RecognizerKind::Sequence { members, .. } = &self.kind {
            for member in members {
                out.extend(member.slots());
            }
        }
        out
    }
}

/// A recognizer armed for one actuator during touch-target collection.
#[derive(Clone, Debug, PartialEq)]
pub struct ArmedRecognizer {
    pub actuator: ActuatorId,
    pub spec: RecognizerSpec,
}

/// A recognizer outcome, reported by the host through
/// [`super::DragPipeline::dispatch_gesture`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureCallback {
    /// 500 ms long-press succeeded.
    LongPressAction(GestureInfo),

    /// Early timer of the 500 ms long-press.
    ThumbnailTimer(Pos2),

    /// 800 ms long-press succeeded.
    PreviewLongPressAction(GestureInfo),

    /// The 800 ms long-press was cancelled after having succeeded.
    PreviewLongPressCancel,

    /// Early timer of the 800 ms long-press.
    PreviewThumbnailTimer(Pos2),

    PanStart(GestureInfo),
    PanUpdate(GestureInfo),
    PanEnd(GestureInfo),

    /// The pan recognizer itself was cancelled.
    PanActionCancel,

    /// The referee rejected the pan recognizer.
    PanReject,

    /// The sequence (or, for mouse, the lone pan) was cancelled.
    SequenceCancel,

    /// Referee outcome for one of the actuator's recognizers.
    Disposal {
        slot: RecognizerSlot,
        disposal: Disposal,
    },
}

impl GestureCallback {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LongPressAction(_) => "long_press_action",
            Self::ThumbnailTimer(_) => "thumbnail_timer",
            Self::PreviewLongPressAction(_) => "preview_long_press_action",
            Self::PreviewLongPressCancel => "preview_long_press_cancel",
            Self::PreviewThumbnailTimer(_) => "preview_thumbnail_timer",
            Self::PanStart(_) => "pan_start",
            Self::PanUpdate(_) => "pan_update",
            Self::PanEnd(_) => "pan_end",
            Self::PanActionCancel => "pan_action_cancel",
            Self::PanReject => "pan_reject",
            Self::SequenceCancel => "sequence_cancel",
            Self::Disposal { .. } => "disposal",
        }
    }
}
