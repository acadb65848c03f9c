use std::fmt;

use super::constants::{
    DRAG_START_DAMPING_RATIO, DRAG_START_PAN_DISTANCE_THRESHOLD_VP, LONG_PRESS_DURATION_MS,
    MOUSE_PAN_DISTANCE_VP, PAN_DISTANCE, PAN_FINGER, PREVIEW_LONG_PRESS_DURATION_MS,
};
use super::recognizer::PanDirection;

/// The kind of device the window runs on. Only the backdrop policy depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DeviceType {
    #[default]
    Phone,
    Tablet,
    Desktop,
}

/// Options for [`super::DragPipeline`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DragGestureOptions {
    /// Hold time of the long-press that prepares a drag (READY status, user long-press callback).
    pub long_press_duration_ms: u32,

    /// Hold time of the long-press that lifts the floating preview.
    ///
    /// Must not be shorter than `long_press_duration_ms`.
    pub preview_long_press_duration_ms: u32,

    /// Fingers the pan recognizer requires. Clamped to at least 1.
    pub pan_fingers: u32,

    /// Touch pan slop in pixels. Clamped to at least 5.
    pub pan_distance: f32,
    pub pan_direction: PanDirection,

    /// Mouse pan slop in points.
    pub mouse_pan_distance: f32,

    /// How far (in points) a finger may drift before a lifted context-menu preview turns into a
    /// drag. The damping effect spans `threshold * ratio`.
    pub drag_start_pan_distance_threshold: f32,

    /// Share of the finger movement the damped preview follows, in `(0, 1]`.
    pub drag_start_damping_ratio: f32,

    /// Physical pixels per point.
    pub pixels_per_point: f32,

    /// Used by the backdrop policy.
    pub device_type: DeviceType,

    /// Global switch for the lift stage. When false, long-press never floats a preview.
    pub lifting_enabled: bool,

    /// Record pipeline decisions into a bounded in-memory log, see
    /// [`super::DragPipeline::debug_log_text`].
    pub debug_event_log: bool,

    /// Maximum number of lines kept by the debug event log.
    pub debug_event_log_capacity: usize,
}

impl Default for DragGestureOptions {
    fn default() -> Self {
        Self {
            long_press_duration_ms: LONG_PRESS_DURATION_MS,
            preview_long_press_duration_ms: PREVIEW_LONG_PRESS_DURATION_MS,
            pan_fingers: PAN_FINGER,
            pan_distance: PAN_DISTANCE,
            pan_direction: PanDirection::All,
            mouse_pan_distance: MOUSE_PAN_DISTANCE_VP,
            drag_start_pan_distance_threshold: DRAG_START_PAN_DISTANCE_THRESHOLD_VP,
            drag_start_damping_ratio: DRAG_START_DAMPING_RATIO,
            pixels_per_point: 1.0,
            device_type: DeviceType::default(),
            lifting_enabled: true,
            debug_event_log: false,
            debug_event_log_capacity: 200,
        }
    }
}

/// Reasons [`DragGestureOptions::validate`] rejects a configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsError {
    ZeroFingers,
    PanDistanceTooSmall { distance: f32 },
    PreviewBeforeLongPress { long_press_ms: u32, preview_ms: u32 },
    DampingRatioOutOfRange { ratio: f32 },
    NonPositiveThreshold { threshold: f32 },
    NonPositivePixelsPerPoint { pixels_per_point: f32 },
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroFingers => write!(f, "pan recognizer needs at least one finger"),
            Self::PanDistanceTooSmall { distance } => {
                write!(f, "pan distance {distance} is below the minimum of {PAN_DISTANCE}")
            }
            Self::PreviewBeforeLongPress {
                long_press_ms,
                preview_ms,
            } => write!(
                f,
                "preview long-press ({preview_ms} ms) fires before the drag long-press ({long_press_ms} ms)"
            ),
            Self::DampingRatioOutOfRange { ratio } => {
                write!(f, "damping ratio {ratio} is outside (0, 1]")
            }
            Self::NonPositiveThreshold { threshold } => {
                write!(f, "drag start threshold {threshold} must be positive")
            }
            Self::NonPositivePixelsPerPoint { pixels_per_point } => {
                write!(f, "pixels_per_point {pixels_per_point} must be positive")
            }
        }
    }
}

impl std::error::Error for OptionsError {}

impl DragGestureOptions {
    /// Checks the configuration without changing it.
    ///
    /// # Errors
    /// Returns the first field that is out of range.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.pan_fingers == 0 {
            return Err(OptionsError::ZeroFingers);
        }
        if !(self.pan_distance >= PAN_DISTANCE) {
            return Err(OptionsError::PanDistanceTooSmall {
                distance: self.pan_distance,
            });
        }
        if self.preview_long_press_duration_ms < self.long_press_duration_ms {
            return Err(OptionsError::PreviewBeforeLongPress {
                long_press_ms: self.long_press_duration_ms,
                preview_ms: self.preview_long_press_duration_ms,
            });
        }
        if !(self.drag_start_damping_ratio > 0.0 && self.drag_start_damping_ratio <= 1.0) {
            return Err(OptionsError::DampingRatioOutOfRange {
                ratio: self.drag_start_damping_ratio,
            });
        }
        if !(self.drag_start_pan_distance_threshold > 0.0) {
            return Err(OptionsError::NonPositiveThreshold {
                threshold: self.drag_start_pan_distance_threshold,
            });
        }
        if !(self.pixels_per_point > 0.0) {
            return Err(OptionsError::NonPositivePixelsPerPoint {
                pixels_per_point: self.pixels_per_point,
            });
        }
        Ok(())
    }

    /// Clamps every field into range. The result always passes [`Self::validate`].
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.pan_fingers = self.pan_fingers.max(PAN_FINGER);
        if !(self.pan_distance >= PAN_DISTANCE) {
            self.pan_distance = PAN_DISTANCE;
        }
        self.preview_long_press_duration_ms = self
            .preview_long_press_duration_ms
            .max(self.long_press_duration_ms);
        if !(self.drag_start_damping_ratio > 0.0 && self.drag_start_damping_ratio <= 1.0) {
            self.drag_start_damping_ratio = defaults.drag_start_damping_ratio;
        }
        if !(self.drag_start_pan_distance_threshold > 0.0) {
            self.drag_start_pan_distance_threshold = defaults.drag_start_pan_distance_threshold;
        }
        if !(self.pixels_per_point > 0.0) {
            self.pixels_per_point = defaults.pixels_per_point;
        }
        self
    }

    /// Points to physical pixels.
    pub fn vp_to_px(&self, vp: f32) -> f32 {
        vp * self.pixels_per_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(DragGestureOptions::default().validate(), Ok(()));
    }

    #[test]
    fn validate_reports_first_bad_field() {
        let options = DragGestureOptions {
            pan_fingers: 0,
            pan_distance: 1.0,
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(OptionsError::ZeroFingers));

        let options = DragGestureOptions {
            long_press_duration_ms: 900,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(OptionsError::PreviewBeforeLongPress { .. })
        ));

        let options = DragGestureOptions {
            drag_start_damping_ratio: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(OptionsError::DampingRatioOutOfRange { .. })
        ));
    }

    #[test]
    fn sanitized_clamps_into_range() {
        let options = DragGestureOptions {
            pan_fingers: 0,
            pan_distance: 2.0,
            long_press_duration_ms: 900,
            drag_start_damping_ratio: 3.0,
            pixels_per_point: 0.0,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(options.pan_fingers, 1);
        assert_eq!(options.pan_distance, PAN_DISTANCE);
        assert_eq!(options.preview_long_press_duration_ms, 900);
        assert_eq!(options.drag_start_damping_ratio, DRAG_START_DAMPING_RATIO);
        assert_eq!(options.pixels_per_point, 1.0);
        assert_eq!(options.validate(), Ok(()));
    }

    #[test]
    fn error_messages_are_readable() {
        let err = OptionsError::DampingRatioOutOfRange { ratio: 2.0 };
        assert_eq!(err.to_string(), "damping ratio 2 is outside (0, 1]");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn ron_round_trip_keeps_every_field() {
        let options = DragGestureOptions {
            long_press_duration_ms: 450,
            pan_direction: PanDirection::Vertical,
            device_type: DeviceType::Tablet,
            debug_event_log: true,
            ..Default::default()
        };
        let text = ron::to_string(&options).expect("serialize");
        let back: DragGestureOptions = ron::from_str(&text).expect("deserialize");
        assert_eq!(back, options);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_missing_fields_fall_back_to_defaults() {
        let options: DragGestureOptions =
            serde_json::from_str(r#"{ "pixels_per_point": 2.0 }"#).expect("deserialize");
        assert_eq!(options.pixels_per_point, 2.0);
        assert_eq!(options.long_press_duration_ms, LONG_PRESS_DURATION_MS);
        assert!(options.lifting_enabled);
    }
}
