//! Timing, scale and styling constants of the lift pipeline.
//!
//! Lengths suffixed `_VP` are in points (virtual pixels) and get multiplied by
//! `pixels_per_point` before use.

pub const PAN_FINGER: u32 = 1;
pub const PAN_DISTANCE: f32 = 5.0;
pub const MOUSE_PAN_DISTANCE_VP: f32 = 1.0;

pub const LONG_PRESS_DURATION_MS: u32 = 500;
pub const PREVIEW_LONG_PRESS_DURATION_MS: u32 = 800;

/// Early timer of the long-press recognizers (thumbnail capture, detecting notification).
pub const PRE_DRAG_TIMER_DEADLINE_MS: u32 = 50;

pub const PIXELMAP_DRAG_SCALE_MULTIPLE: f32 = 1.05;
pub const PIXELMAP_ANIMATION_TIME_MS: u32 = 800;
pub const PIXELMAP_ANIMATION_DURATION_MS: u32 = 300;

/// Shrink applied to the source (and gather peers) before the preview lifts.
pub const SCALE_NUMBER: f32 = 0.95;

pub const SPRING_RESPONSE: f32 = 0.416;
pub const SPRING_DAMPING_FRACTION: f32 = 0.73;

pub const FILTER_TIMES_MS: u32 = 250;
pub const FILTER_BLUR_RADIUS: f32 = 20.0;

pub const PIXELMAP_BORDER_RADIUS_VP: f32 = 16.0;
pub const PREVIEW_BORDER_RADIUS_VP: f32 = 12.0;

pub const BADGE_RELATIVE_OFFSET_VP: f32 = 8.0;
pub const BADGE_SIZE_VP: f32 = 24.0;
pub const BADGE_DIGIT_WIDTH_VP: f32 = 8.0;

pub const DEFAULT_OPACITY: f32 = 0.95;
pub const MIN_OPACITY: f32 = 0.0;
pub const MAX_OPACITY: f32 = 1.0;

/// Largest shrink of the context-menu preview while the finger drifts before a drag starts.
pub const MENU_DRAG_SCALE: f32 = 0.05;

pub const BLUR_SIGMA_SCALE: f32 = 0.577_35;

pub const FIRST_GATHER_PIXELMAP_OPACITY: f32 = 0.6;
pub const SECOND_GATHER_PIXELMAP_OPACITY: f32 = 0.3;
pub const FIRST_GATHER_PIXELMAP_ANGLE: f32 = 8.0;
pub const SECOND_GATHER_PIXELMAP_ANGLE: f32 = -8.0;

pub const DRAG_START_PAN_DISTANCE_THRESHOLD_VP: f32 = 10.0;
pub const DRAG_START_DAMPING_RATIO: f32 = 0.2;
