use std::fmt;
use std::rc::Rc;

use egui::{CornerRadius, Shadow};

use crate::node::{BackgroundEffect, BlurStyle, RenderProps};

/// Runs against a throwaway node so applications can style the drag preview with the same
/// property setters they use everywhere else.
#[derive(Clone)]
pub struct PreviewModifier(Rc<dyn Fn(&mut RenderProps)>);

impl PreviewModifier {
    pub fn new(apply: impl Fn(&mut RenderProps) + 'static) -> Self {
        Self(Rc::new(apply))
    }

    pub fn apply(&self, props: &mut RenderProps) {
        (self.0)(props);
    }
}

impl fmt::Debug for PreviewModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreviewModifier(..)")
    }
}

/// Effective styling of the floating preview after defaults and the modifier ran.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OptionsAfterApplied {
    pub opacity: f32,
    pub shadow: Option<Shadow>,
    pub border_radius: Option<CornerRadius>,
    pub background_effect: Option<BackgroundEffect>,
    pub blur_style: Option<BlurStyle>,
}

impl Default for OptionsAfterApplied {
    fn default() -> Self {
        Self {
            opacity: crate::drag_event::DEFAULT_OPACITY,
            shadow: None,
            border_radius: None,
            background_effect: None,
            blur_style: None,
        }
    }
}

/// Application-facing drag preview configuration of one node.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DragPreviewOption {
    /// When false, no floating preview is lifted.
    pub is_drag_preview_enabled: bool,

    /// Keeps the preview flat: no lift animation at all.
    pub is_lifting_disabled: bool,
    pub is_default_shadow_enabled: bool,
    pub is_default_radius_enabled: bool,

    /// Grid/list multi-select dragging (gather node and badge).
    pub is_multi_selection_enabled: bool,

    /// Shrink the source node before the preview lifts.
    pub default_animation_before_lifting: bool,

    /// Overrides the badge count. `None` uses the number of dragged items.
    pub custom_badge_number: Option<u32>,

    /// Last computed styling, see [`OptionsAfterApplied`].
    pub options: OptionsAfterApplied,

    #[cfg_attr(feature = "serde", serde(skip))]
    pub on_apply: Option<PreviewModifier>,
}

impl Default for DragPreviewOption {
    fn default() -> Self {
        Self {
            is_drag_preview_enabled: true,
            is_lifting_disabled: false,
            is_default_shadow_enabled: false,
            is_default_radius_enabled: false,
            is_multi_selection_enabled: false,
            default_animation_before_lifting: false,
            custom_badge_number: None,
            options: OptionsAfterApplied::default(),
            on_apply: None,
        }
    }
}

impl DragPreviewOption {
    pub fn with_modifier(mut self, apply: impl Fn(&mut RenderProps) + 'static) -> Self {
        self.on_apply = Some(PreviewModifier::new(apply));
        self
    }

    /// Badge count for `dragged_items` items, if a badge should be shown at all.
    pub fn badge_count(&self, dragged_items: usize) -> Option<u32> {
        let count = self
            .custom_badge_number
            .unwrap_or_else(|| u32::try_from(dragged_items).unwrap_or(u32::MAX));
        (count > 1).then_some(count)
    }
}
