use egui::{Pos2, Vec2};

use crate::node::NodeId;

use super::pre_drag::{PreDragStatus, PreDragTransition};

/// Window-wide drag state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DragDropState {
    #[default]
    Idle,

    /// A drag start is being staged (between pan action-start admission and the commit).
    AboutToPreview,
    Dragging,
}

/// Last damped update of a lifted context-menu preview.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MenuPreviewUpdate {
    pub offset: Pos2,
    pub scale: f32,
}

/// Shared per-window drag admission and bookkeeping.
///
/// Every check is advisory: callers read a flag, decide, and write back. Nothing here enforces
/// its own invariants beyond the status ordering of [`Self::apply_pre_drag_status`].
#[derive(Clone, Debug)]
pub struct DragDropManager {
    state: DragDropState,
    msdp_dragging: bool,
    pre_drag_status: PreDragStatus,
    dragging_node: Option<NodeId>,
    prepare_drag_node: Option<NodeId>,
    dragging_pointer: Option<i32>,
    dragging_pressed: bool,

    pub has_gather_node: bool,
    pub drag_node_need_clean: bool,
    pub disable_default_drop_animation: bool,
    pub show_badge_animation: bool,
    pub any_draggable_hit: bool,
    pub drag_filter_showing: bool,
    pub menu_showing: bool,
    pub gather_with_menu: bool,

    /// Scale of the window's content relative to the screen.
    pub window_scale: f32,

    damp_start: Pos2,
    last_drag_move: Option<Pos2>,
    drag_move: Option<Pos2>,
    drag_total_move: Vec2,
    damping_overflow_count: u32,
    menu_preview: Option<MenuPreviewUpdate>,
    finger_points: Vec<(i32, Pos2)>,
}

impl Default for DragDropManager {
    fn default() -> Self {
        Self {
            state: DragDropState::Idle,
            msdp_dragging: false,
            pre_drag_status: PreDragStatus::ActionDetectingStatus,
            dragging_node: None,
            prepare_drag_node: None,
            dragging_pointer: None,
            dragging_pressed: false,
            has_gather_node: false,
            drag_node_need_clean: false,
            disable_default_drop_animation: false,
            show_badge_animation: true,
            any_draggable_hit: false,
            drag_filter_showing: false,
            menu_showing: false,
            gather_with_menu: false,
            window_scale: 1.0,
            damp_start: Pos2::ZERO,
            last_drag_move: None,
            drag_move: None,
            drag_total_move: Vec2::ZERO,
            damping_overflow_count: 0,
            menu_preview: None,
            finger_points: Vec::new(),
        }
    }
}

impl DragDropManager {
    pub fn state(&self) -> DragDropState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == DragDropState::Dragging
    }

    pub fn is_about_to_preview(&self) -> bool {
        self.state == DragDropState::AboutToPreview
    }

    /// An external (cross-process) drag is in flight.
    pub fn is_msdp_dragging(&self) -> bool {
        self.msdp_dragging
    }

    pub fn set_msdp_dragging(&mut self, dragging: bool) {
        self.msdp_dragging = dragging;
    }

    pub fn reset_dragging(&mut self, state: DragDropState) {
        self.state = state;
        if state != DragDropState::Dragging {
            self.dragging_node = None;
        }
    }

    /// Commits the drag of `node`.
    pub fn start_dragging(&mut self, node: NodeId, pointer_id: i32) {
        self.state = DragDropState::Dragging;
        self.dragging_node = Some(node);
        self.dragging_pointer = Some(pointer_id);
    }

    pub fn dragging_node(&self) -> Option<NodeId> {
        self.dragging_node
    }

    pub fn is_global_status_suitable_for_dragging(&self) -> bool {
        !self.is_dragging() && !self.is_msdp_dragging()
    }

    pub fn pre_drag_status(&self) -> PreDragStatus {
        self.pre_drag_status
    }

    /// Overwrites the status, backwards included. Used when a new gesture is collected.
    pub fn set_pre_drag_status(&mut self, status: PreDragStatus) {
        self.pre_drag_status = status;
    }

    /// Applies a requested status, moving forward only.
    pub fn apply_pre_drag_status(&mut self, requested: PreDragStatus) -> PreDragTransition {
        let transition = PreDragTransition::resolve(self.pre_drag_status, requested);
        if let PreDragTransition::Advance(status) = transition {
            self.pre_drag_status = status;
        }
        transition
    }

    pub fn prepare_drag_node(&self) -> Option<NodeId> {
        self.prepare_drag_node
    }

    pub fn set_prepare_drag_node(&mut self, node: Option<NodeId>) {
        self.prepare_drag_node = node;
    }

    pub fn dragging_pointer(&self) -> Option<i32> {
        self.dragging_pointer
    }

    pub fn set_dragging_pointer(&mut self, pointer_id: i32) {
        self.dragging_pointer = Some(pointer_id);
    }

    pub fn is_same_dragging_pointer(&self, pointer_id: i32) -> bool {
        self.dragging_pointer == Some(pointer_id)
    }

    pub fn set_dragging_pressed(&mut self, pressed: bool) {
        self.dragging_pressed = pressed;
    }

    pub fn is_dragging_pressed(&self, pointer_id: i32) -> bool {
        self.dragging_pressed && self.is_same_dragging_pointer(pointer_id)
    }

    /// The finger went up: a pending lift of that pointer must not complete as pressed.
    pub fn release_pointer(&mut self, pointer_id: i32) {
        if self.is_same_dragging_pointer(pointer_id) {
            self.dragging_pressed = false;
        }
    }

    pub fn update_point_info_for_finger(&mut self, finger_id: i32, point: Pos2) {
        match self.finger_points.iter_mut().find(|(id, _)| *id == finger_id) {
            Some(entry) => entry.1 = point,
            None => self.finger_points.push((finger_id, point)),
        }
    }

    pub fn finger_point(&self, finger_id: i32) -> Option<Pos2> {
        self.finger_points
            .iter()
            .find(|(id, _)| *id == finger_id)
            .map(|(_, point)| *point)
    }

    pub fn damp_start_point(&self) -> Pos2 {
        self.damp_start
    }

    pub fn set_damp_start_point(&mut self, point: Pos2) {
        self.damp_start = point;
    }

    /// Forgets the accumulated context-menu drift.
    pub fn reset_context_menu_drag_position(&mut self) {
        self.last_drag_move = None;
        self.drag_move = None;
        self.drag_total_move = Vec2::ZERO;
    }

    /// Feeds the latest damped position; the total move accumulates from the second call on.
    ///
    /// A redrag start drops the previous positions so the jump to the new touch is not counted.
    pub fn update_drag_move_position(&mut self, offset: Pos2, is_redrag_start: bool) {
        if is_redrag_start {
            self.last_drag_move = None;
            self.drag_move = None;
        }
        self.last_drag_move = self.drag_move;
        self.drag_move = Some(offset);
        let Some(last) = self.last_drag_move else {
            return;
        };
        self.drag_total_move += offset - last;
    }

    pub fn drag_total_move(&self) -> Vec2 {
        self.drag_total_move
    }

    pub fn damping_overflow_count(&self) -> u32 {
        self.damping_overflow_count
    }

    pub fn is_damping_overflow(&self) -> bool {
        self.damping_overflow_count > 0
    }

    pub fn latch_damping_overflow(&mut self) {
        self.damping_overflow_count = 1;
    }

    pub fn menu_preview(&self) -> Option<MenuPreviewUpdate> {
        self.menu_preview
    }

    pub fn set_menu_preview(&mut self, update: MenuPreviewUpdate) {
        self.menu_preview = Some(update);
    }

    /// Drag-end reset.
    pub fn reset(&mut self) {
        self.state = DragDropState::Idle;
        self.dragging_node = None;
        self.dragging_pointer = None;
        self.dragging_pressed = false;
        self.damping_overflow_count = 0;
        self.drag_node_need_clean = false;
        self.has_gather_node = false;
        self.finger_points.clear();
        self.menu_preview = None;
        self.pre_drag_status = PreDragStatus::ActionDetectingStatus;
        self.reset_context_menu_drag_position();
    }
}
