use crate::node::{NodeId, NodeTree};

use super::{DeferredTask, DragPipeline};

/// Pre-drag lifecycle reported to `on_pre_drag`.
///
/// Ordered: the machine only moves forward until a new gesture is collected or the drag is
/// reset. `ActionCanceledBeforeDrag` is terminal and sorts last, so once reached every further
/// request only notifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PreDragStatus {
    ActionDetectingStatus,
    ReadyToTriggerDragAction,
    PreviewLiftStarted,
    PreviewLiftFinished,
    PreviewLandingStarted,
    PreviewLandingFinished,
    ActionCanceledBeforeDrag,
}

impl PreDragStatus {
    /// Statuses whose notification is posted to the next tick instead of fired inline.
    pub fn is_delivered_next_tick(self) -> bool {
        matches!(self, Self::PreviewLiftFinished | Self::PreviewLandingFinished)
    }
}

/// What applying a requested status did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreDragTransition {
    /// The stored status moved forward to this value; the value is notified.
    Advance(PreDragStatus),

    /// The request was not ahead of the stored status: the stored status stays, the requested
    /// value is still notified.
    Notify(PreDragStatus),
}

impl PreDragTransition {
    pub fn resolve(current: PreDragStatus, requested: PreDragStatus) -> Self {
        if requested > current {
            Self::Advance(requested)
        } else {
            Self::Notify(requested)
        }
    }

    /// The status handed to `on_pre_drag`.
    pub fn notified(self) -> PreDragStatus {
        match self {
            Self::Advance(status) | Self::Notify(status) => status,
        }
    }

    pub fn is_advance(self) -> bool {
        matches!(self, Self::Advance(_))
    }
}

impl<T: NodeTree> DragPipeline<T> {
    /// Moves the pre-drag machine for `node` (or the prepare-drag node) and notifies its owner.
    ///
    /// Nothing happens while a drag is committed, for nodes that may not drag, and for text drags.
    /// Hosts call this directly for the landing statuses.
    pub fn execute_pre_drag_action(&mut self, status: PreDragStatus, node: Option<NodeId>) {
        if self.manager.is_dragging() || self.manager.is_msdp_dragging() {
            return;
        }
        let Some(node) = node.or(self.manager.prepare_drag_node()) else {
            return;
        };
        let Some(attrs) = self.tree.drag_attrs(node) else {
            return;
        };
        if !attrs.is_allowed_drag() || attrs.text_draggable {
            return;
        }

        let actuator = self.actuator_for_node(node);
        if let Some(actuator) = actuator.and_then(|id| self.actuators.get_mut(id.0)) {
            actuator.last_notified_status = Some(status);
        }
        if status == PreDragStatus::PreviewLandingStarted {
            self.manager.drag_node_need_clean = true;
        }

        let transition = self.manager.apply_pre_drag_status(status);
        self.debug_log_event(format!(
            "pre-drag {status:?} -> {transition:?} stored={:?}",
            self.manager.pre_drag_status()
        ));

        let Some(actuator) = actuator else {
            return;
        };
        let notified = transition.notified();
        if notified.is_delivered_next_tick() {
            self.scheduler.post(DeferredTask::DeliverPreDrag {
                actuator,
                status: notified,
            });
        } else if let Some(user) = self.actuators.get(actuator.0).and_then(|a| a.user()) {
            user.pre_drag(notified);
        }
    }
}
