use itertools::Itertools as _;

use crate::node::NodeTree;

use super::DragPipeline;

impl<T: NodeTree> DragPipeline<T> {
    pub(super) fn debug_log_event(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{message}");
        if !self.options.debug_event_log {
            return;
        }
        self.push_debug_log_line(message);
    }

    pub(super) fn push_debug_log_line(&mut self, message: String) {
        let cap = self.options.debug_event_log_capacity.max(1).min(10_000);
        while self.debug_log.len() >= cap {
            self.debug_log.pop_front();
        }
        self.debug_log
            .push_back(format!("[tick {}] {}", self.debug_tick, message));
    }

    /// The recorded event log, oldest line first.
    pub fn debug_log_text(&self) -> String {
        self.debug_log.iter().join("\n")
    }

    pub fn debug_log_lines(&self) -> impl Iterator<Item = &str> {
        self.debug_log.iter().map(String::as_str)
    }

    pub fn debug_log_clear(&mut self) {
        self.debug_log.clear();
    }
}

#[cfg(test)]
mod tests {
    use egui::{Rect, pos2, vec2};

    use crate::memory_tree::MemoryTree;

    use super::super::DragGestureOptions;
    use super::*;

    fn pipeline(capacity: usize, enabled: bool) -> DragPipeline<MemoryTree> {
        let tree = MemoryTree::new(Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0)));
        DragPipeline::new_with_options(
            tree,
            DragGestureOptions {
                debug_event_log: enabled,
                debug_event_log_capacity: capacity,
                ..Default::default()
            },
        )
    }

    #[test]
    fn ring_buffer_keeps_newest_lines() {
        let mut pipeline = pipeline(2, true);
        pipeline.debug_log_event("a");
        pipeline.run_pending();
        pipeline.debug_log_event("b");
        pipeline.debug_log_event("c");

        assert_eq!(pipeline.debug_log_text(), "[tick 1] b\n[tick 1] c");
        pipeline.debug_log_clear();
        assert_eq!(pipeline.debug_log_lines().count(), 0);
    }

    #[test]
    fn zero_capacity_still_keeps_one_line() {
        let mut pipeline = pipeline(0, true);
        pipeline.debug_log_event("a");
        pipeline.debug_log_event("b");
        assert_eq!(pipeline.debug_log_text(), "[tick 0] b");
    }

    #[test]
    fn disabled_log_records_nothing() {
        let mut pipeline = pipeline(10, false);
        pipeline.debug_log_event("a");
        assert!(pipeline.debug_log_text().is_empty());
    }
}
