use std::collections::VecDeque;

use egui::{CornerRadius, Pos2, Vec2};

use crate::node::{BlurStyle, NodeId};

use super::constants::{SPRING_DAMPING_FRACTION, SPRING_RESPONSE};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Curve {
    Linear,
    Sharp,
    Friction,
    Smooth,
    ResponsiveSpring {
        response: f32,
        damping_fraction: f32,
    },
}

impl Curve {
    /// The spring every lift animation uses.
    pub fn lift_spring() -> Self {
        Self::ResponsiveSpring {
            response: SPRING_RESPONSE,
            damping_fraction: SPRING_DAMPING_FRACTION,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationOption {
    pub duration_ms: u32,
    pub curve: Curve,
}

impl AnimationOption {
    pub fn new(duration_ms: u32, curve: Curve) -> Self {
        Self { duration_ms, curve }
    }
}

/// The end value of an animated property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimatedProperty {
    Scale(Vec2),
    Position(Pos2),
    Opacity(f32),
    Rotation(f32),
    BorderRadius(CornerRadius),
    BackBlur(Option<BlurStyle>),
}

/// One animated property change, as handed to the animation engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatedTransition {
    pub node: NodeId,
    pub property: AnimatedProperty,
    pub option: AnimationOption,
    pub started_ms: u64,
}

#[derive(Debug)]
struct Delayed<T> {
    due_ms: u64,
    seq: u64,
    task: T,
}

/// Virtual clock plus task queues.
///
/// `post` runs on the next drain, `post_delayed` once the clock reaches its due time, and
/// `animate` records transitions and schedules the completion task at the end of the duration.
#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_seq: u64,
    ready: VecDeque<T>,
    delayed: Vec<Delayed<T>>,
    transitions: Vec<AnimatedTransition>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            ready: VecDeque::new(),
            delayed: Vec::new(),
            transitions: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn post(&mut self, task: T) {
        self.ready.push_back(task);
    }

    pub fn post_delayed(&mut self, task: T, delay_ms: u32) {
        if delay_ms == 0 {
            self.post(task);
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.delayed.push(Delayed {
            due_ms: self.now_ms + u64::from(delay_ms),
            seq,
            task,
        });
    }

    /// Records `properties` as animating with `option` and queues `on_finish` for the end.
    pub fn animate(
        &mut self,
        option: AnimationOption,
        properties: impl IntoIterator<Item = (NodeId, AnimatedProperty)>,
        on_finish: Option<T>,
    ) {
        let started_ms = self.now_ms;
        self.transitions
            .extend(properties.into_iter().map(|(node, property)| AnimatedTransition {
                node,
                property,
                option,
                started_ms,
            }));
        if let Some(task) = on_finish {
            self.post_delayed(task, option.duration_ms);
        }
    }

    /// Moves the clock forward. Tasks that became due are queued in due order.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;
        let mut due: Vec<Delayed<T>> = Vec::new();
        let mut index = 0;
        while index < self.delayed.len() {
            if self.delayed[index].due_ms <= now {
                due.push(self.delayed.swap_remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|delayed| (delayed.due_ms, delayed.seq));
        self.ready.extend(due.into_iter().map(|delayed| delayed.task));
    }

    /// Everything queued so far. Tasks posted while these run wait for the next drain.
    pub fn take_ready(&mut self) -> Vec<T> {
        self.ready.drain(..).collect()
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        !self.ready.is_empty() || !self.delayed.is_empty()
    }

    /// Due time of the earliest delayed task.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.delayed.iter().map(|delayed| delayed.due_ms).min()
    }

    pub fn transitions(&self) -> &[AnimatedTransition] {
        &self.transitions
    }

    pub fn transitions_for(&self, node: NodeId) -> impl Iterator<Item = &AnimatedTransition> {
        self.transitions.iter().filter(move |t| t.node == node)
    }

    pub fn clear_transitions(&mut self) {
        self.transitions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delayed_tasks_run_in_due_order() {
        let mut scheduler = Scheduler::default();
        scheduler.post_delayed("late", 300);
        scheduler.post_delayed("early", 100);
        scheduler.post_delayed("same-as-early", 100);
        scheduler.post("now");

        assert_eq!(scheduler.take_ready(), vec!["now"]);
        scheduler.advance_to(150);
        assert_eq!(scheduler.take_ready(), vec!["early", "same-as-early"]);
        assert_eq!(scheduler.next_due_ms(), Some(300));
        scheduler.advance_to(300);
        assert_eq!(scheduler.take_ready(), vec!["late"]);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut scheduler: Scheduler<()> = Scheduler::default();
        scheduler.advance_to(500);
        scheduler.advance_to(100);
        assert_eq!(scheduler.now_ms(), 500);
    }

    #[test]
    fn animate_records_transitions_and_completion() {
        let mut scheduler = Scheduler::default();
        let node = NodeId::from_parts(3, 0);
        scheduler.animate(
            AnimationOption::new(800, Curve::lift_spring()),
            [(node, AnimatedProperty::Scale(Vec2::splat(1.05)))],
            Some("finished"),
        );
        assert_eq!(scheduler.transitions_for(node).count(), 1);
        scheduler.advance_to(799);
        assert!(scheduler.take_ready().is_empty());
        scheduler.advance_to(800);
        assert_eq!(scheduler.take_ready(), vec!["finished"]);
    }
}
