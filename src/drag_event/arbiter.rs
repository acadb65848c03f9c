use super::recognizer::{RecognizerSlot, SourceType};

/// Referee outcome of one recognizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Disposal {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// Callback phases the arbiter rules on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(super) enum Phase {
    LongPressAction,
    PreviewLongPressAction,
    PanStart,
    SequenceCancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Verdict {
    Proceed,
    Ignore,
}

/// Tracks how the actuator's recognizers raced and decides which late callbacks still count.
///
/// | phase                      | mouse   | touch / pen                          |
/// |----------------------------|---------|--------------------------------------|
/// | long-press action          | ignore  | proceed unless long-press rejected   |
/// | preview long-press action  | ignore  | proceed unless pan rejected          |
/// | pan start                  | proceed | proceed only after long-press won    |
/// | sequence cancel            | proceed | proceed only after long-press won    |
#[derive(Clone, Debug)]
pub(super) struct GestureArbiter {
    source: SourceType,
    long_press: Disposal,
    preview_long_press: Disposal,
    pan: Disposal,
    sequence: Disposal,
}

impl Default for GestureArbiter {
    fn default() -> Self {
        Self {
            source: SourceType::Unknown,
            long_press: Disposal::Pending,
            preview_long_press: Disposal::Pending,
            pan: Disposal::Pending,
            sequence: Disposal::Pending,
        }
    }
}

impl GestureArbiter {
    /// Starts a new race for a gesture from `source`.
    pub(super) fn reset(&mut self, source: SourceType) {
        *self = Self {
            source,
            ..Self::default()
        };
    }

    pub(super) fn source(&self) -> SourceType {
        self.source
    }

    pub(super) fn record(&mut self, slot: RecognizerSlot, disposal: Disposal) {
        match slot {
            RecognizerSlot::LongPress => self.long_press = disposal,
            RecognizerSlot::PreviewLongPress => self.preview_long_press = disposal,
            RecognizerSlot::Pan => self.pan = disposal,
            RecognizerSlot::Sequence => self.sequence = disposal,
        }
    }

    pub(super) fn disposal(&self, slot: RecognizerSlot) -> Disposal {
        match slot {
            RecognizerSlot::LongPress => self.long_press,
            RecognizerSlot::PreviewLongPress => self.preview_long_press,
            RecognizerSlot::Pan => self.pan,
            RecognizerSlot::Sequence => self.sequence,
        }
    }

    pub(super) fn admit(&self, phase: Phase) -> Verdict {
        let touch_like = self.source.is_touch_like();
        let proceed = match phase {
            Phase::LongPressAction => touch_like && self.long_press != Disposal::Rejected,
            Phase::PreviewLongPressAction => touch_like && self.pan != Disposal::Rejected,
            Phase::PanStart | Phase::SequenceCancel => {
                !touch_like || self.long_press == Disposal::Accepted
            }
        };
        if proceed {
            Verdict::Proceed
        } else {
            Verdict::Ignore
        }
    }
}
