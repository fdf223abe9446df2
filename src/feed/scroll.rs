//! Scroll-direction tracking for the search affordance.
//!
//! Modelled as a pure reducer over offset samples so it can be tested without
//! a terminal. Scrolling down (offset grows) hides the search bar; scrolling
//! up or holding still shows it.

/// Visibility of the search affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affordance {
    #[default]
    Visible,
    Hidden,
}

impl Affordance {
    pub fn is_visible(self) -> bool {
        self == Affordance::Visible
    }
}

/// Reducer state: the last sample seen and the current visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollState {
    pub last_offset: Option<i64>,
    pub affordance: Affordance,
}

/// Fold one offset sample into the state.
///
/// The first sample only records a baseline. After that each sample is
/// compared with the one before it: an increase hides, anything else shows.
/// With `min_delta > 0`, movements smaller than `min_delta` keep the current
/// visibility (jitter suppression); the offset is still recorded.
pub fn reduce(state: ScrollState, sample: i64, min_delta: u32) -> ScrollState {
    let Some(previous) = state.last_offset else {
        return ScrollState {
            last_offset: Some(sample),
            affordance: state.affordance,
        };
    };

    let delta = sample.saturating_sub(previous);
    let affordance = if min_delta > 0 && delta.unsigned_abs() < u64::from(min_delta) {
        state.affordance
    } else if delta > 0 {
        Affordance::Hidden
    } else {
        Affordance::Visible
    };

    ScrollState {
        last_offset: Some(sample),
        affordance,
    }
}

/// Stateful wrapper owned by the feed view for the lifetime of the screen.
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    state: ScrollState,
    min_delta: u32,
}

impl ScrollTracker {
    pub fn new(min_delta: u32) -> Self {
        Self {
            state: ScrollState::default(),
            min_delta,
        }
    }

    /// Feed a sample and return the resulting visibility.
    pub fn observe(&mut self, sample: i64) -> Affordance {
        self.state = reduce(self.state, sample, self.min_delta);
        self.state.affordance
    }

    /// Force the affordance visible without touching the baseline offset.
    pub fn reveal(&mut self) {
        self.state.affordance = Affordance::Visible;
    }

    pub fn affordance(&self) -> Affordance {
        self.state.affordance
    }

    pub fn last_offset(&self) -> Option<i64> {
        self.state.last_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(samples: &[i64], min_delta: u32) -> Vec<Affordance> {
        let mut tracker = ScrollTracker::new(min_delta);
        samples.iter().map(|s| tracker.observe(*s)).collect()
    }

    #[test]
    fn test_initial_state_visible() {
        assert_eq!(ScrollTracker::new(0).affordance(), Affordance::Visible);
    }

    #[test]
    fn test_down_then_up() {
        use Affordance::*;
        assert_eq!(run(&[100, 150, 120], 0), vec![Visible, Hidden, Visible]);
    }

    #[test]
    fn test_unchanged_offset_shows() {
        use Affordance::*;
        assert_eq!(run(&[0, 40, 40], 0), vec![Visible, Hidden, Visible]);
    }

    #[test]
    fn test_every_sample_transitions() {
        use Affordance::*;
        assert_eq!(
            run(&[0, 1, 2, 1, 5, 5, 6], 0),
            vec![Visible, Hidden, Hidden, Visible, Hidden, Visible, Hidden]
        );
    }

    #[test]
    fn test_jitter_threshold_keeps_state() {
        use Affordance::*;
        // 100 -> 150 hides; 150 -> 148 is below the threshold; 148 -> 120 shows.
        assert_eq!(run(&[100, 150, 148, 120], 5), vec![Visible, Hidden, Hidden, Visible]);
    }

    #[test]
    fn test_reveal_keeps_baseline() {
        let mut tracker = ScrollTracker::new(0);
        tracker.observe(10);
        tracker.observe(20);
        assert_eq!(tracker.affordance(), Affordance::Hidden);
        tracker.reveal();
        assert_eq!(tracker.affordance(), Affordance::Visible);
        assert_eq!(tracker.last_offset(), Some(20));
        assert_eq!(tracker.observe(30), Affordance::Hidden);
    }

    #[test]
    fn test_reduce_is_pure() {
        let state = ScrollState {
            last_offset: Some(5),
            affordance: Affordance::Visible,
        };
        assert_eq!(reduce(state, 9, 0), reduce(state, 9, 0));
        assert_eq!(state.last_offset, Some(5));
    }
}
