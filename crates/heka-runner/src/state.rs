use std::sync::atomic::{AtomicU8, Ordering};

/// A runner's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initializing,
    Running,
    Restarting,
    Stopped,
}

impl LifecycleState {
    fn to_tag(self) -> u8 {
        match self {
            LifecycleState::Initializing => 0,
            LifecycleState::Running => 1,
            LifecycleState::Restarting => 2,
            LifecycleState::Stopped => 3,
        }
    }

    fn from_tag(tag: u8) -> Self {
        match tag {
            0 => LifecycleState::Initializing,
            1 => LifecycleState::Running,
            2 => LifecycleState::Restarting,
            _ => LifecycleState::Stopped,
        }
    }
}

/// Shared, lock-free lifecycle state cell — readable from a reporting task
/// while the runner's own task drives it forward.
pub struct RunnerState(AtomicU8);

impl RunnerState {
    pub fn new(initial: LifecycleState) -> Self {
        RunnerState(AtomicU8::new(initial.to_tag()))
    }

    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_tag(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: LifecycleState) {
        self.0.store(state.to_tag(), Ordering::Release);
    }
}

impl Default for RunnerState {
    fn default() -> Self {
        RunnerState::new(LifecycleState::Initializing)
    }
}
