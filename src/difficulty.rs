//! Process-wide proof-of-work difficulty (`spec.md` §3 "DifficultyState",
//! §4.4, §7). Monotonicity is not required: the controller simply replaces
//! its value with whatever the network last reported.
use parking_lot::RwLock;

pub struct DifficultyState {
    current: RwLock<u64>,
}

impl DifficultyState {
    pub fn new(initial: u64) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub fn current(&self) -> u64 {
        *self.current.read()
    }

    /// Replaces the stored difficulty with `value`, regardless of whether
    /// it is higher or lower than the current one.
    pub fn set(&self, value: u64) {
        *self.current.write() = value;
    }
}

impl Default for DifficultyState {
    fn default() -> Self {
        Self::new(crate::config::INITIAL_DIFFICULTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_regardless_of_direction() {
        let state = DifficultyState::new(40);
        state.set(100);
        assert_eq!(state.current(), 100);
        state.set(10);
        assert_eq!(state.current(), 10);
    }
}
