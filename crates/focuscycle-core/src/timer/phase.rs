use serde::{Deserialize, Serialize};

/// One segment of the work/rest cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Active,
    ShortRest,
    LongRest,
}

impl Phase {
    pub fn is_rest(self) -> bool {
        matches!(self, Phase::ShortRest | Phase::LongRest)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Active => "Focus",
            Phase::ShortRest => "Short Rest",
            Phase::LongRest => "Long Rest",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase that follows `current`.
///
/// `completed_cycles` is the cycle count *after* the phase being left has been
/// counted, so the k-th Active completion lands on a long rest.
/// A `cycles_before_long_rest` of zero is treated as one.
pub fn next_phase(current: Phase, completed_cycles: u32, cycles_before_long_rest: u32) -> Phase {
    match current {
        Phase::Active => {
            let every = cycles_before_long_rest.max(1);
            if completed_cycles % every == 0 {
                Phase::LongRest
            } else {
                Phase::ShortRest
            }
        }
        Phase::ShortRest | Phase::LongRest => Phase::Active,
        Phase::Idle => Phase::Idle,
    }
}
