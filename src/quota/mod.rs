pub mod usage_log;
pub mod engine;

pub use engine::QuotaEngine;
pub use usage_log::UsageLog;

/// Result of evaluating one use request.
///
/// `NotFound` and `Denied` are ordinary outcomes, not faults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseOutcome {
    /// The use was recorded. `usage_left` excludes it.
    Admitted { usage_left: u32, ms_until_reset: u64 },
    /// Quota exhausted; `ms_until_reset` is when the oldest slot frees up.
    Denied { ms_until_reset: u64 },
    NotFound,
}

impl UseOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, UseOutcome::Admitted { .. })
    }

    pub fn usage_left(&self) -> u32 {
        match self {
            UseOutcome::Admitted { usage_left, .. } => *usage_left,
            _ => 0,
        }
    }

    pub fn ms_until_reset(&self) -> u64 {
        match self {
            UseOutcome::Admitted { ms_until_reset, .. } | UseOutcome::Denied { ms_until_reset } => {
                *ms_until_reset
            }
            UseOutcome::NotFound => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UseOutcome::Admitted { .. } => "admitted",
            UseOutcome::Denied { .. } => "denied",
            UseOutcome::NotFound => "not_found",
        }
    }
}
