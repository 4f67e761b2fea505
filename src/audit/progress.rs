use std::sync::Arc;

use serde::Serialize;

/// Inspections finished so far out of the candidate total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// In [0, 1]; an empty run counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 { 1.0 } else { self.completed as f64 / self.total as f64 }
    }
}

pub type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_bounds() {
        assert_eq!(Progress { completed: 0, total: 4 }.fraction(), 0.0);
        assert_eq!(Progress { completed: 1, total: 4 }.fraction(), 0.25);
        assert_eq!(Progress { completed: 4, total: 4 }.fraction(), 1.0);
        assert_eq!(Progress { completed: 0, total: 0 }.fraction(), 1.0);
    }
}
