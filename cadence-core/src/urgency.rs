//! Urgency scoring: a 0-100 score from remaining work vs remaining time.
//!
//! Both formulas live behind one enum so a run uses exactly one. `Compound`
//! is the default; `LinearRatio` is a simpler form kept for comparison runs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrgencyModel {
    /// `100 * (dl / (ttd + dl)) * (1 + 1/dl)`.
    ///
    /// The first factor is the work share of combined remaining work +
    /// remaining time; the second amplifies small remainders so a nearly-done
    /// but unfinished task against a tight deadline spikes sharply.
    #[default]
    Compound,
    /// `100 * dl / ttd`.
    LinearRatio,
}

impl UrgencyModel {
    /// Score a task from `duration_left` (hours of work remaining) and
    /// `time_to_deadline` (effective working hours remaining).
    ///
    /// Precedence when both are non-positive: overdue dominates. A task that
    /// is simultaneously past its effective deadline and finished scores 100.
    pub fn score(self, duration_left: f64, time_to_deadline: f64) -> f64 {
        if time_to_deadline <= 0.0 {
            return 100.0;
        }
        if duration_left <= 0.0 {
            return 0.0;
        }
        match self {
            UrgencyModel::Compound => {
                100.0 * (duration_left / (time_to_deadline + duration_left))
                    * (1.0 + 1.0 / duration_left)
            }
            UrgencyModel::LinearRatio => 100.0 * duration_left / time_to_deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overdue_scores_100() {
        assert_eq!(UrgencyModel::Compound.score(4.0, 0.0), 100.0);
        assert_eq!(UrgencyModel::Compound.score(4.0, -2.0), 100.0);
        assert_eq!(UrgencyModel::LinearRatio.score(4.0, 0.0), 100.0);
    }

    #[test]
    fn test_finished_scores_0() {
        assert_eq!(UrgencyModel::Compound.score(0.0, 8.0), 0.0);
        assert_eq!(UrgencyModel::Compound.score(-1.0, 8.0), 0.0);
        assert_eq!(UrgencyModel::LinearRatio.score(0.0, 8.0), 0.0);
    }

    #[test]
    fn test_overdue_dominates_when_also_finished() {
        // Both conditions hold; the overdue branch wins.
        assert_eq!(UrgencyModel::Compound.score(0.0, 0.0), 100.0);
        assert_eq!(UrgencyModel::LinearRatio.score(0.0, -1.0), 100.0);
    }

    #[test]
    fn test_compound_formula() {
        // dl=4, ttd=16: 100 * (4/20) * (1 + 1/4) = 25.
        let u = UrgencyModel::Compound.score(4.0, 16.0);
        assert!((u - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_ratio_formula() {
        let u = UrgencyModel::LinearRatio.score(4.0, 16.0);
        assert!((u - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_compound_amplifies_small_remainders() {
        // Same work/time ratio, but the smaller remainder scores higher.
        let small = UrgencyModel::Compound.score(0.5, 2.0);
        let large = UrgencyModel::Compound.score(5.0, 20.0);
        assert!(small > large);
    }

    #[test]
    fn test_urgency_grows_as_time_shrinks() {
        let relaxed = UrgencyModel::Compound.score(6.0, 40.0);
        let tight = UrgencyModel::Compound.score(6.0, 4.0);
        assert!(tight > relaxed);
    }
}
