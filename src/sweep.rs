use std::path::Path;

use crate::compare::{Comparison, FaceComparator};
use crate::error::Result;

/// One point in the preprocessing sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSet {
    pub grayscale: bool,
    pub bilateral: bool,
    pub landmarks: bool,
}

impl FlagSet {
    /// All 8 combinations in fixed nested order: grayscale outermost,
    /// landmarks innermost, `true` before `false`. The sweep and the
    /// report both rely on this order being stable run to run.
    pub fn combinations() -> [FlagSet; 8] {
        let mut combos = [FlagSet {
            grayscale: false,
            bilateral: false,
            landmarks: false,
        }; 8];
        let mut i = 0;
        for grayscale in [true, false] {
            for bilateral in [true, false] {
                for landmarks in [true, false] {
                    combos[i] = FlagSet {
                        grayscale,
                        bilateral,
                        landmarks,
                    };
                    i += 1;
                }
            }
        }
        combos
    }
}

/// Recorded outcome of one sweep iteration. The table only distinguishes
/// scored from unscored rows, but the kind is kept for callers and logs.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Score(f32),
    FacesNotDetected,
    EncodingFailed,
    Failed(String),
}

impl RowOutcome {
    pub fn score(&self) -> Option<f32> {
        match self {
            RowOutcome::Score(score) => Some(*score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepRow {
    pub flags: FlagSet,
    pub outcome: RowOutcome,
}

/// Run the full 8-combination sweep over one image pair.
pub fn run_sweep(comparator: &mut FaceComparator, path1: &Path, path2: &Path) -> Vec<SweepRow> {
    run_sweep_with(|flags| comparator.compare(path1, path2, flags))
}

/// Sweep over an arbitrary comparison function. A failing iteration is
/// logged and recorded; the sweep always produces all 8 rows in order.
pub fn run_sweep_with<F>(mut compare: F) -> Vec<SweepRow>
where
    F: FnMut(&FlagSet) -> Result<Comparison>,
{
    let mut rows = Vec::with_capacity(8);

    for flags in FlagSet::combinations() {
        let outcome = match compare(&flags) {
            Ok(Comparison::Similarity(score)) => RowOutcome::Score(score),
            Ok(Comparison::FacesNotDetected) => RowOutcome::FacesNotDetected,
            Ok(Comparison::EncodingFailed) => RowOutcome::EncodingFailed,
            Err(e) => {
                tracing::warn!(
                    grayscale = flags.grayscale,
                    bilateral = flags.bilateral,
                    landmarks = flags.landmarks,
                    "Comparison failed: {}",
                    e
                );
                RowOutcome::Failed(e.to_string())
            }
        };
        rows.push(SweepRow { flags, outcome });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaceSweepError;

    #[test]
    fn enumerates_eight_distinct_combinations() {
        let combos = FlagSet::combinations();
        assert_eq!(combos.len(), 8);
        for (i, a) in combos.iter().enumerate() {
            for b in &combos[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn enumeration_order_is_true_first_nested() {
        let combos = FlagSet::combinations();
        assert_eq!(
            combos[0],
            FlagSet {
                grayscale: true,
                bilateral: true,
                landmarks: true
            }
        );
        assert_eq!(
            combos[1],
            FlagSet {
                grayscale: true,
                bilateral: true,
                landmarks: false
            }
        );
        assert_eq!(
            combos[7],
            FlagSet {
                grayscale: false,
                bilateral: false,
                landmarks: false
            }
        );
        // Grayscale flips slowest.
        assert!(combos[..4].iter().all(|c| c.grayscale));
        assert!(combos[4..].iter().all(|c| !c.grayscale));
    }

    #[test]
    fn sweep_always_yields_one_row_per_combination() {
        let rows = run_sweep_with(|_| Err(FaceSweepError::Model("boom".to_string())));
        assert_eq!(rows.len(), 8);
        assert!(rows
            .iter()
            .all(|row| matches!(row.outcome, RowOutcome::Failed(_))));
    }

    #[test]
    fn sweep_continues_past_a_failing_combination() {
        let rows = run_sweep_with(|flags| {
            if flags.bilateral {
                Err(FaceSweepError::Model("bilateral broke".to_string()))
            } else {
                Ok(Comparison::Similarity(88.0))
            }
        });
        assert_eq!(rows.len(), 8);
        assert_eq!(rows.iter().filter_map(|r| r.outcome.score()).count(), 4);
        assert_eq!(
            rows.iter()
                .filter(|r| matches!(r.outcome, RowOutcome::Failed(_)))
                .count(),
            4
        );
        // Rows stay in enumeration order despite the failures.
        let combos = FlagSet::combinations();
        for (row, combo) in rows.iter().zip(combos.iter()) {
            assert_eq!(&row.flags, combo);
        }
    }

    #[test]
    fn sentinel_outcomes_map_to_absent_scores() {
        let rows = run_sweep_with(|flags| {
            if flags.landmarks {
                Ok(Comparison::FacesNotDetected)
            } else {
                Ok(Comparison::EncodingFailed)
            }
        });
        assert!(rows.iter().all(|row| row.outcome.score().is_none()));
    }
}
