//! # Quality Module
//!
//! Scores every member of every duplicate group and picks the sharpest
//! one as the group's representative.
//!
//! ## Selection Rule
//! - The strictly highest score wins
//! - Ties keep the earliest member
//! - Members that fail to score stay in the group but cannot win
//! - If nobody could be scored, the first member is the representative

mod sharpness;

pub use sharpness::{LaplacianSharpnessScorer, SharpnessScorer};

use crate::core::group::DuplicateGroup;
use crate::core::source::{ContentReader, ImageRef};
use crate::core::stage::{CancellationToken, ItemOutcome, StageRunner};
use crate::error::{ItemError, StageError};
use crate::events::RunPhase;
use serde::{Deserialize, Serialize};

/// Sharpness of a photo in [0, 1]; higher is sharper
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityScore(f64);

impl QualityScore {
    /// Accepts only finite values in [0, 1]
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(Self(value))
    }

    /// Clamp into [0, 1]; NaN becomes 0
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Groups after scoring plus the members that could not be scored
#[derive(Debug, Default)]
pub struct RankedGroups {
    /// Every input group, in input order, each with a representative
    pub groups: Vec<DuplicateGroup>,
    pub skipped: Vec<ItemError>,
}

/// Index of the best score: strictly highest, first wins on ties,
/// 0 when nothing was scored.
pub fn select_representative(scores: &[Option<QualityScore>]) -> usize {
    let mut best: Option<(usize, QualityScore)> = None;

    for (index, score) in scores.iter().enumerate() {
        if let Some(score) = score {
            match best {
                Some((_, current)) if score.value() <= current.value() => {}
                _ => best = Some((index, *score)),
            }
        }
    }

    best.map(|(index, _)| index).unwrap_or(0)
}

/// Score every member of `groups` and assign representatives.
///
/// Groups are never dropped or reordered. `on_item_done` counts scored
/// members across all groups.
pub fn score_and_rank<P>(
    groups: Vec<DuplicateGroup>,
    reader: &dyn ContentReader,
    scorer: &dyn SharpnessScorer,
    runner: &StageRunner,
    cancel: &CancellationToken,
    on_item_done: P,
) -> Result<RankedGroups, StageError>
where
    P: FnMut(usize),
{
    let members: Vec<ImageRef> = groups
        .iter()
        .flat_map(|g| g.members().iter().cloned())
        .collect();

    let mut outcomes = runner
        .run(
            &members,
            cancel,
            |item| -> ItemOutcome<QualityScore> {
                reader
                    .read(item)
                    .and_then(|bytes| {
                        scorer.score(&bytes).map_err(|source| ItemError::Compute {
                            item: item.clone(),
                            phase: RunPhase::Scoring,
                            source,
                        })
                    })
                    .into()
            },
            on_item_done,
        )?
        .into_iter();

    let mut ranked = RankedGroups {
        groups: Vec::with_capacity(groups.len()),
        skipped: Vec::new(),
    };

    for mut group in groups {
        let scores: Vec<Option<QualityScore>> = outcomes
            .by_ref()
            .take(group.members().len())
            .map(|outcome| match outcome {
                ItemOutcome::Done(score) => Some(score),
                ItemOutcome::Skipped(error) => {
                    ranked.skipped.push(error);
                    None
                }
            })
            .collect();

        let best = select_representative(&scores);
        group.finalize(scores, best);
        ranked.groups.push(group);
    }

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::group::GroupKind;
    use crate::core::testing::{MemoryReader, TableScorer};

    fn score(value: f64) -> Option<QualityScore> {
        Some(QualityScore::clamped(value))
    }

    fn group(kind: GroupKind, names: &[&str]) -> DuplicateGroup {
        DuplicateGroup::new(kind, names.iter().map(|n| ImageRef::from(*n)).collect()).unwrap()
    }

    #[test]
    fn score_rejects_out_of_range_values() {
        assert!(QualityScore::new(0.5).is_some());
        assert!(QualityScore::new(1.5).is_none());
        assert!(QualityScore::new(-0.1).is_none());
        assert!(QualityScore::new(f64::NAN).is_none());
        assert_eq!(QualityScore::clamped(3.0).value(), 1.0);
        assert_eq!(QualityScore::clamped(f64::NAN).value(), 0.0);
    }

    #[test]
    fn ties_keep_the_earliest_member() {
        let scores = [score(0.2), score(0.9), score(0.9), None];
        assert_eq!(select_representative(&scores), 1);
    }

    #[test]
    fn all_failures_default_to_first_member() {
        assert_eq!(select_representative(&[None, None, None]), 0);
    }

    #[test]
    fn failed_members_cannot_win() {
        let scores = [None, score(0.1), None];
        assert_eq!(select_representative(&scores), 1);
    }

    #[test]
    fn representative_is_highest_scoring_member() {
        let reader = MemoryReader::new()
            .with("/a.jpg", b"a")
            .with("/b.jpg", b"b")
            .with("/c.jpg", b"c")
            .with("/d.jpg", b"d");
        let scorer = TableScorer::new()
            .with(b"a", 0.4)
            .with(b"b", 0.7)
            .with(b"c", 0.5)
            .with(b"d", 0.3);
        let groups = vec![
            group(GroupKind::Exact, &["/a.jpg", "/b.jpg"]),
            group(GroupKind::Near, &["/c.jpg", "/d.jpg"]),
        ];

        let ranked = score_and_rank(
            groups,
            &reader,
            &scorer,
            &StageRunner::new(2, 1).unwrap(),
            &CancellationToken::new(),
            |_| {},
        )
        .unwrap();

        assert_eq!(ranked.groups.len(), 2);
        assert_eq!(ranked.groups[0].kind(), GroupKind::Exact);
        assert_eq!(ranked.groups[0].representative(), Some(&ImageRef::from("/b.jpg")));
        assert_eq!(ranked.groups[1].kind(), GroupKind::Near);
        assert_eq!(ranked.groups[1].representative(), Some(&ImageRef::from("/c.jpg")));
        assert!(ranked.skipped.is_empty());
    }

    #[test]
    fn unscorable_group_keeps_first_member_and_is_not_dropped() {
        let reader = MemoryReader::new().with("/x.jpg", b"x");
        let groups = vec![group(GroupKind::Exact, &["/x.jpg", "/gone.jpg"])];
        let mut last_count = 0;

        let ranked = score_and_rank(
            groups,
            &reader,
            &TableScorer::new(),
            &StageRunner::new(2, 1).unwrap(),
            &CancellationToken::new(),
            |count| last_count = count,
        )
        .unwrap();

        assert_eq!(last_count, 2);
        assert_eq!(ranked.groups.len(), 1);
        assert_eq!(ranked.groups[0].representative(), Some(&ImageRef::from("/x.jpg")));
        assert_eq!(ranked.groups[0].members().len(), 2);
        assert_eq!(ranked.skipped.len(), 2);
    }

    #[test]
    fn empty_group_is_passed_through_unranked() {
        let reader = MemoryReader::new().with("/a.jpg", b"a").with("/b.jpg", b"b");
        let scorer = TableScorer::new().with(b"a", 0.1).with(b"b", 0.6);
        let empty: DuplicateGroup = serde_json::from_str(
            r#"{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","kind":"Near","members":[],"representative":null,"scores":[]}"#,
        )
        .unwrap();
        let groups = vec![empty, group(GroupKind::Exact, &["/a.jpg", "/b.jpg"])];

        let ranked = score_and_rank(
            groups,
            &reader,
            &scorer,
            &StageRunner::new(2, 1).unwrap(),
            &CancellationToken::new(),
            |_| {},
        )
        .unwrap();

        assert_eq!(ranked.groups.len(), 2);
        assert!(!ranked.groups[0].is_finalized());
        assert_eq!(ranked.groups[1].representative(), Some(&ImageRef::from("/b.jpg")));
    }

    #[test]
    fn scores_are_recorded_per_member() {
        let reader = MemoryReader::new()
            .with("/a.jpg", b"a")
            .with("/b.jpg", b"b")
            .with("/c.jpg", b"c")
            .with("/d.jpg", b"d");
        let scorer = TableScorer::new()
            .with(b"a", 0.2)
            .with(b"b", 0.9)
            .with(b"c", 0.9);
        let groups = vec![group(GroupKind::Near, &["/a.jpg", "/b.jpg", "/c.jpg", "/d.jpg"])];

        let ranked = score_and_rank(
            groups,
            &reader,
            &scorer,
            &StageRunner::new(4, 1).unwrap(),
            &CancellationToken::new(),
            |_| {},
        )
        .unwrap();

        let group = &ranked.groups[0];
        assert_eq!(group.representative(), Some(&ImageRef::from("/b.jpg")));
        assert_eq!(group.scores(), &[score(0.2), score(0.9), score(0.9), None]);
    }
}
