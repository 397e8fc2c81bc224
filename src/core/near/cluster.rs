//! Anchored ("star") clustering of feature prints.
//!
//! Unlike transitive grouping, membership is decided only by distance to
//! the group's anchor. If A~B and A~C then {A, B, C} is one group, even
//! when B and C are further apart than the threshold. Conversely, B~D
//! never pulls D into A's group. This is a known precision limitation:
//! "same group" is not transitive across every pair of members.

use super::FeaturePrint;
use crate::core::source::ImageRef;
use crate::core::stage::CancellationToken;
use crate::error::StageError;

/// Cluster prints around anchors, in the order given.
///
/// Walks `prints` in order; each unassigned print becomes an anchor and
/// claims every *later* unassigned print whose distance to it is strictly
/// below `threshold`. Groups with fewer than two members are dropped.
/// Groups come out in anchor order, members in input order.
pub fn cluster_anchored<D>(
    prints: &[(ImageRef, FeaturePrint)],
    threshold: f64,
    distance: D,
    cancel: &CancellationToken,
) -> Result<Vec<Vec<ImageRef>>, StageError>
where
    D: Fn(&FeaturePrint, &FeaturePrint) -> f64,
{
    let mut assigned = vec![false; prints.len()];
    let mut groups = Vec::new();

    for (anchor_index, (anchor, anchor_print)) in prints.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }
        if assigned[anchor_index] {
            continue;
        }
        assigned[anchor_index] = true;

        let mut members = vec![anchor.clone()];
        for candidate_index in (anchor_index + 1)..prints.len() {
            if assigned[candidate_index] {
                continue;
            }

            let (candidate, candidate_print) = &prints[candidate_index];
            if distance(anchor_print, candidate_print) < threshold {
                assigned[candidate_index] = true;
                members.push(candidate.clone());
            }
        }

        if members.len() >= 2 {
            groups.push(members);
        }
    }

    Ok(groups)
}
