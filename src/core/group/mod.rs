//! # Group Module
//!
//! The result model: groups of duplicate photos and their recommended keeper.

use crate::core::quality::QualityScore;
use crate::core::source::ImageRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a duplicate group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How the members of a group relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    /// Byte-identical content
    Exact,
    /// Perceptually close to the group's anchor
    Near,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKind::Exact => write!(f, "Exact Duplicate"),
            GroupKind::Near => write!(f, "Near Duplicate"),
        }
    }
}

/// A group of duplicate photos.
///
/// Kind and membership are fixed at creation. The representative is
/// unset until quality scoring finalizes the group, after which it is
/// always one of the members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    id: GroupId,
    kind: GroupKind,
    members: Vec<ImageRef>,
    representative: Option<ImageRef>,
    /// Score per member, `None` where scoring failed
    scores: Vec<Option<QualityScore>>,
}

impl DuplicateGroup {
    /// Minimum number of members in a group
    pub const MIN_MEMBERS: usize = 2;

    /// Create an unscored group.
    ///
    /// Returns `None` when `members` has fewer than [`MIN_MEMBERS`](Self::MIN_MEMBERS).
    pub fn new(kind: GroupKind, members: Vec<ImageRef>) -> Option<Self> {
        if members.len() < Self::MIN_MEMBERS {
            return None;
        }

        let scores = vec![None; members.len()];
        Some(Self {
            id: GroupId::new(),
            kind,
            members,
            representative: None,
            scores,
        })
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn members(&self) -> &[ImageRef] {
        &self.members
    }

    pub fn representative(&self) -> Option<&ImageRef> {
        self.representative.as_ref()
    }

    /// Per-member scores, aligned with [`members`](Self::members)
    pub fn scores(&self) -> &[Option<QualityScore>] {
        &self.scores
    }

    /// Members other than the representative
    pub fn duplicates(&self) -> impl Iterator<Item = &ImageRef> {
        self.members
            .iter()
            .filter(move |m| Some(*m) != self.representative.as_ref())
    }

    /// Number of photos that could be removed (excluding the representative)
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    pub fn is_finalized(&self) -> bool {
        self.representative.is_some()
    }

    /// Record scores and pick the representative at `best` (a member index).
    /// An out-of-range `best` falls back to the first member. A group with
    /// no members (only reachable through deserialization) stays unfinalized.
    pub(crate) fn finalize(&mut self, scores: Vec<Option<QualityScore>>, best: usize) {
        debug_assert_eq!(scores.len(), self.members.len());
        let Some(representative) = self.members.get(best).or_else(|| self.members.first()) else {
            return;
        };
        self.representative = Some(representative.clone());
        self.scores = scores;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(names: &[&str]) -> Vec<ImageRef> {
        names.iter().map(|n| ImageRef::from(*n)).collect()
    }

    fn group(names: &[&str]) -> DuplicateGroup {
        DuplicateGroup::new(GroupKind::Exact, refs(names)).unwrap()
    }

    #[test]
    fn fewer_than_two_members_is_not_a_group() {
        assert!(DuplicateGroup::new(GroupKind::Exact, Vec::new()).is_none());
        assert!(DuplicateGroup::new(GroupKind::Near, refs(&["/a.jpg"])).is_none());
        assert!(DuplicateGroup::new(GroupKind::Near, refs(&["/a.jpg", "/b.jpg"])).is_some());
    }

    #[test]
    fn finalize_out_of_range_falls_back_to_first_member() {
        let mut g = group(&["/a.jpg", "/b.jpg"]);
        g.finalize(vec![None, None], 7);
        assert_eq!(g.representative(), Some(&ImageRef::from("/a.jpg")));
    }

    #[test]
    fn empty_deserialized_group_is_left_unfinalized() {
        let json = r#"{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "kind": "Exact",
            "members": [],
            "representative": null,
            "scores": []
        }"#;
        let mut g: DuplicateGroup = serde_json::from_str(json).unwrap();

        g.finalize(Vec::new(), 0);

        assert!(!g.is_finalized());
        assert!(g.scores().is_empty());
    }

    #[test]
    fn new_group_has_no_representative() {
        let g = group(&["/a.jpg", "/b.jpg"]);
        assert!(!g.is_finalized());
        assert!(g.representative().is_none());
        assert_eq!(g.scores(), &[None, None]);
    }

    #[test]
    fn finalize_sets_member_as_representative() {
        let mut g = group(&["/a.jpg", "/b.jpg", "/c.jpg"]);
        g.finalize(vec![None, Some(QualityScore::clamped(0.8)), None], 1);

        assert_eq!(g.representative(), Some(&ImageRef::from("/b.jpg")));
        assert!(g.members().contains(g.representative().unwrap()));
    }

    #[test]
    fn duplicates_exclude_representative() {
        let mut g = group(&["/a.jpg", "/b.jpg", "/c.jpg"]);
        g.finalize(vec![None; 3], 2);

        let duplicates: Vec<_> = g.duplicates().map(|r| r.to_string()).collect();
        assert_eq!(duplicates, vec!["/a.jpg", "/b.jpg"]);
        assert_eq!(g.duplicate_count(), 2);
    }

    #[test]
    fn groups_get_unique_ids() {
        assert_ne!(group(&["/a", "/b"]).id(), group(&["/a", "/b"]).id());
    }

    #[test]
    fn kind_display() {
        assert_eq!(GroupKind::Exact.to_string(), "Exact Duplicate");
        assert_eq!(GroupKind::Near.to_string(), "Near Duplicate");
    }
}
