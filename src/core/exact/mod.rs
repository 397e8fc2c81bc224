//! # Exact Module
//!
//! Finds byte-identical photos by hashing their content.
//!
//! ## How It Works
//! 1. Read each photo's bytes through the [`ContentReader`]
//! 2. Hash them into a 256-bit [`ContentDigest`]
//! 3. Bucket photos by digest, keeping first-seen order inside a bucket
//!
//! Unreadable photos are skipped and recorded; they never stop the stage.

mod digest;

pub use digest::{Blake3Hasher, ContentDigest, ContentHasher};

use crate::core::source::{ContentReader, ImageRef};
use crate::core::stage::{CancellationToken, ItemOutcome, StageRunner};
use crate::error::{ItemError, StageError};
use std::collections::HashMap;

/// Photos sharing one content digest
#[derive(Debug, Clone, PartialEq)]
pub struct DigestBucket {
    pub digest: ContentDigest,
    /// Members in the order they were submitted
    pub members: Vec<ImageRef>,
}

impl DigestBucket {
    /// The member standing in for this bucket in later stages
    pub fn representative(&self) -> &ImageRef {
        &self.members[0]
    }

    pub fn is_duplicate(&self) -> bool {
        self.members.len() >= 2
    }
}

/// Full digest-to-photos mapping produced by the exact stage.
///
/// Singleton buckets are kept; only buckets with two or more members
/// become exact duplicate groups.
#[derive(Debug, Default)]
pub struct ExactBuckets {
    buckets: Vec<DigestBucket>,
    index: HashMap<ContentDigest, usize>,
    skipped: Vec<ItemError>,
}

impl ExactBuckets {
    fn insert(&mut self, digest: ContentDigest, item: ImageRef) {
        match self.index.get(&digest) {
            Some(&slot) => self.buckets[slot].members.push(item),
            None => {
                self.index.insert(digest, self.buckets.len());
                self.buckets.push(DigestBucket {
                    digest,
                    members: vec![item],
                });
            }
        }
    }

    /// Members of the bucket for `digest`, if any photo hashed to it
    pub fn get(&self, digest: &ContentDigest) -> Option<&[ImageRef]> {
        self.index
            .get(digest)
            .map(|&slot| self.buckets[slot].members.as_slice())
    }

    /// Every bucket, singletons included.
    ///
    /// Callers must not read meaning into the order between buckets.
    pub fn buckets(&self) -> &[DigestBucket] {
        &self.buckets
    }

    /// Buckets with at least two members
    pub fn duplicate_buckets(&self) -> impl Iterator<Item = &DigestBucket> {
        self.buckets.iter().filter(|b| b.is_duplicate())
    }

    /// One representative per bucket, ordered by the submission position
    /// of each bucket's first member.
    pub fn representatives(&self) -> Vec<ImageRef> {
        self.buckets
            .iter()
            .map(|b| b.representative().clone())
            .collect()
    }

    /// Number of distinct digests
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of photos that landed in some bucket
    pub fn bucketed_count(&self) -> usize {
        self.buckets.iter().map(|b| b.members.len()).sum()
    }

    /// Photos that could not be hashed
    pub fn skipped(&self) -> &[ItemError] {
        &self.skipped
    }
}

/// Hash every photo and bucket identical digests.
///
/// `on_item_done` receives the running count of processed photos,
/// skipped ones included.
pub fn detect_exact<P>(
    refs: &[ImageRef],
    reader: &dyn ContentReader,
    hasher: &dyn ContentHasher,
    runner: &StageRunner,
    cancel: &CancellationToken,
    on_item_done: P,
) -> Result<ExactBuckets, StageError>
where
    P: FnMut(usize),
{
    let outcomes = runner.run(
        refs,
        cancel,
        |item| -> ItemOutcome<ContentDigest> {
            reader
                .read(item)
                .map(|bytes| hasher.digest(&bytes))
                .into()
        },
        on_item_done,
    )?;

    let mut result = ExactBuckets::default();
    for (item, outcome) in refs.iter().zip(outcomes) {
        match outcome {
            ItemOutcome::Done(digest) => result.insert(digest, item.clone()),
            ItemOutcome::Skipped(error) => result.skipped.push(error),
        }
    }

    Ok(result)
}
