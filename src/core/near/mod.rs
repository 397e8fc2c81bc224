//! # Near Module
//!
//! Finds photos that look alike without being byte-identical.
//!
//! ## How It Works
//! 1. Take one representative per exact-duplicate bucket, in a fixed order
//! 2. Extract a [`FeaturePrint`] for each representative (in parallel)
//! 3. Cluster the prints around anchors using a distance threshold
//!
//! ## Determinism
//! Clustering depends on input order, so callers must pass representatives
//! in a reproducible order (never hash-map iteration order). Parallel
//! extraction does not reorder anything.
//!
//! ## Thresholds
//! With the default gradient extractor, distance is the fraction of
//! differing hash bits:
//! | Distance  | Meaning                |
//! |-----------|------------------------|
//! | 0.00      | Visually identical     |
//! | < 0.15    | Re-encode / resize     |
//! | < 0.30    | Same shot, small edits (default cut-off) |
//! | >= 0.30   | Different photos       |

mod cluster;
mod feature;

pub use cluster::cluster_anchored;
pub use feature::{FeatureExtractor, FeaturePrint, GradientFeatureExtractor};

use crate::core::source::{ContentReader, ImageRef};
use crate::core::stage::{CancellationToken, ItemOutcome, StageRunner};
use crate::error::{ItemError, StageError};
use crate::events::RunPhase;
use tracing::debug;

/// Groups found by the near stage plus the representatives it had to skip
#[derive(Debug, Default)]
pub struct NearGroups {
    /// Groups in anchor order, members in representative order
    pub groups: Vec<Vec<ImageRef>>,
    /// Representatives whose bytes could not be read or printed
    pub skipped: Vec<ItemError>,
}

/// Extract prints for `representatives` and cluster them.
///
/// `on_item_done` counts extraction work only; clustering itself runs
/// on the calling thread afterwards and checks `cancel` per anchor.
pub fn detect_near<P>(
    representatives: &[ImageRef],
    reader: &dyn ContentReader,
    extractor: &dyn FeatureExtractor,
    distance_threshold: f64,
    runner: &StageRunner,
    cancel: &CancellationToken,
    on_item_done: P,
) -> Result<NearGroups, StageError>
where
    P: FnMut(usize),
{
    let outcomes = runner.run(
        representatives,
        cancel,
        |item| -> ItemOutcome<FeaturePrint> {
            reader
                .read(item)
                .and_then(|bytes| {
                    extractor
                        .extract(&bytes)
                        .map_err(|source| ItemError::Compute {
                            item: item.clone(),
                            phase: RunPhase::Clustering,
                            source,
                        })
                })
                .into()
        },
        on_item_done,
    )?;

    let mut prints = Vec::with_capacity(representatives.len());
    let mut skipped = Vec::new();
    for (item, outcome) in representatives.iter().zip(outcomes) {
        match outcome {
            ItemOutcome::Done(print) => prints.push((item.clone(), print)),
            ItemOutcome::Skipped(error) => skipped.push(error),
        }
    }

    debug!(
        printed = prints.len(),
        skipped = skipped.len(),
        distance_threshold,
        "Clustering representatives"
    );

    let groups = cluster_anchored(
        &prints,
        distance_threshold,
        |a, b| extractor.distance(a, b),
        cancel,
    )?;

    Ok(NearGroups { groups, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{MemoryReader, TableExtractor};

    fn runner() -> StageRunner {
        StageRunner::new(3, 1).unwrap()
    }

    fn refs(names: &[&str]) -> Vec<ImageRef> {
        names.iter().map(|n| ImageRef::from(*n)).collect()
    }

    #[test]
    fn close_representatives_are_grouped() {
        let reader = MemoryReader::new()
            .with("/c.jpg", b"c")
            .with("/d.jpg", b"d")
            .with("/e.jpg", b"e");
        let extractor = TableExtractor::new()
            .with(b"c", 1.0)
            .with(b"d", 1.1)
            .with(b"e", 9.0);

        let result = detect_near(
            &refs(&["/c.jpg", "/d.jpg", "/e.jpg"]),
            &reader,
            &extractor,
            0.3,
            &runner(),
            &CancellationToken::new(),
            |_| {},
        )
        .unwrap();

        assert_eq!(result.groups, vec![refs(&["/c.jpg", "/d.jpg"])]);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn failed_extraction_excludes_representative() {
        let reader = MemoryReader::new()
            .with("/a.jpg", b"a")
            .with("/b.jpg", b"unprintable")
            .with("/c.jpg", b"c");
        let extractor = TableExtractor::new().with(b"a", 0.0).with(b"c", 0.1);
        let mut last_count = 0;

        let result = detect_near(
            &refs(&["/a.jpg", "/b.jpg", "/missing.jpg", "/c.jpg"]),
            &reader,
            &extractor,
            0.3,
            &runner(),
            &CancellationToken::new(),
            |count| last_count = count,
        )
        .unwrap();

        assert_eq!(last_count, 4);
        assert_eq!(result.groups, vec![refs(&["/a.jpg", "/c.jpg"])]);
        assert_eq!(result.skipped.len(), 2);
        assert!(matches!(
            result.skipped.iter().find(|e| e.item() == &ImageRef::from("/b.jpg")),
            Some(ItemError::Compute {
                phase: RunPhase::Clustering,
                ..
            })
        ));
    }

    #[test]
    fn no_printable_representatives_yields_empty_result() {
        let result = detect_near(
            &refs(&["/x.jpg", "/y.jpg"]),
            &MemoryReader::new(),
            &TableExtractor::new(),
            0.3,
            &runner(),
            &CancellationToken::new(),
            |_| {},
        )
        .unwrap();

        assert!(result.groups.is_empty());
        assert_eq!(result.skipped.len(), 2);
    }

    #[test]
    fn repeated_runs_produce_identical_groups() {
        let names: Vec<String> = (0..30).map(|i| format!("/{}.jpg", i)).collect();
        let mut reader = MemoryReader::new();
        let mut extractor = TableExtractor::new();
        for (i, name) in names.iter().enumerate() {
            let payload = name.as_bytes();
            reader = reader.with(name, payload);
            extractor = extractor.with(payload, (i % 7) as f32 * 0.2);
        }
        let items: Vec<ImageRef> = names.iter().map(|n| ImageRef::from(n.as_str())).collect();

        let run = || {
            detect_near(
                &items,
                &reader,
                &extractor,
                0.3,
                &runner(),
                &CancellationToken::new(),
                |_| {},
            )
            .unwrap()
            .groups
        };

        let first = run();
        assert!(!first.is_empty());
        assert_eq!(first, run());
    }

    #[test]
    fn injected_distance_is_symmetric_and_reflexive() {
        let extractor = TableExtractor::new();
        let a = FeaturePrint::new(vec![0.3]);
        let b = FeaturePrint::new(vec![0.9]);

        assert_eq!(extractor.distance(&a, &a), 0.0);
        assert_eq!(extractor.distance(&a, &b), extractor.distance(&b, &a));
    }
}
