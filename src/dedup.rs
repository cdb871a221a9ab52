//! Removal of repeated and contradictory phenotype measurements.
//!
//! Two passes over the rows of one grouping:
//!
//! 1. rows repeating a (genome, antibiotic, phenotype) triple collapse to the
//!    first occurrence;
//! 2. any (genome, antibiotic) pair still reported more than once carries
//!    conflicting phenotypes and is removed entirely.
//!
//! Conflicts are never arbitrated (no majority vote, no preference for
//! "Resistant").

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::MetadataRow;

/// Counters for one deduplication pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub total_seen: usize,
    pub repeats_collapsed: usize,
    pub contradictions_dropped: usize,
    pub kept: usize,
}

pub fn deduplicate(rows: Vec<MetadataRow>) -> Vec<MetadataRow> {
    deduplicate_with_stats(rows).0
}

/// Same as [`deduplicate`], also reporting what was removed.
///
/// Surviving rows keep their relative input order.
pub fn deduplicate_with_stats(rows: Vec<MetadataRow>) -> (Vec<MetadataRow>, DedupStats) {
    let total_seen = rows.len();

    let mut seen = HashSet::with_capacity(rows.len());
    let unique = rows
        .into_iter()
        .filter(|row| {
            seen.insert((
                row.genome_id.clone(),
                row.antibiotic.clone(),
                row.resistant_phenotype.clone(),
            ))
        })
        .collect::<Vec<_>>();
    let repeats_collapsed = total_seen - unique.len();

    let mut per_pair = HashMap::<(&str, &str), usize>::with_capacity(unique.len());
    for row in &unique {
        *per_pair
            .entry((row.genome_id.as_str(), row.antibiotic.as_str()))
            .or_default() += 1;
    }
    let conflicting = per_pair
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((genome_id, antibiotic), _)| (genome_id.to_string(), antibiotic.to_string()))
        .collect::<HashSet<_>>();

    let before = unique.len();
    let kept = if conflicting.is_empty() {
        unique
    } else {
        unique
            .into_iter()
            .filter(|row| {
                !conflicting.contains(&(row.genome_id.clone(), row.antibiotic.clone()))
            })
            .collect::<Vec<_>>()
    };

    let stats = DedupStats {
        total_seen,
        repeats_collapsed,
        contradictions_dropped: before - kept.len(),
        kept: kept.len(),
    };
    if stats.repeats_collapsed > 0 || stats.contradictions_dropped > 0 {
        debug!(
            total = stats.total_seen,
            collapsed = stats.repeats_collapsed,
            contradictions = stats.contradictions_dropped,
            "deduplicated phenotype measurements"
        );
    }
    (kept, stats)
}
