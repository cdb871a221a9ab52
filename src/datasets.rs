//! Enumeration of (species, antibiotic) datasets that meet count thresholds.

use std::collections::{BTreeMap, BTreeSet, btree_map};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::dedup::deduplicate;
use crate::domain::{MetadataRow, RESISTANT, SUSCEPTIBLE};
use crate::error::AmrError;
use crate::metadata::MetadataTable;

/// Inclusion thresholds for [`list_datasets`]. All bounds are inclusive and
/// `None` leaves the upper bound open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetFilter {
    pub min_resistant: usize,
    pub max_resistant: Option<usize>,
    pub min_susceptible: usize,
    pub max_susceptible: Option<usize>,
    /// Group by (species, antibiotic) when set, otherwise pool all species
    /// per antibiotic.
    pub per_species: bool,
}

impl Default for DatasetFilter {
    fn default() -> Self {
        Self {
            min_resistant: 0,
            max_resistant: None,
            min_susceptible: 0,
            max_susceptible: None,
            per_species: true,
        }
    }
}

impl DatasetFilter {
    pub fn validate(&self) -> Result<(), AmrError> {
        if self.max_resistant.is_some_and(|max| max < self.min_resistant) {
            return Err(AmrError::InvalidArgument(format!(
                "max_resistant {} is below min_resistant {}",
                self.max_resistant.unwrap_or_default(),
                self.min_resistant
            )));
        }
        if self
            .max_susceptible
            .is_some_and(|max| max < self.min_susceptible)
        {
            return Err(AmrError::InvalidArgument(format!(
                "max_susceptible {} is below min_susceptible {}",
                self.max_susceptible.unwrap_or_default(),
                self.min_susceptible
            )));
        }
        Ok(())
    }

    pub fn accepts(&self, n_resistant: usize, n_susceptible: usize) -> bool {
        within(n_resistant, self.min_resistant, self.max_resistant)
            && within(n_susceptible, self.min_susceptible, self.max_susceptible)
    }
}

fn within(value: usize, min: usize, max: Option<usize>) -> bool {
    value >= min && max.is_none_or(|max| value <= max)
}

/// A labeled classification task: isolates of `species` tested against
/// `antibiotic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmrDataset {
    pub species: BTreeSet<String>,
    pub antibiotic: String,
    pub n_resistant: usize,
    pub n_susceptible: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    species: Option<String>,
    antibiotic: String,
}

/// Lazy iterator over qualifying datasets.
///
/// Rows are partitioned up front; deduplication, counting and filtering run
/// one group per call to `next`.
#[derive(Debug)]
pub struct Datasets {
    groups: btree_map::IntoIter<GroupKey, Vec<MetadataRow>>,
    filter: DatasetFilter,
}

impl Datasets {
    pub fn from_rows(rows: Vec<MetadataRow>, filter: DatasetFilter) -> Result<Self, AmrError> {
        filter.validate()?;
        let mut groups = BTreeMap::<GroupKey, Vec<MetadataRow>>::new();
        for row in rows {
            let key = GroupKey {
                species: filter.per_species.then(|| row.genome_name.clone()),
                antibiotic: row.antibiotic.clone(),
            };
            groups.entry(key).or_default().push(row);
        }
        debug!(
            groups = groups.len(),
            per_species = filter.per_species,
            "partitioned AMR metadata"
        );
        Ok(Self {
            groups: groups.into_iter(),
            filter,
        })
    }

    fn evaluate(&self, key: GroupKey, rows: Vec<MetadataRow>) -> Option<AmrDataset> {
        let rows = deduplicate(rows);
        let n_resistant = count_label(&rows, RESISTANT);
        let n_susceptible = count_label(&rows, SUSCEPTIBLE);
        if !self.filter.accepts(n_resistant, n_susceptible) {
            return None;
        }
        let species = match key.species {
            Some(species) => BTreeSet::from([species]),
            None => rows.into_iter().map(|row| row.genome_name).collect(),
        };
        Some(AmrDataset {
            species,
            antibiotic: key.antibiotic,
            n_resistant,
            n_susceptible,
        })
    }
}

impl Iterator for Datasets {
    type Item = AmrDataset;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((key, rows)) = self.groups.next() {
            if let Some(dataset) = self.evaluate(key, rows) {
                return Some(dataset);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.groups.size_hint().1)
    }
}

fn count_label(rows: &[MetadataRow], label: &str) -> usize {
    rows.iter()
        .filter(|row| row.resistant_phenotype == label)
        .count()
}

/// Reads the metadata table at `path` and enumerates datasets passing
/// `filter`. Each call re-reads the table.
pub fn list_datasets(path: &Path, filter: DatasetFilter) -> Result<Datasets, AmrError> {
    filter.validate()?;
    let table = MetadataTable::from_path(path)?;
    Datasets::from_rows(table.into_rows(), filter)
}

/// Enumerates datasets from a table that is already loaded.
pub fn datasets_in(table: &MetadataTable, filter: DatasetFilter) -> Result<Datasets, AmrError> {
    Datasets::from_rows(table.rows().to_vec(), filter)
}
