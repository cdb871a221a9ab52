//! Per-antibiotic phenotype labels, ready for a classifier.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::dedup::deduplicate;
use crate::domain::{
    INTERMEDIATE, MAX_PHENOTYPE_LABELS, MetadataRow, Phenotype, normalize_antibiotic,
};
use crate::error::AmrError;
use crate::metadata::MetadataTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelQuery {
    pub antibiotic: String,
    /// Restrict to these species; names are compared lower-cased against
    /// the normalized genome name.
    pub species: Option<Vec<String>>,
    pub drop_intermediate: bool,
}

impl LabelQuery {
    pub fn new(antibiotic: impl Into<String>) -> Self {
        Self {
            antibiotic: antibiotic.into(),
            species: None,
            drop_intermediate: true,
        }
    }

    pub fn with_species<I, S>(mut self, species: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.species = Some(species.into_iter().map(Into::into).collect());
        self
    }

    pub fn keep_intermediate(mut self) -> Self {
        self.drop_intermediate = false;
        self
    }
}

/// Index-aligned label arrays: position `i` of each vector describes the
/// same genome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AmrLabels {
    pub genome_names: Vec<String>,
    pub genome_ids: Vec<String>,
    pub phenotypes: Vec<u8>,
}

impl AmrLabels {
    pub fn len(&self) -> usize {
        self.phenotypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phenotypes.is_empty()
    }

    pub fn count(&self, phenotype: Phenotype) -> usize {
        let code = phenotype.code();
        self.phenotypes.iter().filter(|value| **value == code).count()
    }

    fn push(&mut self, row: MetadataRow, phenotype: Phenotype) {
        self.genome_names.push(row.genome_name);
        self.genome_ids.push(row.genome_id);
        self.phenotypes.push(phenotype.code());
    }
}

/// Reads the metadata table at `path` and extracts labels for `query`.
pub fn labels_for(path: &Path, query: &LabelQuery) -> Result<AmrLabels, AmrError> {
    let table = MetadataTable::from_path(path)?;
    labels_from_rows(table.into_rows(), query)
}

pub fn labels_in(table: &MetadataTable, query: &LabelQuery) -> Result<AmrLabels, AmrError> {
    let antibiotic = normalized_query_antibiotic(query)?;
    let rows = table
        .rows()
        .iter()
        .filter(|row| row.antibiotic == antibiotic)
        .cloned()
        .collect();
    extract(rows, query)
}

pub fn labels_from_rows(rows: Vec<MetadataRow>, query: &LabelQuery) -> Result<AmrLabels, AmrError> {
    let antibiotic = normalized_query_antibiotic(query)?;
    let rows = rows
        .into_iter()
        .filter(|row| row.antibiotic == antibiotic)
        .collect();
    extract(rows, query)
}

fn normalized_query_antibiotic(query: &LabelQuery) -> Result<String, AmrError> {
    let antibiotic = normalize_antibiotic(&query.antibiotic);
    if antibiotic.is_empty() {
        return Err(AmrError::InvalidArgument(
            "antibiotic name must not be empty".to_string(),
        ));
    }
    Ok(antibiotic)
}

/// Runs the label pipeline on rows already restricted to one antibiotic.
fn extract(rows: Vec<MetadataRow>, query: &LabelQuery) -> Result<AmrLabels, AmrError> {
    let rows = deduplicate(rows);
    let before_noise = rows.len();
    let rows = rows
        .into_iter()
        .filter(|row| !row.is_noise())
        .collect::<Vec<_>>();
    if rows.len() < before_noise {
        debug!(
            removed = before_noise - rows.len(),
            "removed non-informative phenotype labels"
        );
    }

    check_label_cardinality(&rows)?;

    let species = query.species.as_ref().map(|species| {
        species
            .iter()
            .map(|name| name.trim().to_lowercase())
            .collect::<HashSet<_>>()
    });

    let mut labels = AmrLabels::default();
    for row in rows {
        if query.drop_intermediate && row.resistant_phenotype == INTERMEDIATE {
            continue;
        }
        if let Some(species) = &species
            && !species.contains(&row.genome_name)
        {
            continue;
        }
        // Labels other than Resistant and Intermediate code as susceptible.
        let phenotype = Phenotype::from_label(&row.resistant_phenotype).unwrap_or_else(|| {
            warn!(label = %row.resistant_phenotype, "unknown phenotype label coded as 0");
            Phenotype::Susceptible
        });
        labels.push(row, phenotype);
    }
    Ok(labels)
}

fn check_label_cardinality(rows: &[MetadataRow]) -> Result<(), AmrError> {
    let distinct = rows
        .iter()
        .map(|row| row.resistant_phenotype.as_str())
        .collect::<BTreeSet<_>>();
    if distinct.len() > MAX_PHENOTYPE_LABELS {
        return Err(AmrError::UnexpectedPhenotypes(
            distinct.into_iter().map(str::to_string).collect(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn row(id: &str, phenotype: &str) -> MetadataRow {
        MetadataRow {
            genome_id: id.to_string(),
            genome_name: "staphylococcus aureus".to_string(),
            antibiotic: "methicillin".to_string(),
            resistant_phenotype: phenotype.to_string(),
        }
    }

    #[test]
    fn fourth_label_is_a_schema_error() {
        let rows = vec![
            row("1", "Resistant"),
            row("2", "Susceptible"),
            row("3", "Intermediate"),
            row("4", "Susceptible-dose dependent"),
        ];
        let err = labels_from_rows(rows, &LabelQuery::new("Methicillin")).unwrap_err();
        assert_matches!(err, AmrError::UnexpectedPhenotypes(labels) if labels.len() == 4);
    }

    #[test]
    fn empty_antibiotic_is_rejected() {
        let err = labels_from_rows(Vec::new(), &LabelQuery::new("  ")).unwrap_err();
        assert_matches!(err, AmrError::InvalidArgument(_));
    }
}
