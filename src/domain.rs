use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AmrError;

pub const RESISTANT: &str = "Resistant";
pub const SUSCEPTIBLE: &str = "Susceptible";
pub const INTERMEDIATE: &str = "Intermediate";

/// Labels PATRIC reports that carry no usable phenotype.
pub const NOISE_LABELS: [&str; 3] = ["Not defined", "Non-susceptible", "Nonsusceptible"];

/// Upper bound on distinct phenotype labels once noise labels are removed.
pub const MAX_PHENOTYPE_LABELS: usize = 3;

/// One reported phenotype measurement from the AMR metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataRow {
    pub genome_id: String,
    pub genome_name: String,
    pub antibiotic: String,
    pub resistant_phenotype: String,
}

impl MetadataRow {
    pub fn is_noise(&self) -> bool {
        NOISE_LABELS.contains(&self.resistant_phenotype.as_str())
    }
}

/// Reduces a free-text organism name to its first two tokens, lower-cased.
///
/// This is a heuristic for "genus species". Strain designations and
/// subspecies are discarded, and names with a single token stay single.
pub fn normalize_genome_name(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_antibiotic(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phenotype {
    Susceptible,
    Resistant,
    Intermediate,
}

impl Phenotype {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            SUSCEPTIBLE => Some(Phenotype::Susceptible),
            RESISTANT => Some(Phenotype::Resistant),
            INTERMEDIATE => Some(Phenotype::Intermediate),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Phenotype::Susceptible => 0,
            Phenotype::Resistant => 1,
            Phenotype::Intermediate => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phenotype::Susceptible => SUSCEPTIBLE,
            Phenotype::Resistant => RESISTANT,
            Phenotype::Intermediate => INTERMEDIATE,
        }
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// PATRIC genome identifier as used in release file paths, e.g. `1280.10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomeId(String);

impl GenomeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GenomeId {
    type Err = AmrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty()
            && normalized != "."
            && normalized != ".."
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
        if !is_valid {
            return Err(AmrError::InvalidGenomeId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn genome_name_keeps_two_tokens() {
        assert_eq!(
            normalize_genome_name("Escherichia coli  O157:H7 str. EDL933"),
            "escherichia coli"
        );
        assert_eq!(normalize_genome_name("  Klebsiella "), "klebsiella");
        assert_eq!(normalize_genome_name(""), "");
    }

    #[test]
    fn phenotype_codes() {
        assert_eq!(Phenotype::from_label("Susceptible").map(Phenotype::code), Some(0));
        assert_eq!(Phenotype::from_label("Resistant").map(Phenotype::code), Some(1));
        assert_eq!(Phenotype::from_label("Intermediate").map(Phenotype::code), Some(2));
        assert_eq!(Phenotype::from_label("resistant"), None);
    }

    #[test]
    fn parse_genome_id() {
        let id: GenomeId = " 1280.10 ".parse().unwrap();
        assert_eq!(id.as_str(), "1280.10");

        let err = "../etc".parse::<GenomeId>().unwrap_err();
        assert_matches!(err, AmrError::InvalidGenomeId(_));
        assert_matches!("".parse::<GenomeId>(), Err(AmrError::InvalidGenomeId(_)));
    }
}
