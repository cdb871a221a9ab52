//! Loader for the PATRIC AMR metadata table (`PATRIC_genomes_AMR.txt`).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::domain::{MetadataRow, normalize_antibiotic, normalize_genome_name};
use crate::error::AmrError;

pub const GENOME_ID: &str = "genome_id";
pub const GENOME_NAME: &str = "genome_name";
pub const ANTIBIOTIC: &str = "antibiotic";
pub const RESISTANT_PHENOTYPE: &str = "resistant_phenotype";

const REQUIRED_COLUMNS: [&str; 4] = [GENOME_ID, GENOME_NAME, ANTIBIOTIC, RESISTANT_PHENOTYPE];

/// Positions of the required columns in the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    genome_id: usize,
    genome_name: usize,
    antibiotic: usize,
    resistant_phenotype: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, AmrError> {
        let position = |name: &str| headers.iter().position(|header| header.trim() == name);
        match (
            position(GENOME_ID),
            position(GENOME_NAME),
            position(ANTIBIOTIC),
            position(RESISTANT_PHENOTYPE),
        ) {
            (Some(genome_id), Some(genome_name), Some(antibiotic), Some(resistant_phenotype)) => {
                Ok(Self {
                    genome_id,
                    genome_name,
                    antibiotic,
                    resistant_phenotype,
                })
            }
            _ => {
                let missing = REQUIRED_COLUMNS
                    .iter()
                    .copied()
                    .filter(|&name| position(name).is_none())
                    .map(str::to_string)
                    .collect();
                Err(AmrError::MissingColumns(missing))
            }
        }
    }

    fn row(&self, record: &StringRecord) -> Option<MetadataRow> {
        let field = |index: usize| {
            record
                .get(index)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };
        Some(MetadataRow {
            genome_id: field(self.genome_id)?.to_string(),
            genome_name: normalize_genome_name(field(self.genome_name)?),
            antibiotic: normalize_antibiotic(field(self.antibiotic)?),
            resistant_phenotype: field(self.resistant_phenotype)?.to_string(),
        })
    }
}

/// An AMR metadata table loaded into memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    rows: Vec<MetadataRow>,
}

impl MetadataTable {
    pub fn new(rows: Vec<MetadataRow>) -> Self {
        Self { rows }
    }

    pub fn from_path(path: &Path) -> Result<Self, AmrError> {
        let file = File::open(path).map_err(|err| {
            AmrError::SourceUnavailable(format!("open {}: {err}", path.display()))
        })?;
        Self::from_reader(file)
    }

    /// Parses a tab-delimited table with a header row.
    ///
    /// Only the four required columns are read. Rows where any of them is
    /// absent or blank are dropped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AmrError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers().map_err(map_csv_error)?.clone();
        let columns = ColumnIndex::from_headers(&headers)?;

        let mut rows = Vec::new();
        let mut dropped = 0usize;
        for record in reader.records() {
            let record = record.map_err(map_csv_error)?;
            match columns.row(&record) {
                Some(row) => rows.push(row),
                None => dropped += 1,
            }
        }
        debug!(rows = rows.len(), dropped, "loaded AMR metadata table");
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<MetadataRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn load(path: &Path) -> Result<Vec<MetadataRow>, AmrError> {
    MetadataTable::from_path(path).map(MetadataTable::into_rows)
}

fn map_csv_error(err: csv::Error) -> AmrError {
    match err.kind() {
        csv::ErrorKind::Io(_) => AmrError::SourceUnavailable(err.to_string()),
        _ => AmrError::Schema(err.to_string()),
    }
}
