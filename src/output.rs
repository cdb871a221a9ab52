use std::io::{self, Write};

use serde::Serialize;

use crate::app::{
    DatasetListResult, GenomeDownloadResult, LabelResult, MetadataDateResult,
    MetadataUpdateResult,
};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_metadata_update(result: &MetadataUpdateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_metadata_date(result: &MetadataDateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_datasets(result: &DatasetListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_labels(result: &LabelResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_genomes(result: &GenomeDownloadResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
