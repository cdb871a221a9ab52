use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Serialize;
use tracing::info;

use crate::datasets::{AmrDataset, DatasetFilter, list_datasets};
use crate::domain::{GenomeId, Phenotype, normalize_antibiotic};
use crate::error::AmrError;
use crate::labels::{AmrLabels, LabelQuery, labels_for};
use crate::patric::PatricClient;
use crate::release::{Release, extract_file_name};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataKind {
    Amr,
    Genome,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataUpdateResult {
    pub kind: MetadataKind,
    pub url: String,
    pub path: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataDateResult {
    pub url: String,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetListResult {
    pub metadata: String,
    pub datasets: Vec<AmrDataset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelResult {
    pub antibiotic: String,
    pub species: Option<Vec<String>>,
    pub n_resistant: usize,
    pub n_susceptible: usize,
    pub n_intermediate: usize,
    pub labels: AmrLabels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenomeDownloadOptions {
    pub contigs: bool,
    pub annotations: bool,
    /// Pause between requests to spare the PATRIC servers.
    pub throttle: bool,
}

impl Default for GenomeDownloadOptions {
    fn default() -> Self {
        Self {
            contigs: true,
            annotations: false,
            throttle: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenomeDownloadResult {
    pub items: Vec<GenomeDownloadItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenomeDownloadItem {
    pub genome_id: String,
    pub path: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy)]
pub enum ProgressSinkKind {
    Metadata,
    Datasets,
    Labels,
    Genomes,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Forwards progress events to `tracing` at info level.
pub struct TracingSink(pub ProgressSinkKind);

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(
                kind = ?self.0,
                elapsed_ms = elapsed.as_millis() as u64,
                "{}",
                event.message
            ),
            None => info!(kind = ?self.0, "{}", event.message),
        }
    }
}

#[derive(Clone)]
pub struct App<C: PatricClient> {
    store: Store,
    release: Release,
    client: C,
    throttle: Duration,
}

impl<C: PatricClient> App<C> {
    pub fn new(store: Store, release: Release, client: C, throttle: Duration) -> Self {
        Self {
            store,
            release,
            client,
            throttle,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Local path of the AMR metadata table, whether or not it was fetched.
    pub fn amr_metadata_path(&self) -> Result<Utf8PathBuf, AmrError> {
        let url = self.release.amr_metadata_url()?;
        Ok(self.store.metadata_path(&extract_file_name(url.as_str())?))
    }

    pub fn update_metadata(
        &self,
        kind: MetadataKind,
        force: bool,
        sink: &dyn ProgressSink,
    ) -> Result<MetadataUpdateResult, AmrError> {
        let url = match kind {
            MetadataKind::Amr => self.release.amr_metadata_url()?,
            MetadataKind::Genome => self.release.genome_metadata_url()?,
        };
        let destination_dir = self.store.metadata_dir();
        Store::ensure_dir(&destination_dir)?;

        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {url}"),
            elapsed: None,
        });
        let start = Instant::now();
        let info = self
            .client
            .fetch(&url, destination_dir.as_std_path(), force)
            .map_err(|err| {
                AmrError::SourceUnavailable(format!("failed to download {url}: {err}"))
            })?;
        sink.event(ProgressEvent {
            message: "phase=Store; metadata ready".to_string(),
            elapsed: Some(start.elapsed()),
        });

        Ok(MetadataUpdateResult {
            kind,
            url: url.to_string(),
            path: info.path.display().to_string(),
            action: action(info.skipped).to_string(),
        })
    }

    pub fn metadata_last_modified(
        &self,
        sink: &dyn ProgressSink,
    ) -> Result<MetadataDateResult, AmrError> {
        let url = self.release.amr_metadata_url()?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {url}"),
            elapsed: None,
        });
        let last_modified = self.client.last_modified(&url)?;
        Ok(MetadataDateResult {
            url: url.to_string(),
            last_modified,
        })
    }

    pub fn list_datasets(
        &self,
        metadata: Option<&Utf8Path>,
        filter: DatasetFilter,
        sink: &dyn ProgressSink,
    ) -> Result<DatasetListResult, AmrError> {
        let path = self.resolve_metadata(metadata)?;
        sink.event(ProgressEvent {
            message: format!("phase=Load; {path}"),
            elapsed: None,
        });
        let start = Instant::now();
        let datasets = list_datasets(path.as_std_path(), filter)?.collect::<Vec<_>>();
        sink.event(ProgressEvent {
            message: format!("phase=Filter; {} datasets", datasets.len()),
            elapsed: Some(start.elapsed()),
        });
        Ok(DatasetListResult {
            metadata: path.to_string(),
            datasets,
        })
    }

    pub fn labels(
        &self,
        metadata: Option<&Utf8Path>,
        query: &LabelQuery,
        sink: &dyn ProgressSink,
    ) -> Result<LabelResult, AmrError> {
        let path = self.resolve_metadata(metadata)?;
        sink.event(ProgressEvent {
            message: format!("phase=Load; {path}"),
            elapsed: None,
        });
        let labels = labels_for(path.as_std_path(), query)?;
        Ok(LabelResult {
            antibiotic: normalize_antibiotic(&query.antibiotic),
            species: query.species.clone(),
            n_resistant: labels.count(Phenotype::Resistant),
            n_susceptible: labels.count(Phenotype::Susceptible),
            n_intermediate: labels.count(Phenotype::Intermediate),
            labels,
        })
    }

    pub fn download_genomes(
        &self,
        ids: &[GenomeId],
        options: GenomeDownloadOptions,
        sink: &dyn ProgressSink,
    ) -> Result<GenomeDownloadResult, AmrError> {
        if !options.contigs && !options.annotations {
            return Err(AmrError::InvalidArgument(
                "nothing to download: contigs and annotations are both disabled".to_string(),
            ));
        }

        let mut items = Vec::new();
        let mut first_request = true;
        for id in ids {
            let destination_dir = self.store.genome_dir(id);
            Store::ensure_dir(&destination_dir)?;
            for url in self.genome_urls(id, options)? {
                if options.throttle && !first_request {
                    thread::sleep(self.throttle);
                }
                first_request = false;
                sink.event(ProgressEvent {
                    message: format!("phase=Fetch; genome {id}: {url}"),
                    elapsed: None,
                });
                let info = self.client.fetch(&url, destination_dir.as_std_path(), false)?;
                items.push(GenomeDownloadItem {
                    genome_id: id.to_string(),
                    path: info.path.display().to_string(),
                    action: action(info.skipped).to_string(),
                });
            }
        }
        Ok(GenomeDownloadResult { items })
    }

    fn genome_urls(
        &self,
        id: &GenomeId,
        options: GenomeDownloadOptions,
    ) -> Result<Vec<Url>, AmrError> {
        let mut urls = Vec::new();
        if options.contigs {
            urls.push(self.release.genome_contigs_url(id)?);
        }
        if options.annotations {
            urls.push(self.release.genome_features_url(id)?);
        }
        Ok(urls)
    }

    fn resolve_metadata(&self, metadata: Option<&Utf8Path>) -> Result<Utf8PathBuf, AmrError> {
        let path = match metadata {
            Some(path) => path.to_path_buf(),
            None => self.amr_metadata_path()?,
        };
        if !Store::exists(&path) {
            return Err(AmrError::SourceUnavailable(format!(
                "no metadata table at {path}"
            )));
        }
        Ok(path)
    }
}

fn action(skipped: bool) -> &'static str {
    if skipped { "cache" } else { "download" }
}
