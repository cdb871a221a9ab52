use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::GenomeId;
use crate::error::AmrError;

/// On-disk layout of downloaded PATRIC files:
///
/// ```text
/// <root>/metadata/PATRIC_genomes_AMR.txt
/// <root>/metadata/genome_metadata
/// <root>/genomes/<genome id>/<genome id>.fna
/// ```
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn metadata_dir(&self) -> Utf8PathBuf {
        self.root.join("metadata")
    }

    pub fn metadata_path(&self, file_name: &str) -> Utf8PathBuf {
        self.metadata_dir().join(file_name)
    }

    pub fn genome_dir(&self, id: &GenomeId) -> Utf8PathBuf {
        self.root.join("genomes").join(id.as_str())
    }

    pub fn ensure_dir(path: &Utf8Path) -> Result<(), AmrError> {
        fs::create_dir_all(path.as_std_path())
            .map_err(|err| AmrError::Filesystem(format!("create {path}: {err}")))
    }

    pub fn exists(path: &Utf8Path) -> bool {
        path.as_std_path().is_file()
    }
}
