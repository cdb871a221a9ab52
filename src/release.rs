use percent_encoding::percent_decode_str;
use reqwest::Url;

use crate::domain::GenomeId;
use crate::error::AmrError;

pub const DEFAULT_BASE_URL: &str = "ftp://ftp.bvbrc.org/";

const AMR_METADATA_PATH: &str = "RELEASE_NOTES/PATRIC_genomes_AMR.txt";
const GENOME_METADATA_PATH: &str = "RELEASE_NOTES/genome_metadata";
const GENOMES_PATH: &str = "genomes/";

/// File layout of a PATRIC release tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    base: Url,
}

impl Release {
    pub fn new(base_url: &str) -> Result<Self, AmrError> {
        let mut base = Url::parse(base_url.trim())
            .map_err(|err| AmrError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(AmrError::InvalidUrl(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn amr_metadata_url(&self) -> Result<Url, AmrError> {
        self.join(AMR_METADATA_PATH)
    }

    pub fn genome_metadata_url(&self) -> Result<Url, AmrError> {
        self.join(GENOME_METADATA_PATH)
    }

    pub fn genome_contigs_url(&self, id: &GenomeId) -> Result<Url, AmrError> {
        self.join(&format!("{GENOMES_PATH}{id}/{id}.fna"))
    }

    pub fn genome_features_url(&self, id: &GenomeId) -> Result<Url, AmrError> {
        self.join(&format!("{GENOMES_PATH}{id}/{id}.PATRIC.features.tab"))
    }

    fn join(&self, path: &str) -> Result<Url, AmrError> {
        self.base
            .join(path)
            .map_err(|err| AmrError::InvalidUrl(format!("{}{path}: {err}", self.base)))
    }
}

/// The transport URL for `url`: FTP locations are served from the HTTPS
/// mirror of the same host.
pub fn transport_url(url: &Url) -> Result<Url, AmrError> {
    if url.scheme() != "ftp" {
        return Ok(url.clone());
    }
    let host = url
        .host_str()
        .ok_or_else(|| AmrError::InvalidUrl(url.to_string()))?;
    let mut mirrored = format!("https://{host}{}", url.path());
    if let Some(query) = url.query() {
        mirrored.push('?');
        mirrored.push_str(query);
    }
    Url::parse(&mirrored).map_err(|err| AmrError::InvalidUrl(format!("{mirrored}: {err}")))
}

/// Local file name for `url`: its last path segment, percent-decoded.
///
/// Names that would escape the destination directory are rejected.
pub fn extract_file_name(url: &str) -> Result<String, AmrError> {
    let parsed =
        Url::parse(url.trim()).map_err(|err| AmrError::InvalidUrl(format!("{url}: {err}")))?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let name = percent_decode(segment)
        .ok_or_else(|| AmrError::InvalidUrl(format!("{url}: file name is not valid UTF-8")))?;
    let is_safe = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if !is_safe {
        return Err(AmrError::InvalidUrl(format!("{url}: no usable file name")));
    }
    Ok(name)
}

fn percent_decode(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|name| name.into_owned())
}
