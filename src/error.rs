use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AmrError {
    #[error("metadata source unavailable: {0}")]
    #[diagnostic(help("run `patric-amr metadata update` or pass --metadata PATH"))]
    SourceUnavailable(String),

    #[error("metadata table is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("unexpected phenotype labels {}: the upstream metadata format has changed", format_labels(.0))]
    #[diagnostic(help("expected at most Resistant, Susceptible and Intermediate"))]
    UnexpectedPhenotypes(Vec<String>),

    #[error("malformed metadata table: {0}")]
    Schema(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid genome id: {0}")]
    InvalidGenomeId(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("PATRIC request failed: {0}")]
    PatricHttp(String),

    #[error("PATRIC returned status {status} for {url}")]
    PatricStatus { status: u16, url: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(String),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

fn format_labels(labels: &[String]) -> String {
    let quoted = labels
        .iter()
        .map(|label| format!("{label:?}"))
        .collect::<Vec<_>>();
    format!("[{}]", quoted.join(", "))
}
