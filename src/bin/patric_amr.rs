use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use patric_amr::app::{App, GenomeDownloadOptions, MetadataKind, ProgressSinkKind, TracingSink};
use patric_amr::config::ConfigLoader;
use patric_amr::datasets::DatasetFilter;
use patric_amr::domain::GenomeId;
use patric_amr::error::AmrError;
use patric_amr::labels::LabelQuery;
use patric_amr::output::JsonOutput;
use patric_amr::patric::PatricHttpClient;
use patric_amr::store::Store;

#[derive(Parser)]
#[command(name = "patric-amr")]
#[command(about = "Curated antimicrobial-resistance datasets from the PATRIC database")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Manage the release metadata tables")]
    Metadata(MetadataArgs),
    #[command(about = "List (species, antibiotic) datasets meeting count thresholds")]
    Datasets(DatasetsArgs),
    #[command(about = "Extract genome phenotype labels for one antibiotic")]
    Labels(LabelsArgs),
    #[command(about = "Download genome contigs and annotations")]
    Genomes(GenomesArgs),
}

#[derive(Args)]
struct MetadataArgs {
    #[command(subcommand)]
    command: MetadataCommand,
}

#[derive(Subcommand)]
enum MetadataCommand {
    #[command(about = "Download the latest AMR metadata")]
    Update {
        #[arg(long)]
        force: bool,

        #[arg(long, help = "Also download the genome metadata table")]
        genomes: bool,
    },
    #[command(about = "Show when the AMR metadata was last modified")]
    Date,
}

#[derive(Args)]
struct DatasetsArgs {
    #[arg(long, default_value_t = 0)]
    min_resistant: usize,

    #[arg(long)]
    max_resistant: Option<usize>,

    #[arg(long, default_value_t = 0)]
    min_susceptible: usize,

    #[arg(long)]
    max_susceptible: Option<usize>,

    #[arg(long, help = "Pool all species per antibiotic")]
    pooled: bool,

    #[arg(long)]
    metadata: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct LabelsArgs {
    antibiotic: String,

    #[arg(long = "species")]
    species: Vec<String>,

    #[arg(long)]
    keep_intermediate: bool,

    #[arg(long)]
    metadata: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct GenomesArgs {
    #[arg(required = true)]
    ids: Vec<String>,

    #[arg(long)]
    annotations: bool,

    #[arg(long)]
    no_contigs: bool,

    #[arg(long)]
    throttle: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<AmrError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &AmrError) -> u8 {
    match error {
        AmrError::SourceUnavailable(_) | AmrError::ConfigRead(_) => 2,
        AmrError::PatricHttp(_) | AmrError::PatricStatus { .. } => 3,
        AmrError::MissingColumns(_) | AmrError::UnexpectedPhenotypes(_) | AmrError::Schema(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let client = PatricHttpClient::new(config.timeout)?;
    let app = App::new(
        Store::new(config.data_dir.clone()),
        config.release.clone(),
        client,
        config.throttle,
    );

    match cli.command {
        Commands::Metadata(args) => run_metadata(args, &app),
        Commands::Datasets(args) => run_datasets(args, &app),
        Commands::Labels(args) => run_labels(args, &app),
        Commands::Genomes(args) => run_genomes(args, &app),
    }
}

fn run_metadata(args: MetadataArgs, app: &App<PatricHttpClient>) -> miette::Result<()> {
    let sink = TracingSink(ProgressSinkKind::Metadata);
    match args.command {
        MetadataCommand::Update { force, genomes } => {
            let result = app.update_metadata(MetadataKind::Amr, force, &sink)?;
            JsonOutput::print_metadata_update(&result).into_diagnostic()?;
            if genomes {
                let result = app.update_metadata(MetadataKind::Genome, force, &sink)?;
                JsonOutput::print_metadata_update(&result).into_diagnostic()?;
            }
            Ok(())
        }
        MetadataCommand::Date => {
            let result = app.metadata_last_modified(&sink)?;
            JsonOutput::print_metadata_date(&result).into_diagnostic()?;
            Ok(())
        }
    }
}

fn run_datasets(args: DatasetsArgs, app: &App<PatricHttpClient>) -> miette::Result<()> {
    let filter = DatasetFilter {
        min_resistant: args.min_resistant,
        max_resistant: args.max_resistant,
        min_susceptible: args.min_susceptible,
        max_susceptible: args.max_susceptible,
        per_species: !args.pooled,
    };
    let sink = TracingSink(ProgressSinkKind::Datasets);
    let result = app.list_datasets(args.metadata.as_deref(), filter, &sink)?;
    JsonOutput::print_datasets(&result).into_diagnostic()?;
    Ok(())
}

fn run_labels(args: LabelsArgs, app: &App<PatricHttpClient>) -> miette::Result<()> {
    let mut query = LabelQuery::new(args.antibiotic);
    if !args.species.is_empty() {
        query = query.with_species(args.species);
    }
    if args.keep_intermediate {
        query = query.keep_intermediate();
    }
    let sink = TracingSink(ProgressSinkKind::Labels);
    let result = app.labels(args.metadata.as_deref(), &query, &sink)?;
    JsonOutput::print_labels(&result).into_diagnostic()?;
    Ok(())
}

fn run_genomes(args: GenomesArgs, app: &App<PatricHttpClient>) -> miette::Result<()> {
    let ids = args
        .ids
        .iter()
        .map(|value| value.parse::<GenomeId>())
        .collect::<Result<Vec<_>, _>>()?;
    let options = GenomeDownloadOptions {
        contigs: !args.no_contigs,
        annotations: args.annotations,
        throttle: args.throttle,
    };
    let sink = TracingSink(ProgressSinkKind::Genomes);
    let result = app.download_genomes(&ids, options, &sink)?;
    JsonOutput::print_genomes(&result).into_diagnostic()?;
    Ok(())
}
