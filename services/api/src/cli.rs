use crate::server;
use clap::{Args, Parser, Subcommand};
use esg_engine::config::{AppConfig, EngineConfig};
use esg_engine::error::AppError;
use esg_engine::export::to_csv_bytes;
use esg_engine::scenarios::{DistanceMetric, KnnParams};
use esg_engine::scoring::Pillar;
use esg_engine::{telemetry, EngineContext, Ranking, ScenarioParams};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "esg-engine",
    about = "Score supplier ESG data and run deterministic scenario analyses",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score the dataset and print the ranked table, or write it as CSV
    Score(ScoreArgs),
    /// Run one scenario (s1, s2, s3 or s4) and write its artifact
    Scenario(ScenarioArgs),
}

/// Input overrides shared by every command.
#[derive(Args, Debug, Default)]
pub(crate) struct InputArgs {
    /// Supplier dataset (JSON, or CSV by extension)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    /// Industry bands document
    #[arg(long)]
    pub(crate) bands: Option<PathBuf>,
    /// Scoring settings document
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,
}

impl InputArgs {
    pub(crate) fn apply(self, config: &mut EngineConfig) {
        if let Some(dataset) = self.dataset {
            config.dataset_path = dataset;
        }
        if let Some(bands) = self.bands {
            config.bands_path = bands;
        }
        if let Some(settings) = self.settings {
            config.settings_path = Some(settings);
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) inputs: InputArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    #[command(flatten)]
    pub(crate) inputs: InputArgs,
    /// Write the ranked table as CSV instead of printing it
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ScenarioArgs {
    /// Scenario identifier: s1, s2, s3 or s4
    pub(crate) kind: String,
    #[command(flatten)]
    pub(crate) inputs: InputArgs,
    /// Minimum profit margin as a fraction (required for s1)
    #[arg(long)]
    pub(crate) min_margin: Option<f64>,
    /// Seed for the missingness scenario
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Neighbours used by KNN imputation
    #[arg(long)]
    pub(crate) knn_k: Option<usize>,
    /// Distance for KNN imputation: euclidean or manhattan
    #[arg(long)]
    pub(crate) distance: Option<DistanceMetric>,
    /// Pillar perturbed by the sensitivity scenario
    #[arg(long)]
    pub(crate) pillar: Option<Pillar>,
    /// Missingness rate; repeat for several (defaults to 0.05 and 0.10)
    #[arg(long = "missing-rate")]
    pub(crate) missing_rates: Vec<f64>,
    /// Artifact name without extension
    #[arg(long, default_value = "")]
    pub(crate) output_name: String,
    /// Directory the artifact is written to
    #[arg(long, default_value = ".")]
    pub(crate) out_dir: PathBuf,
}

impl ScenarioArgs {
    fn params(&self, defaults: &EngineConfig) -> ScenarioParams {
        let knn = (self.knn_k.is_some() || self.distance.is_some()).then(|| KnnParams {
            k: self.knn_k.unwrap_or(defaults.knn_k),
            distance: self.distance.unwrap_or_default(),
        });
        ScenarioParams {
            seed: self.seed,
            min_margin: self.min_margin,
            target_pillar: self.pillar,
            missing_rates: (!self.missing_rates.is_empty()).then(|| self.missing_rates.clone()),
            knn,
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Score(args) => run_score(config, args),
        Command::Scenario(args) => run_scenario(config, args),
    }
}

fn run_score(mut config: AppConfig, args: ScoreArgs) -> Result<(), AppError> {
    args.inputs.apply(&mut config.engine);
    let context = EngineContext::load(&config.engine)?;
    let ranking = context.rank();

    match args.out {
        Some(path) => {
            std::fs::write(&path, to_csv_bytes(&ranking.entries)?)?;
            println!(
                "Wrote {} ranked suppliers to {}",
                ranking.entries.len(),
                path.display()
            );
        }
        None => print!("{}", render_ranking(&context, &ranking)),
    }
    Ok(())
}

fn run_scenario(mut config: AppConfig, args: ScenarioArgs) -> Result<(), AppError> {
    let params = args.params(&config.engine);
    args.inputs.apply(&mut config.engine);

    let context = EngineContext::load(&config.engine)?;
    let artifact = context.run_scenario(&args.kind, &params, &args.output_name)?;

    std::fs::create_dir_all(&args.out_dir)?;
    let path = args.out_dir.join(&artifact.file_name);
    std::fs::write(&path, &artifact.bytes)?;
    println!(
        "Wrote {} ({}, {} bytes)",
        path.display(),
        artifact.content_type,
        artifact.bytes.len()
    );
    Ok(())
}

fn render_ranking(context: &EngineContext, ranking: &Ranking) -> String {
    let metadata = &context.dataset().metadata;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Dataset {} (bands {}, generated {})",
        metadata.version,
        metadata.bands_version,
        metadata.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        out,
        "{:>4}  {:<10} {:<28} {:<12} {:>8} {:>8} {:>8} {:>9} {:<8} {:>8} {:>8}",
        "Rank",
        "Supplier",
        "Name",
        "Industry",
        "E",
        "S",
        "G",
        "Composite",
        "Risk",
        "Penalty",
        "Final"
    );
    for entry in &ranking.entries {
        let supplier = &entry.supplier;
        let _ = writeln!(
            out,
            "{:>4}  {:<10} {:<28} {:<12} {:>8.2} {:>8.2} {:>8.2} {:>9.2} {:<8} {:>8.2} {:>8.2}{}",
            entry.rank,
            supplier.supplier_id,
            supplier.name,
            supplier.industry,
            supplier.environmental,
            supplier.social,
            supplier.governance,
            supplier.composite,
            supplier.risk_level.label(),
            supplier.risk_penalty,
            supplier.final_score,
            if supplier.completeness_capped { "  (capped)" } else { "" }
        );
    }

    if ranking.quality.is_clean() {
        let _ = writeln!(out, "\nNo data-quality warnings.");
    } else {
        let _ = writeln!(out, "\nData-quality warnings:");
        for warning in &ranking.quality.warnings {
            let _ = writeln!(out, "  - {}", warning.summary());
        }
    }
    out
}
