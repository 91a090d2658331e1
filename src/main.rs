use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use gridlens::api::{Backend, ClientError, HttpBackend};
use gridlens::dataset::DatasetSummary;
use gridlens::logging::{log, obj, v_str, Domain, Level};
use gridlens::prediction::PredictionInput;
use gridlens::render;
use gridlens::report::ComparisonChart;
use gridlens::session::AnalysisSession;
use gridlens::shape::ShapeNormalizer;
use gridlens::state::Config;

#[derive(Parser, Debug)]
#[command(
    name = "gridlens",
    version,
    about = "Terminal dashboard for the grid stability inference backend"
)]
struct Cli {
    /// Backend base URL (overrides GRIDLENS_BACKEND)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correlations, feature importance and model performance
    Analysis,
    /// Dataset inspection and management
    Dataset {
        #[command(subcommand)]
        action: DatasetCommand,
    },
    /// Model selection and evaluation
    Models {
        #[command(subcommand)]
        action: ModelsCommand,
    },
    /// Predict grid stability; unset parameters keep their defaults
    Predict {
        /// NAME=VALUE, e.g. --set tau1=3.2 (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
    },
    /// Normalize a saved correlation payload without contacting the backend
    Normalize { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum DatasetCommand {
    Info,
    Sample {
        #[arg(long)]
        limit: Option<usize>,
    },
    List,
    Switch { name: String },
    Upload { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum ModelsCommand {
    List,
    Switch { name: String },
    Performance,
    Compare,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut cfg = Config::from_env()?;
    if let Some(base) = &cli.backend {
        cfg = cfg.with_backend(base)?;
    }
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("backend", v_str(cfg.backend.as_str())),
            ("command", v_str(&format!("{:?}", cli.command))),
        ]),
    );

    let backend = HttpBackend::new(cfg.clone())?;
    match run(&cli.command, &backend, &cfg).await {
        Ok(text) => {
            print!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("Error: {}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(
    command: &Command,
    backend: &dyn Backend,
    cfg: &Config,
) -> Result<String, ClientError> {
    match command {
        Command::Analysis => {
            let session = AnalysisSession::new(ShapeNormalizer::new(cfg.target.clone()));
            session.refresh(backend).await;
            let view = session.view();
            let top = cfg.top_n;
            let mut out = String::new();
            out.push_str(&render::panel("Feature Correlations", &view.correlations, |v| {
                render::correlations(v, top)
            }));
            out.push('\n');
            out.push_str(&render::panel("Feature Importance", &view.importance, |r| {
                render::importance(r, top)
            }));
            out.push('\n');
            out.push_str(&render::panel(
                "Model Performance",
                &view.performance,
                render::performance,
            ));
            Ok(out)
        }
        Command::Dataset { action } => match action {
            DatasetCommand::Info => {
                let info = backend.dataset_info().await?;
                Ok(render::dataset_summary(&DatasetSummary::from_info(&info, &cfg.target)))
            }
            DatasetCommand::Sample { limit } => {
                let data = backend.sample_data(limit.unwrap_or(cfg.sample_limit)).await?;
                Ok(render::sample(&data))
            }
            DatasetCommand::List => Ok(render::datasets(&backend.datasets().await?)),
            DatasetCommand::Switch { name } => {
                backend.switch_dataset(name).await?;
                Ok(format!("Switched to dataset {}\n", name))
            }
            DatasetCommand::Upload { path } => {
                let receipt = backend.upload_dataset(path).await?;
                let message = receipt
                    .message
                    .unwrap_or_else(|| "Dataset uploaded and processed successfully!".to_string());
                Ok(format!("{}\n", message))
            }
        },
        Command::Models { action } => match action {
            ModelsCommand::List => Ok(render::models(&backend.models().await?)),
            ModelsCommand::Switch { name } => {
                backend.switch_model(name).await?;
                Ok(format!("Active model: {}\n", gridlens::report::format_model_name(name)))
            }
            ModelsCommand::Performance => {
                Ok(render::performance(&backend.model_performance().await?))
            }
            ModelsCommand::Compare => {
                let cmp = backend.compare_models().await?;
                // The active-model marker is optional; a failed listing only drops it.
                let current = backend.models().await.ok().and_then(|list| list.current_model);
                Ok(render::comparison(
                    &ComparisonChart::from_comparison(&cmp),
                    current.as_deref(),
                ))
            }
        },
        Command::Predict { set } => {
            let mut input = PredictionInput::default();
            for assignment in set {
                input.apply(assignment)?;
            }
            Ok(render::prediction(&backend.predict(&input).await?))
        }
        Command::Normalize { path } => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| {
                    ClientError::Validation(format!("Cannot read {}: {}", path.display(), e))
                })?;
            let payload: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| ClientError::Decode(format!("{}: {}", path.display(), e)))?;
            let view = ShapeNormalizer::new(cfg.target.clone()).normalize(&payload)?;
            Ok(format!(
                "Layout: {}\n{}",
                view.layout().name(),
                render::correlations(&view, cfg.top_n)
            ))
        }
    }
}
