pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use clap::Parser;
use commands::upload::UploadController;
use config::ClientConfig;
use error::AppError;
use services::api_client::ApiClient;
use services::{preview_service, report_service};
use std::path::PathBuf;

pub use commands::upload::Outcome;
pub use services::session::UploadSession;

/// Send a chest X-ray to the inference service and show what it found.
#[derive(Debug, Parser)]
#[command(name = "xray-lens", version, about)]
pub struct Cli {
    /// Image to analyse (PNG or JPEG).
    #[arg(required_unless_present = "health")]
    pub image: Option<PathBuf>,

    /// Base URL of the inference service. Overrides XRAY_LENS_API_URL.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Do not request disease predictions.
    #[arg(long)]
    pub skip_predict: bool,

    /// Do not request a Grad-CAM explanation.
    #[arg(long)]
    pub skip_explain: bool,

    /// Write the decoded heatmap PNG here.
    #[arg(long)]
    pub heatmap_out: Option<PathBuf>,

    /// Only check that the service is up.
    #[arg(long)]
    pub health: bool,
}

pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError {
            message: format!("Failed to start async runtime: {}", e),
        })?;

    runtime.block_on(run_cli(cli))
}

pub async fn run_cli(cli: Cli) -> Result<(), AppError> {
    let config = ClientConfig::from_env().with_override(cli.api_url.clone());
    log::info!("Inference service: {}", config.base_url);
    let client = ApiClient::new(config)?;

    if cli.health {
        let health = client.health().await?;
        println!("{} (version {})", health.status, health.version);
        return Ok(());
    }

    let path = cli
        .image
        .as_deref()
        .ok_or_else(|| AppError::from("No image given"))?;
    let file = preview_service::select_path(path).await?;

    let controller = UploadController::new(client);
    controller.select_file(file).await;

    let predict = async {
        if !cli.skip_predict {
            controller.predict().await;
        }
    };
    let explain = async {
        if !cli.skip_explain {
            controller.explain().await;
        }
    };
    tokio::join!(predict, explain);

    let session = controller.snapshot().await;
    print!("{}", report_service::render_session(&session));

    if let (Some(out), Some(result)) = (cli.heatmap_out.as_deref(), session.explain_result()) {
        let png = report_service::decode_heatmap(result)?;
        tokio::fs::write(out, &png).await.map_err(|e| AppError {
            message: format!("Failed to write heatmap to {}: {}", out.display(), e),
        })?;
        log::info!("Heatmap written to {}", out.display());
    }

    match session.error() {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}
