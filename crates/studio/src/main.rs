//! `lumina-studio` -- generate stylized videos and images from a terminal.
//!
//! Each invocation signs in one user, runs one command against the Gemini
//! API and keeps the user's asset history under `LUMINA_DATA_DIR`.
//! Ctrl-C during `generate` cancels the running job.
//!
//! # Environment variables
//!
//! | Variable                    | Required | Default         | Description                        |
//! |-----------------------------|----------|-----------------|------------------------------------|
//! | `GEMINI_API_KEY`            | yes      | --              | Key sent with every provider call  |
//! | `LUMINA_DATA_DIR`           | no       | `./lumina-data` | Asset lists and downloaded media   |
//! | `LUMINA_POLL_INTERVAL_SECS` | no       | `10`            | Seconds between video job polls    |
//! | `LUMINA_MAX_POLLS`          | no       | unbounded       | Give up after this many polls      |
//! | `LUMINA_DISPLAY_DELAY_SECS` | no       | `3`             | How long a finished notice lingers |

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use lumina_core::assets::AssetStats;
use lumina_core::generation::SeedImage;
use lumina_core::progress::CANCELLED_MESSAGE;
use lumina_events::EventBus;
use lumina_pipeline::{GenerationOutcome, GenerationSession, SessionState};
use lumina_provider::{GeminiApi, GenerationProvider};
use lumina_store::{AssetStore, JsonFileAssetStore, LocalMediaStore, MediaStore};
use lumina_studio::cli::{seed_mime_type, Cli, Command, GenerateArgs};
use lumina_studio::config::StudioConfig;
use lumina_studio::gate::{EnvCredentialGate, API_KEY_VAR};
use lumina_studio::render;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumina_studio=info,lumina_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = StudioConfig::from_env()?;

    tracing::info!(
        user = %cli.user,
        data_dir = %config.data_dir.display(),
        poll_interval_secs = config.poll_interval.as_secs(),
        "Starting lumina-studio",
    );

    let api = Arc::new(GeminiApi::new(config.provider.clone()));
    let events = Arc::new(EventBus::default());
    let session = GenerationSession::start(
        Arc::clone(&api) as Arc<dyn GenerationProvider>,
        Arc::new(JsonFileAssetStore::new(config.assets_dir())) as Arc<dyn AssetStore>,
        Arc::new(LocalMediaStore::new(config.media_dir())) as Arc<dyn MediaStore>,
        Arc::new(EnvCredentialGate::new(api)),
        Arc::clone(&events),
        config.session_config(),
    )
    .await;
    let session = Arc::new(session);

    session.sign_in(&cli.user)?;

    match cli.command {
        Command::Generate(args) => generate(&session, &events, &args).await,
        Command::List => list(&session).await,
        Command::Clear => {
            session.clear_assets().await?;
            println!("Cleared all assets for {}.", cli.user);
            Ok(())
        }
        Command::Analyze { asset_id } => {
            ensure_credentials(&session).await?;
            let analysis = session.analyze(asset_id).await?;
            println!("{analysis}");
            Ok(())
        }
    }
}

async fn ensure_credentials(session: &GenerationSession) -> anyhow::Result<()> {
    if session.state() == SessionState::AwaitingCredentials && !session.reauthorize().await {
        bail!("No API key selected. Set {API_KEY_VAR} in the environment or in .env");
    }
    Ok(())
}

async fn generate(
    session: &Arc<GenerationSession>,
    events: &EventBus,
    args: &GenerateArgs,
) -> anyhow::Result<()> {
    ensure_credentials(session).await?;

    let seed = match &args.seed_image {
        Some(path) => {
            let mime_type = seed_mime_type(path).with_context(|| {
                format!("{} is not a PNG, JPEG or WebP image", path.display())
            })?;
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading seed image {}", path.display()))?;
            Some(SeedImage {
                bytes,
                mime_type: mime_type.to_string(),
            })
        }
        None => None,
    };
    let request = args.request(seed);

    let canceller = Arc::clone(session);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let mut rx = events.subscribe();
    let runner = Arc::clone(session);
    let run = tokio::spawn(async move { runner.generate(request).await });
    let outcome = render::follow(&mut rx, run, |line| println!("{line}")).await??;

    match outcome {
        GenerationOutcome::Completed(asset) => {
            println!("{}", asset.id());
            if args.analyze {
                let analysis = session.analyze(asset.id()).await?;
                println!("{analysis}");
            }
            Ok(())
        }
        GenerationOutcome::Cancelled => {
            tracing::info!("{CANCELLED_MESSAGE}");
            Ok(())
        }
        GenerationOutcome::Failed(message) => bail!(message),
        GenerationOutcome::AuthRequired => {
            if session.reauthorize().await {
                bail!("API key rejected. A new key was selected; run the command again.");
            }
            bail!("API key rejected. Set a valid {API_KEY_VAR} and run the command again.");
        }
    }
}

async fn list(session: &GenerationSession) -> anyhow::Result<()> {
    let assets = session.assets().await?;
    let stats = AssetStats::from_assets(&assets);

    for asset in &assets {
        println!(
            "{}  {:<5}  {}  {}",
            asset.id(),
            asset.kind().as_str(),
            asset.timestamp().format("%Y-%m-%d %H:%M"),
            asset.prompt()
        );
    }
    println!(
        "{} assets ({} videos, {} images)",
        assets.len(),
        stats.total_videos,
        stats.total_images
    );
    Ok(())
}
