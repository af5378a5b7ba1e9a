//! pfp-framer - Discord bot that frames a member's profile picture on request.

mod adapters;
mod cassette;
mod cli;
mod compositor;
mod config;
mod context;
mod dispatch;
mod error;
mod handlers;
mod liveness;
mod output;
mod ports;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::adapters::live::discord::run_gateway;
use crate::cli::{Cli, Command};
use crate::compositor::FrameAsset;
use crate::config::{Config, TOKEN_ENV_VAR};
use crate::context::{AppContext, RecordingSession};
use crate::dispatch::Dispatcher;
use crate::error::BotError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded environment file");
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install log subscriber: {e}");
    }
}

async fn run(cli: Cli) -> Result<(), BotError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(BotError::Config)?;

    match cli.command() {
        Command::Run { frame, port } => serve(&config, frame, port).await,
        Command::Frame { source, output, frame } => {
            frame_once(&config, &source, &output, frame).await
        }
    }
}

/// Start the liveness endpoint and the gateway. Returns only when the
/// gateway stops.
async fn serve(
    config: &Config,
    frame: Option<PathBuf>,
    port: Option<u16>,
) -> Result<(), BotError> {
    let token = config
        .bot_token()
        .ok_or_else(|| BotError::MissingToken { env_var: TOKEN_ENV_VAR.into() })?;
    let frame = load_frame(config, frame)?;
    let port = match port {
        Some(port) => port,
        None => config.liveness_port().map_err(BotError::Config)?,
    };

    let ctx = Arc::new(AppContext::live(frame, config)?);
    let mut dispatcher = Dispatcher::new();
    handlers::register(&mut dispatcher, ctx, &config.bot);
    info!(command = %config.bot.command, channels = ?config.bot.channels, "handlers registered");

    match liveness::bind(&config.liveness.host, port).await {
        Ok(listener) => {
            liveness::spawn(listener);
        }
        Err(e) => error!(error = %e, port, "liveness endpoint unavailable"),
    }

    run_gateway(&token, Arc::new(dispatcher)).await
}

/// Frame one image from a URL or a local file and save it.
async fn frame_once(
    config: &Config,
    source: &str,
    output: &Path,
    frame: Option<PathBuf>,
) -> Result<(), BotError> {
    let frame = load_frame(config, frame)?;

    // Create context based on mode (live / recording / replaying)
    let replay_path = std::env::var("PFP_FRAMER_REPLAY").ok();
    let is_recording = std::env::var("PFP_FRAMER_REC").is_ok_and(|v| v == "true" || v == "1");

    let (ctx, recording_session): (AppContext, Option<RecordingSession>) =
        if let Some(ref cassette_path) = replay_path {
            info!(cassette = %cassette_path, "replaying avatar downloads");
            (AppContext::replaying(frame, config, Path::new(cassette_path))?, None)
        } else if is_recording {
            info!("recording avatar downloads");
            let (ctx, session) = AppContext::recording(frame, config)?;
            (ctx, Some(session))
        } else {
            (AppContext::live(frame, config)?, None)
        };

    let result = if cli::is_remote(source) {
        ctx.frame_avatar(source).await
    } else {
        match output::read_source(Path::new(source)) {
            Ok(bytes) => ctx.frame_bytes(bytes).await,
            Err(e) => Err(e),
        }
    };
    drop(ctx);

    // Finish recording if active
    if let Some(session) = recording_session {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }

    output::save_png(&result?, output)?;
    eprintln!("Saved: {}", output.display());
    Ok(())
}

fn load_frame(config: &Config, explicit: Option<PathBuf>) -> Result<FrameAsset, BotError> {
    let path = explicit.unwrap_or_else(|| config.frame.path.clone());
    let frame = FrameAsset::load(&path)?;
    let (width, height) = frame.dimensions();
    info!(path = %path.display(), width, height, "frame loaded");
    Ok(frame)
}
