mod app;
mod cli;
mod error;

use crate::app::App;
use crate::cli::{Cli, Command, Target};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use favr_config::Config;
use favr_service::error::ApiError;
use favr_service::{IconRequest, Served};
use std::path::Path;
use std::process::ExitCode;
use time::UtcDateTime;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Exit code for a request that was understood but found no icon.
const EXIT_NOT_FOUND: u8 = 1;
/// Exit code for rejected input, mirroring a 4xx response.
const EXIT_INVALID: u8 = 2;
/// Exit code for everything else.
const EXIT_FAILURE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            if err.is_retryable() {
                warn!("This failure may be transient; retrying could succeed");
            }
            eprintln!("Error: {err:?}");
            ExitCode::from(EXIT_FAILURE)
        },
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Get { target, output } => get(&config, target, output.as_deref()).await,
        Command::Discover { target } => discover(&config, target).await,
    }
}

/// Report a rejected request the way the HTTP layer would: as a JSON body.
fn invalid(err: &favr_service::error::Error) -> ExitCode {
    let api = ApiError::from(err);
    match serde_json::to_string(&api) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{api}"),
    }
    ExitCode::from(EXIT_INVALID)
}

async fn get(config: &Config, target: Target, output: Option<&Path>) -> Result<ExitCode> {
    let request = match IconRequest::parse(Some(&target.url), target.size.as_deref(), target.dpr.as_deref()) {
        Ok(request) => request,
        Err(err) => return Ok(invalid(&err)),
    };
    let app = App::build(config).await?;
    let served = app.service.serve(&request).await;
    // Cache writes run in the background; give them a chance to land even
    // when writing the output fails.
    app.shutdown().await;
    let served = served.or_raise(|| ErrorKind::Serve)?;

    let now = UtcDateTime::now();
    let cache_control = served.expiry().map(|expiry| favr_service::cache_control(expiry, now));
    match served {
        Served::Image { blob, effort, .. } => {
            info!(
                content_type = %blob.content_type,
                bytes = blob.content.len(),
                ?effort,
                cache_control = cache_control.as_deref().unwrap_or_default(),
                "Icon served"
            );
            match output {
                Some(path) => tokio::fs::write(path, &blob.content).await.or_raise(|| ErrorKind::Output)?,
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&blob.content).await.or_raise(|| ErrorKind::Output)?;
                    stdout.flush().await.or_raise(|| ErrorKind::Output)?;
                },
            }
            Ok(ExitCode::SUCCESS)
        },
        Served::Redirect { location, .. } => {
            if output.is_some() {
                warn!("Icon is served from the public URL; nothing written");
            }
            println!("{location}");
            Ok(ExitCode::SUCCESS)
        },
        Served::NotFound => {
            eprintln!("Not found");
            Ok(ExitCode::from(EXIT_NOT_FOUND))
        },
    }
}

async fn discover(config: &Config, target: Target) -> Result<ExitCode> {
    let request = match IconRequest::parse(Some(&target.url), target.size.as_deref(), target.dpr.as_deref()) {
        Ok(request) => request,
        Err(err) => return Ok(invalid(&err)),
    };
    let resolver = app::resolver(config)?;
    let result = resolver.load(&request.url, request.size, request.dpr).await;
    let json = serde_json::to_string_pretty(&result).or_raise(|| ErrorKind::Output)?;
    println!("{json}");
    Ok(match result.icon {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::from(EXIT_NOT_FOUND),
    })
}
