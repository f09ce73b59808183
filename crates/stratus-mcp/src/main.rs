mod args;
mod config;
mod server;

use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{debug, error, info, LevelFilter};
use rmcp::ServiceExt;
use stratus_core::{EditorSession, FileStore};

use crate::args::Args;
use crate::server::StratusServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // stdout carries the MCP transport, so logs go to stderr.
    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .target(env_logger::Target::Stderr)
        .init();

    info!(log_level:?; "Starting stratus-mcp");
    debug!(args:?; "Parsed arguments");

    let mut config = config::load_config(args.config.as_deref(), args.data_dir.as_deref())?;
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = Some(data_dir);
    }

    let store = FileStore::new(config.storage().diagrams_dir());
    info!(path = store.root().display().to_string(); "Using diagram store");

    let session = EditorSession::with_config(store, config.autosave());
    let server = StratusServer::new(session);

    if config.autosave().enabled {
        spawn_autosave_ticker(&server, config.autosave().tick());
    }

    let service = server
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| error!("MCP server error: {e}"))?;
    service.waiting().await?;
    info!("Stopped");
    Ok(())
}

/// Poll the session's autosave timer on a fixed interval.
fn spawn_autosave_ticker(server: &StratusServer, every: Duration) {
    let session = server.session();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if !autosave_tick(&session) {
                break;
            }
        }
    });
}

/// Returns false once the session can no longer be used.
fn autosave_tick(session: &Mutex<EditorSession<FileStore>>) -> bool {
    let Ok(mut session) = session.lock() else {
        error!("Editor session lock poisoned, stopping autosave");
        return false;
    };
    match session.tick(Instant::now()) {
        Ok(Some(version)) => debug!(version; "Autosave tick wrote a version"),
        Ok(None) => {}
        Err(e) => error!(error:% = e; "Autosave failed"),
    }
    true
}
