//! blobfs-server - static HTTP file server over an in-memory bucket.
//!
//! Serves the keys of a [`MemoryBucket`] as a browsable tree through
//! [`BlobFileSystem`]: files with `Range` support, directories as HTML
//! listings.
//!
//! # Usage
//!
//! ```text
//! BLOBFS_SEED_DIR=./public GATEWAY_LISTEN=127.0.0.1:8080 blobfs-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `BLOBFS_SEED_DIR` | *(unset)* | Directory loaded into the bucket; a demo tree otherwise |
//! | `BLOBFS_MAX_MEMORY_OBJECT_SIZE` | `524288` | Bodies above this spill to temp files |
//! | `BLOBFS_REQUEST_TIMEOUT_MS` | `0` | Per-call deadline for filesystem operations |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod config;
mod handler;
mod listing;
mod range;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use blobfs_core::{BlobFileSystem, BlobFsConfig};
use blobfs_store::MemoryBucket;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::handler::FileServer;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build and populate the bucket described by `config`.
async fn build_bucket(config: &ServerConfig) -> Result<MemoryBucket> {
    let bucket = MemoryBucket::new(config.max_memory_object_size);
    match &config.seed_dir {
        Some(dir) => seed::seed_from_dir(&bucket, dir).await?,
        None => seed::seed_demo(&bucket).await?,
    };
    Ok(bucket)
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: FileServer) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env();
    let fs_config = BlobFsConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        seed_dir = ?config.seed_dir,
        request_timeout = ?fs_config.request_timeout,
        version = VERSION,
        "starting blobfs-server",
    );

    let bucket = build_bucket(&config).await?;
    let fs = BlobFileSystem::with_config(Arc::new(bucket), fs_config);
    let service = FileServer::new(fs);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
