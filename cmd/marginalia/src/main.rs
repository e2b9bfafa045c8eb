//! # Marginalia Binary
//!
//! The entry point that assembles the application from configuration and
//! compile-time features.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::{AppState, Metrics, SessionCookie};
use auth_adapters::SessionAccounts;
use configs::{AppConfig, LogConfig};
use domains::{AccountStore, CommentStore, NewsletterStore};
#[cfg(feature = "db-sqlite")]
use secrecy::ExposeSecret;
use services::{EssayCatalog, NewsletterService};
use storage_adapters::{FsEssayStore, MemoryAccountStore, MemoryCommentStore, MemoryNewsletterStore};
use tracing_subscriber::EnvFilter;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.log);

    // 1. Initialize the comment, newsletter and account stores
    let stores = open_stores(&config).await?;

    // 2. Essays come straight from the content directory
    let essays = FsEssayStore::new(&config.content.essays_dir);
    tracing::info!(dir = %essays.root().display(), "serving essays");

    // 3. Accounts and sessions
    let ttl = chrono::Duration::hours(i64::from(config.auth.session_ttl_hours));
    let accounts = Arc::new(SessionAccounts::new(stores.accounts, ttl));
    spawn_session_purge(accounts.clone());

    let state = AppState {
        comments: stores.comments,
        catalog: EssayCatalog::new(Arc::new(essays)),
        accounts,
        newsletter: NewsletterService::new(stores.newsletter),
        metrics: Arc::new(Metrics::new()),
        session: SessionCookie::new(
            config.auth.cookie_name.clone(),
            config.auth.secure_cookies,
            config.auth.session_ttl_hours,
        ),
    };

    let app = api_adapters::router(state, &config.server.static_dir);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("Marginalia listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum webserver")
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

struct Stores {
    comments: Arc<dyn CommentStore>,
    newsletter: Arc<dyn NewsletterStore>,
    accounts: Arc<dyn AccountStore>,
}

async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    if config.database.is_memory() {
        tracing::warn!("using in-memory stores; comments and accounts are lost on restart");
        return Ok(Stores {
            comments: Arc::new(MemoryCommentStore::new()),
            newsletter: Arc::new(MemoryNewsletterStore::new()),
            accounts: Arc::new(MemoryAccountStore::new()),
        });
    }

    #[cfg(feature = "db-sqlite")]
    {
        let store = Arc::new(
            storage_adapters::SqliteStore::new(config.database.url.expose_secret())
                .await
                .context("Failed to init SQLite")?,
        );
        tracing::info!("sqlite store ready");
        Ok(Stores { comments: store.clone(), newsletter: store.clone(), accounts: store })
    }

    #[cfg(not(feature = "db-sqlite"))]
    {
        anyhow::bail!("database.url is set but this build has no database support; use \"memory\"")
    }
}

fn spawn_session_purge(accounts: Arc<SessionAccounts>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            tick.tick().await;
            accounts.purge_expired();
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
