//! Helpdesk server entry point: loads settings, prepares storage, and serves
//! the REST API with health probes and OpenAPI docs.

mod server;

use std::path::Path;

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use helpdesk::inbound::http::health::HealthState;
use helpdesk::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use helpdesk::outbound::security::Argon2Settings;

use server::{
    BootstrapAdmin, ServerConfig, ServerSettings, StateOptions, build_http_state, create_server,
};

/// Read the session key, or generate one in debug builds and when
/// explicitly allowed.
fn load_session_key(path: &Path, allow_ephemeral: bool) -> Result<Key> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            if cfg!(debug_assertions) || allow_ephemeral {
                warn!(path = %path.display(), error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(eyre!(
                    "failed to read session key at {}: {e}",
                    path.display()
                ))
            }
        }
    }
}

async fn connect_database(settings: &ServerSettings) -> Result<Option<DbPool>> {
    let Some(database_url) = settings.database_url.as_deref() else {
        return Ok(None);
    };
    let applied = run_pending_migrations(database_url)
        .await
        .wrap_err("database migrations failed")?;
    info!(applied, "database migrations complete");
    let config = PoolConfig::new(database_url)
        .with_max_size(settings.pool_max_size())
        .with_connection_timeout(settings.storage_deadline().limit());
    let pool = DbPool::new(config)
        .await
        .wrap_err("failed to create database pool")?;
    Ok(Some(pool))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().map_err(|e| eyre!("failed to load settings: {e}"))?;
    info!(settings = ?settings, "settings loaded");

    let key = load_session_key(&settings.session_key_file(), settings.session_allow_ephemeral)?;
    let bootstrap_admin = settings
        .bootstrap_admin()?
        .map(|(email, password)| BootstrapAdmin::parse(email, password))
        .transpose()?;
    let db_pool = connect_database(&settings).await?;

    let http_state = build_http_state(StateOptions {
        db_pool,
        deadline: settings.storage_deadline(),
        argon2: Argon2Settings::default(),
        bootstrap_admin,
    })
    .await?;

    let bind_addr = settings.bind_addr()?;
    let config = ServerConfig::new(key, settings.cookie_secure(), SameSite::Lax, bind_addr);
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, http_state, config)?;
    info!(%bind_addr, "listening");
    server.await?;
    Ok(())
}
