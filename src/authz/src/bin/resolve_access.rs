//! # resolve-access
//!
//! Resolves a role list against the roles table and prints the effective
//! access as JSON. Useful for checking what a user's roles actually grant.
//!
//! ## Configuration
//!
//! Environment variables (see `AccessConfig::from_env`):
//! - `DATABASE_URL` - PostgreSQL connection string (required)
//! - `REDIS_URL` - Redis cache; in-process cache when unset (needs the `redis` feature)
//! - `ROLE_ACCESS_TTL` - cache TTL in seconds (default: 300)
//! - `RUST_LOG` - Log level (default: info)

use anyhow::{bail, Context, Result};
use clap::Parser;
use deptms_authz::store::PostgresRoleStore;
use deptms_authz::{
    AccessConfig, AccessResolver, CacheBackend, InMemoryCacheBackend, RoleAccessCache,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "resolve-access", version, about = "Resolve effective access for a list of roles")]
struct Cli {
    /// Role names, in the order they are assigned
    roles: Vec<String>,

    /// Also check whether this resource is permitted
    #[arg(long)]
    check: Option<String>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Redis connection string
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,
}

#[derive(Serialize)]
struct Output<'a> {
    roles: &'a [String],
    allowed: Vec<String>,
    disallowed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permitted: Option<bool>,
}

fn cache_backend(config: &AccessConfig) -> Result<Arc<dyn CacheBackend>> {
    match &config.redis_url {
        #[cfg(feature = "redis")]
        Some(url) => {
            let backend = deptms_authz::cache::RedisCacheBackend::new(url)
                .context("Failed to configure Redis cache")?
                .with_timeout(config.redis_timeout());
            info!("Using Redis role-access cache");
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => bail!("REDIS_URL is set but resolve-access was built without the redis feature"),
        None => {
            info!("Using in-process role-access cache");
            Ok(Arc::new(InMemoryCacheBackend::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AccessConfig::from_env().context("Invalid configuration")?;
    if cli.database_url.is_some() {
        config.database_url = cli.database_url.clone();
    }
    if cli.redis_url.is_some() {
        config.redis_url = cli.redis_url.clone();
    }

    let Some(database_url) = config.database_url.clone() else {
        bail!("DATABASE_URL or --database-url is required");
    };

    info!("resolve-access v{}", deptms_authz::VERSION);

    let store = PostgresRoleStore::new(&database_url)
        .await
        .context("Failed to connect to role storage")?;
    let cache = RoleAccessCache::from_config(&config, Arc::new(store), cache_backend(&config)?)?;
    let resolver = AccessResolver::new(Arc::new(cache));

    let access = resolver
        .get_access(&cli.roles)
        .await
        .context("Failed to resolve access")?;

    let permitted = cli.check.as_deref().map(|resource| access.permits(resource));
    let output = Output {
        roles: &cli.roles,
        allowed: access.allowed,
        disallowed: access.disallowed,
        resource: cli.check.as_deref(),
        permitted,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
