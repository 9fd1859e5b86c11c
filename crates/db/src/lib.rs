//! PostgreSQL pool factory and migration runner.

use std::time::Duration;

use anyhow::Context;
use biblioteca_kernel::{settings::DatabaseSettings, Migration};
use sqlx::{postgres::PgPoolOptions, PgPool};

const MAX_BACKOFF: Duration = Duration::from_secs(60);

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT        NOT NULL,
        id         TEXT        NOT NULL,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (module, id)
    )
"#;

/// Open a connection pool, retrying with exponential backoff.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(settings.retry_delay_secs);

    loop {
        match try_connect(settings).await {
            Ok(pool) => {
                tracing::info!(
                    target: "biblioteca-db",
                    url = %sanitize_url(&settings.url),
                    max_connections = settings.max_connections,
                    attempts = attempt + 1,
                    "database pool ready"
                );
                return Ok(pool);
            }
            Err(err) => {
                attempt += 1;
                if attempt > settings.max_retries {
                    return Err(err).with_context(|| {
                        format!(
                            "failed to connect to {} after {} attempts",
                            sanitize_url(&settings.url),
                            attempt
                        )
                    });
                }

                let delay = backoff_delay(base_delay, attempt);
                tracing::warn!(
                    target: "biblioteca-db",
                    attempt,
                    error = %err,
                    "database connection failed, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Delay before retry `attempt` (1-based): doubling from `base`, capped
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

async fn try_connect(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .connect(&settings.url)
        .await
}

/// Apply every migration not yet recorded in `_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row. Returns how many were applied.
pub async fn migrate(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::raw_sql(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("failed to create migrations table")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let done: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM _migrations WHERE module = $1 AND id = $2)",
        )
        .bind(module)
        .bind(migration.id)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to inspect migration {}/{}", module, migration.id))?;

        if done {
            tracing::debug!(target: "biblioteca-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await.context("failed to open migration transaction")?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO _migrations (module, id) VALUES ($1, $2)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to record migration {}/{}", module, migration.id))?;
        tx.commit().await.context("failed to commit migration")?;

        tracing::info!(target: "biblioteca-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

/// Mask the password in a connection URL so it can be logged.
pub fn sanitize_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let Some(at) = url.rfind('@').filter(|at| *at > scheme_end + 3) else {
        return url.to_string();
    };
    let credentials = &url[scheme_end + 3..at];
    match credentials.split_once(':') {
        Some((user, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at..]),
        None => url.to_string(),
    }
}
