use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::instrument;

use crate::application::ports::JobStoreError;

const CONNECT_RETRIES: u32 = 5;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Connects with exponential backoff so the pipeline survives a database
/// that comes up after it does.
#[instrument(skip(url))]
pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, JobStoreError> {
    let mut delay = INITIAL_RETRY_DELAY;

    for attempt in 0..=CONNECT_RETRIES {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
        {
            Ok(pool) => {
                tracing::info!(max_connections, "PostgreSQL connection pool established");
                return Ok(pool);
            }
            Err(e) if attempt < CONNECT_RETRIES => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "PostgreSQL connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(JobStoreError::ConnectionFailed(e.to_string())),
        }
    }

    unreachable!("connection loop either returns a pool or the final error")
}
