//! Background task keeping the question store connected. While no store is
//! installed the application serves in degraded mode: cached pools still
//! answer draws, but anything needing storage fails fast.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{question_store::QuestionStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend, poll its health, and reconnect with
/// exponential backoff whenever the connection is lost. Never returns.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn QuestionStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_question_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                // Blocks until the connection is lost for good.
                supervise(&state, store.as_ref()).await;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Poll the store's health until reconnection attempts are exhausted, then
/// clear it from the shared state and return to the outer connect loop.
async fn supervise(state: &SharedState, store: &dyn QuestionStore) {
    loop {
        match store.health_check().await {
            Ok(()) => sleep(HEALTH_POLL_INTERVAL).await,
            Err(err) => {
                warn!(error = %err, "storage health check failed; attempting reconnect");
                if reconnect_with_backoff(store).await {
                    info!("storage reconnection succeeded after health check failure");
                    continue;
                }

                warn!("exhausted storage reconnect attempts; entering degraded mode");
                state.clear_question_store().await;
                return;
            }
        }
    }
}

async fn reconnect_with_backoff(store: &dyn QuestionStore) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}
