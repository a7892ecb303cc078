//! Periodic eviction of idle conversation sessions.

use crate::config::SessionConfig;
use fishbot_conversation::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawns the cleanup task described by `config`.
///
/// Returns `None` when eviction is disabled.
pub fn spawn_session_cleanup(
    sessions: Arc<dyn SessionStore>,
    config: &SessionConfig,
) -> Option<JoinHandle<()>> {
    if !config.eviction_enabled() {
        info!("Session eviction disabled");
        return None;
    }
    Some(spawn_eviction_loop(
        sessions,
        chrono::Duration::minutes(config.idle_ttl_minutes),
        Duration::from_secs(config.cleanup_interval_seconds.max(1)),
    ))
}

/// Every `period`, drops sessions idle for longer than `ttl`.
pub fn spawn_eviction_loop(
    sessions: Arc<dyn SessionStore>,
    ttl: chrono::Duration,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = sessions.evict_idle(chrono::Utc::now() - ttl).await;
            if evicted > 0 {
                let remaining = sessions.len().await;
                debug!(
                    evicted_sessions = evicted,
                    remaining,
                    "Periodic session cleanup"
                );
            }
        }
    })
}
