use crate::registry::ConnectionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Spawns the periodic idle-room sweep. The interval doubles as the grace
/// window: a handle must have been dead for at least one full period before
/// it is collected.
pub fn spawn_idle_sweeper(registry: Arc<ConnectionRegistry>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = registry.sweep_idle(every);
            if removed > 0 {
                info!("Idle sweep removed {} room(s)", removed);
            }
        }
    })
}
