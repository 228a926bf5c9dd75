use tracing::warn;

use crate::{
    dto::health::{HealthResponse, HealthStatus},
    state::SharedState,
};

/// Report `ok` or `degraded`, probing the installed store on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let Some(store) = state.game_store().await else {
        warn!("storage unavailable (degraded mode)");
        return HealthStatus::Degraded.into();
    };

    if let Err(err) = store.health_check().await {
        warn!(error = %err, "storage health check failed");
        return HealthStatus::Degraded.into();
    }

    if state.is_degraded().await {
        HealthStatus::Degraded.into()
    } else {
        HealthStatus::Ok.into()
    }
}
