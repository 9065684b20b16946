// [apps/sentinel/src/handlers/health.rs]
/*!
 * =================================================================
 * APARATO: HEALTH SURFACE HANDLERS (V9.1 - OPS CONTRACT)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN HTTP DEL ESTADO YA COMPUTADO
 *
 * La superficie expone estado que el núcleo ya computó: la
 * alcanzabilidad del almacén llega cacheada desde el reportero de
 * signos vitales; ninguna petición toca la red del almacén.
 * =================================================================
 */

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use std::time::Duration;

use argos_domain_models::HealthPayload;

use crate::services::vital_signs::assemble_report;
use crate::state::AppState;

/**
 * Endpoint: GET /health
 *
 * Reporte JSON completo; 'degraded' si y solo si el almacén no responde.
 */
pub async fn handle_health_report(State(application_state): State<AppState>) -> impl IntoResponse {
    let store_reachable = application_state.registers.store_reachable();
    let report = assemble_report(&application_state, store_reachable);

    let uptime_seconds = Duration::from_secs(application_state.started_at.elapsed().as_secs());

    let payload = HealthPayload::from_report(
        &report,
        env!("CARGO_PKG_VERSION"),
        humantime::format_duration(uptime_seconds).to_string(),
        Utc::now().to_rfc3339(),
    );

    Json(payload)
}

/// Endpoint: GET /health/ready — 503 si el almacén no está alcanzable.
pub async fn handle_readiness(State(application_state): State<AppState>) -> impl IntoResponse {
    if application_state.registers.store_reachable() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY: InfluxDB unavailable")
    }
}

/// Endpoint: GET /health/live — vivo incondicionalmente.
pub async fn handle_liveness() -> impl IntoResponse {
    (StatusCode::OK, "ALIVE")
}
