// INICIO DEL ARCHIVO [apps/sentinel/src/routes.rs]
/*!
 * =================================================================
 * APARATO: HEALTH ROUTING MATRIX (V9.0 - MINIMAL SURFACE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGÍA HTTP DE LA SUPERFICIE DE SALUD
 * =================================================================
 */

use crate::handlers::health;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

pub fn create_health_router(application_shared_state: AppState) -> Router {
    // Escudo de Red: Permite CORS para tableros y herramientas de Ops.
    let network_security_shield = CorsLayer::new().allow_origin(Any);

    Router::new()
        .route("/health", get(health::handle_health_report))
        .route("/health/ready", get(health::handle_readiness))
        .route("/health/live", get(health::handle_liveness))
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
// FIN DEL ARCHIVO [apps/sentinel/src/routes.rs]
