// [apps/sentinel/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SENTINEL LIBRARY ROOT (V9.0 - SOVEREIGN AUTHORITY)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN SUPREMA DEL ÁRBOL DE MÓDULOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MODULE HIERARCHY HARDENING: Establece la autoridad única de
 *    módulos, permitiendo que 'crate::' se resuelva de forma
 *    determinista tanto en la librería como en el binario.
 * 2. PUBLIC INTERFACE: Expone 'prelude' para facilitar la ignición
 *    del Kernel desde el binario 'main.rs'.
 * =================================================================
 */

// --- ESTRATO DE DATOS Y ESTADO (L1-APP) ---
/// Gestor del sistema nervioso central del centinela.
pub mod state;

// --- ESTRATO DE TRANSPORTE Y ACCIÓN ---
/// Adaptadores de entrada para la superficie HTTP de salud.
pub mod handlers;
/// Núcleo de mando y control para la ignición de servicios.
pub mod kernel;
/// El túnel de mando: definición de rutas y topología de red.
pub mod routes;

// --- ESTRATO DE SERVICIOS DE FONDO ---
/// Daemons de descubrimiento, sondeo, enriquecimiento y poda.
pub mod services;

/**
 * PRELUDIO DEL CENTINELA
 *
 * Re-exportación estratégica de los componentes necesarios para
 * la ignición mínima del sistema desde 'main.rs'.
 */
pub mod prelude {
    pub use crate::kernel::SentinelKernel;
    pub use crate::state::AppState;
}
