// [libs/core/registry/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DEVICE REGISTRY ROOT (V5.3 - ZENITH GOLD)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: AUTORIDAD SUPREMA DEL CONJUNTO DE DISPOSITIVOS
 *
 * ## Visión Holística 2026
 * Actúa como la única fuente de verdad sobre qué dispositivos existen,
 * cuándo respondieron por última vez y si su circuit breaker los tiene
 * bajo suspensión. Esta versión sella la integración entre el mapa de
 * dispositivos y el montículo de recencia indexado, garantizando que
 * los estratos superiores (supervisor, prober, podador) operen sobre
 * una base determinista.
 *
 * ## Características de Élite
 * 1. **Indexed Min-Heap:** Desalojo LRU y re-posicionamiento en O(log n)
 *    mediante back-pointers almacenados en cada dispositivo.
 * 2. **Atomic Suspension Gauge:** Lectura O(1) del total de suspensiones
 *    sin competir por el cerrojo del registro.
 * 3. **Hostile Input Shield:** Desinfección en el momento de almacenamiento.
 * =================================================================
 */

/// Estructura interna: mapa de dispositivos + montículo de recencia indexado.
mod ledger;

/// Autoridad pública del registro con cerrojos y gauge atómico.
pub mod manager;

pub use crate::manager::{AdmissionOutcome, DeviceRegistry};
