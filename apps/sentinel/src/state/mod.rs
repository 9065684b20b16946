// [apps/sentinel/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE NEXUS (V9.1 - SENTINEL GOLD)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REGISTRO, SUMIDERO Y GAUGES
 *
 * # Mathematical Proof (Deterministic State Hub):
 * Todos los campos son Arc<T> inmutables o contadores atómicos; el
 * clonado del estado es O(1) y cualquier estrato observa la misma
 * realidad sin cerrojos adicionales.
 * =================================================================
 */

/// Contadores atómicos de actividad de sondeo.
pub mod registers;

pub use registers::ProbeRegisters;

use argos_core_registry::DeviceRegistry;
use argos_infra_influx::MetricsSink;
use std::sync::Arc;
use std::time::Instant;

/**
 * Contenedor de estado compartido (Thread-Safe) del centinela.
 * Actúa como la placa base donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Autoridad suprema del conjunto de dispositivos.
    pub registry: Arc<DeviceRegistry>,
    /// Sumidero por lotes hacia el almacén de series temporales.
    pub sink: Arc<MetricsSink>,
    /// Gauges atómicos de actividad (en vuelo, totales, alcanzabilidad).
    pub registers: Arc<ProbeRegisters>,
    /// Instante de ignición del proceso (base del uptime reportado).
    pub started_at: Instant,
    /// Umbral de advertencia de memoria residente, en megabytes.
    pub memory_limit_mb: u64,
}

impl AppState {
    #[must_use]
    pub fn new(
        registry: Arc<DeviceRegistry>,
        sink: Arc<MetricsSink>,
        registers: Arc<ProbeRegisters>,
        memory_limit_mb: u64,
    ) -> Self {
        Self {
            registry,
            sink,
            registers,
            started_at: Instant::now(),
            memory_limit_mb,
        }
    }
}
