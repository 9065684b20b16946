// [libs/domain/models/src/telemetry.rs]
/*!
 * =================================================================
 * APARATO: VITAL SIGNS CONTRACTS (V3.0 - PANOPTICON SYNC)
 * CLASIFICACIÓN: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE AUTO-OBSERVACIÓN DEL CENTINELA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WIRE COMPATIBILITY: El campo 'goroutines' conserva su nombre
 *    histórico en el esquema de la serie temporal; transporta el conteo
 *    de tareas vivas del runtime.
 * 2. CANONICAL GAUGE: 'active_pingers' significa sondas en vuelo en este
 *    instante (contador atómico), no tareas prober vivas.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/**
 * Instantánea de signos vitales del daemon, emitida periódicamente a la
 * serie temporal secundaria y reflejada por la superficie HTTP de salud.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalSignsReport {
    /// Dispositivos registrados en este instante.
    pub device_count: i64,
    /// Sondas ICMP en vuelo (gauge canónico de actividad).
    pub active_pingers: i64,
    /// Dispositivos bajo suspensión de circuit breaker.
    pub suspended_devices: i64,
    /// Tareas vivas del runtime asíncrono.
    pub runtime_tasks: i64,
    /// Memoria contabilizada del proceso, en megabytes.
    pub memory_mb: i64,
    /// Resident Set Size en Linux, en megabytes (0 en otras plataformas).
    pub rss_mb: i64,
    /// Alcanzabilidad del almacén de series temporales.
    pub influxdb_ok: bool,
    /// Lotes confirmados por el almacén desde el arranque.
    pub influxdb_successful_batches: u64,
    /// Lotes descartados tras agotar reintentos.
    pub influxdb_failed_batches: u64,
    /// Sondas ICMP totales emitidas desde el arranque.
    pub pings_sent_total: u64,
}

/// Contrato JSON de 'GET /health'.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthPayload {
    /// "healthy" | "degraded" | "unhealthy".
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub device_count: i64,
    pub suspended_devices: i64,
    pub active_pingers: i64,
    pub influxdb_ok: bool,
    pub influxdb_successful: u64,
    pub influxdb_failed: u64,
    pub pings_sent_total: u64,
    pub goroutines: i64,
    pub memory_mb: i64,
    pub rss_mb: i64,
    /// Marca RFC3339 del momento de la instantánea.
    pub timestamp: String,
}

impl HealthPayload {
    /**
     * Cristaliza el contrato público a partir de la instantánea interna.
     * El estado degrada únicamente cuando el almacén no responde.
     */
    pub fn from_report(report: &VitalSignsReport, version: &str, uptime: String, timestamp_rfc3339: String) -> Self {
        let liveness_verdict = if report.influxdb_ok { "healthy" } else { "degraded" };

        Self {
            status: liveness_verdict.to_string(),
            version: version.to_string(),
            uptime,
            device_count: report.device_count,
            suspended_devices: report.suspended_devices,
            active_pingers: report.active_pingers,
            influxdb_ok: report.influxdb_ok,
            influxdb_successful: report.influxdb_successful_batches,
            influxdb_failed: report.influxdb_failed_batches,
            pings_sent_total: report.pings_sent_total,
            goroutines: report.runtime_tasks,
            memory_mb: report.memory_mb,
            rss_mb: report.rss_mb,
            timestamp: timestamp_rfc3339,
        }
    }
}
