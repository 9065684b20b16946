// [apps/sentinel/src/services/vital_signs.rs]
/*!
 * =================================================================
 * APARATO: VITAL SIGNS REPORTER (V9.2 - PANOPTICON SYNC)
 * CLASIFICACIÓN: BACKGROUND SERVICE (ESTRATO L1-APP)
 * RESPONSABILIDAD: AUTO-OBSERVACIÓN PERIÓDICA DEL DAEMON
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CACHED REACHABILITY: El sondeo del almacén ocurre una vez por
 *    tic y su resultado queda cacheado en los registers; la superficie
 *    HTTP lee el flag sin tocar la red.
 * 2. GAUGE THRESHOLD: 'memory_limit_mb' es umbral de advertencia puro;
 *    no dispara ninguna acción de control.
 * =================================================================
 */

use argos_domain_models::VitalSignsReport;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::state::AppState;

/// Daemon de signos vitales: instantánea + escritura directa por tic.
pub async fn run_vital_signs_reporter(
    state: AppState,
    report_interval: Duration,
    cancellation: CancellationToken,
) {
    let mut report_ticker = interval(report_interval);
    report_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("🩺 [VITAL_SIGNS]: Reporter online every {}s.", report_interval.as_secs());

    loop {
        tokio::select! {
            _ = cancellation.cancelled() => break,
            _ = report_ticker.tick() => {}
        }

        // 1. SONDEO DEL ALMACÉN (una vez por tic; resultado cacheado).
        let store_reachable = state.sink.health_check().await;
        state.registers.set_store_reachable(store_reachable);

        // 2. INSTANTÁNEA Y UMBRAL DE MEMORIA
        let report = assemble_report(&state, store_reachable);

        if report.rss_mb > 0 && report.rss_mb as u64 > state.memory_limit_mb {
            warn!(
                "🧠 [MEMORY_GAUGE]: RSS {} MB exceeds the {} MB threshold.",
                report.rss_mb, state.memory_limit_mb
            );
        }

        // 3. ESCRITURA DIRECTA AL BUCKET SECUNDARIO
        state.sink.write_health_metrics(&report).await;
    }
}

/**
 * Cristaliza la instantánea de signos vitales a partir de los gauges
 * compartidos. Síncrona y barata: la superficie HTTP la invoca por
 * petición con la alcanzabilidad cacheada.
 */
pub fn assemble_report(state: &AppState, store_reachable: bool) -> VitalSignsReport {
    let (accounted_memory_mb, resident_memory_mb) = process_memory_mb();

    VitalSignsReport {
        device_count: state.registry.count() as i64,
        active_pingers: state.registers.inflight(),
        suspended_devices: state.registry.get_suspended_count(),
        runtime_tasks: runtime_alive_tasks(),
        memory_mb: accounted_memory_mb,
        rss_mb: resident_memory_mb,
        influxdb_ok: store_reachable,
        influxdb_successful_batches: state.sink.successful_batches(),
        influxdb_failed_batches: state.sink.failed_batches(),
        pings_sent_total: state.registers.pings_sent(),
    }
}

/// Tareas vivas del runtime (campo histórico 'goroutines' del esquema).
fn runtime_alive_tasks() -> i64 {
    tokio::runtime::Handle::current().metrics().num_alive_tasks() as i64
}

/**
 * Memoria del proceso en megabytes: (contabilizada, residente).
 * La residente proviene de /proc en Linux; en otras plataformas
 * degrada a la contabilizada por sysinfo.
 */
fn process_memory_mb() -> (i64, i64) {
    let accounted_mb = sysinfo_accounted_mb().unwrap_or(0);
    let resident_mb = linux_resident_mb().unwrap_or(accounted_mb);
    (accounted_mb, resident_mb)
}

fn sysinfo_accounted_mb() -> Option<i64> {
    let current_pid = sysinfo::get_current_pid().ok()?;

    let mut system = sysinfo::System::new();
    system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[current_pid]), true);

    system
        .process(current_pid)
        .map(|process| (process.memory() / (1024 * 1024)) as i64)
}

#[cfg(target_os = "linux")]
fn linux_resident_mb() -> Option<i64> {
    let status_document = std::fs::read_to_string("/proc/self/status").ok()?;

    for status_line in status_document.lines() {
        if let Some(rss_field) = status_line.strip_prefix("VmRSS:") {
            let rss_kilobytes: i64 = rss_field
                .trim()
                .trim_end_matches("kB")
                .trim()
                .parse()
                .ok()?;
            return Some(rss_kilobytes / 1024);
        }
    }

    None
}

#[cfg(not(target_os = "linux"))]
fn linux_resident_mb() -> Option<i64> {
    None
}
