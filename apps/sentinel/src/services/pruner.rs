// [apps/sentinel/src/services/pruner.rs]
/*!
 * =================================================================
 * APARATO: STALE DEVICE PRUNER (V9.0 - HOURLY REAPER)
 * CLASIFICACIÓN: BACKGROUND SERVICE (ESTRATO L1-APP)
 * RESPONSABILIDAD: PODA HORARIA DE DISPOSITIVOS SILENCIOSOS
 *
 * El supervisor retira los probers correspondientes en su siguiente
 * tic de reconciliación; la poda solo toca el registro.
 * =================================================================
 */

use argos_core_registry::DeviceRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Cadencia del ciclo de poda.
const PRUNE_CYCLE_PERIOD: Duration = Duration::from_secs(3600);

/// Umbral de silencio para declarar un dispositivo obsoleto (24 h).
const STALE_DEVICE_THRESHOLD: Duration = Duration::from_secs(24 * 3600);

/// Daemon de poda: cada hora retira los dispositivos con 24h de silencio.
pub async fn run_pruner(registry: Arc<DeviceRegistry>, cancellation: CancellationToken) {
    let mut prune_ticker = interval(PRUNE_CYCLE_PERIOD);
    prune_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("🧹 [PRUNER]: Online with hourly cadence (24h stale threshold).");

    loop {
        tokio::select! {
            _ = cancellation.cancelled() => break,
            _ = prune_ticker.tick() => {}
        }

        let pruned_devices = registry.prune_stale(STALE_DEVICE_THRESHOLD);

        for pruned_device in &pruned_devices {
            debug!("🍂 [PRUNER]: Stale device [{}] ({}) removed.", pruned_device.ip, pruned_device.hostname);
        }

        if !pruned_devices.is_empty() {
            info!(
                "🧹 [PRUNER]: Cycle complete; {} stale devices pruned, {} remain.",
                pruned_devices.len(),
                registry.count()
            );
        }
    }
}
