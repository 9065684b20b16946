// [apps/sentinel/src/services/discovery.rs]
/*!
 * =================================================================
 * APARATO: DISCOVERY SERVICE (V9.1 - SWEEP CONDUCTOR)
 * CLASIFICACIÓN: BACKGROUND SERVICE (ESTRATO L1-APP)
 * RESPONSABILIDAD: BARRIDOS PERIÓDICOS Y ALTAS EN EL REGISTRO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MIN-SCAN GUARD: Además del tic configurado, 'min_scan_interval'
 *    acota la frecuencia real de barrido ante tics acumulados.
 * 2. ADMISSION PIPELINE: Cada host vivo se da de alta; solo las altas
 *    genuinamente nuevas disparan el enriquecimiento one-shot.
 * =================================================================
 */

use argos_core_registry::{AdmissionOutcome, DeviceRegistry};
use argos_core_sweep::{execute_sweep, ProbeThrottle, SweepPlan};
use argos_infra_icmp::EchoProbe;
use ipnet::Ipv4Net;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::services::enricher::SnmpEnricher;

/// Ventana de espera por eco durante el descubrimiento.
const DISCOVERY_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Conductor de barridos de descubrimiento.
pub struct DiscoveryService {
    registry: Arc<DeviceRegistry>,
    enricher: Arc<SnmpEnricher>,
    probe: Arc<dyn EchoProbe>,
    throttle: Arc<ProbeThrottle>,
    networks: Vec<Ipv4Net>,
    worker_pool_size: usize,
    discovery_interval: Duration,
    min_scan_interval: Duration,
}

impl DiscoveryService {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<DeviceRegistry>,
        enricher: Arc<SnmpEnricher>,
        probe: Arc<dyn EchoProbe>,
        throttle: Arc<ProbeThrottle>,
        networks: Vec<Ipv4Net>,
        worker_pool_size: usize,
        discovery_interval: Duration,
        min_scan_interval: Duration,
    ) -> Self {
        Self {
            registry,
            enricher,
            probe,
            throttle,
            networks,
            worker_pool_size,
            discovery_interval,
            min_scan_interval,
        }
    }

    /// Daemon de descubrimiento: un barrido inmediato y luego por tics.
    pub async fn run(self, cancellation: CancellationToken) {
        let mut sweep_ticker = interval(self.discovery_interval);
        sweep_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "🗺️ [DISCOVERY]: Online over {} networks every {}s.",
            self.networks.len(),
            self.discovery_interval.as_secs()
        );

        let mut last_sweep_started: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,
                _ = sweep_ticker.tick() => {}
            }

            if let Some(previous_start) = last_sweep_started {
                if previous_start.elapsed() < self.min_scan_interval {
                    warn!("🐢 [DISCOVERY_GUARD]: Tick under min_scan_interval; sweep skipped.");
                    continue;
                }
            }

            last_sweep_started = Some(Instant::now());
            self.execute_discovery_cycle(&cancellation).await;
        }
    }

    /**
     * Un ciclo completo: barrido, altas y enriquecimiento one-shot de
     * los dispositivos genuinamente nuevos.
     */
    #[instrument(skip_all)]
    pub async fn execute_discovery_cycle(&self, cancellation: &CancellationToken) {
        let sweep_plan = SweepPlan {
            networks: self.networks.clone(),
            worker_pool_size: self.worker_pool_size,
            probe_timeout: DISCOVERY_PROBE_TIMEOUT,
        };

        let responsive_hosts = execute_sweep(
            sweep_plan,
            Arc::clone(&self.probe),
            Arc::clone(&self.throttle),
            cancellation.child_token(),
        )
        .await;

        let mut newly_admitted: usize = 0;

        for responsive_host in responsive_hosts {
            let device_ip = responsive_host.to_string();

            if self.registry.add_device(&device_ip) == AdmissionOutcome::New {
                newly_admitted += 1;
                let _detached_enrichment = self
                    .enricher
                    .spawn_oneshot_enrichment(device_ip, cancellation.child_token());
            }
        }

        if newly_admitted > 0 {
            info!("🆕 [DISCOVERY]: {} new devices admitted to the registry.", newly_admitted);
        }
    }
}
