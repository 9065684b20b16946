// [apps/sentinel/src/services/prober.rs]
/*!
 * =================================================================
 * APARATO: CONTINUOUS PROBER (V9.2 - BREAKER FIRST)
 * CLASIFICACIÓN: PER-DEVICE WORKER (ESTRATO L1-APP)
 * RESPONSABILIDAD: SONDEO ICMP PERPETUO DE UN ÚNICO DISPOSITIVO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BREAKER FIRST: La suspensión se consulta ANTES de adquirir ficha;
 *    un dispositivo suspendido jamás consume presupuesto del bucket y
 *    aun así emite un punto marcado 'suspended' para que los tableros
 *    distingan suspensión de pérdida real.
 * 2. CAPABILITY SEAMS: El prober depende de los contratos
 *    'BreakerRegistry' y 'ProbeResultSink'; los Proving Grounds
 *    inyectan dobles por ambas costuras.
 * 3. ORDINARY FAILURES: Los fallos rápidos del kernel (unreachable)
 *    son fallos semánticos corrientes; solo cambia el nivel de log.
 *    Nada salvo la cancelación termina el bucle.
 * =================================================================
 */

use argos_core_registry::DeviceRegistry;
use argos_core_sweep::ProbeThrottle;
use argos_infra_icmp::{is_probe_eligible, EchoProbe, EchoVerdict};
use argos_infra_influx::MetricsSink;
use chrono::{DateTime, Utc};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::state::ProbeRegisters;

/// Capacidad mínima del registro que el prober necesita (costura de test).
pub trait BreakerRegistry: Send + Sync {
    fn update_last_seen(&self, device_ip: &str);
    fn report_success(&self, device_ip: &str);
    fn report_fail(&self, device_ip: &str, max_fails: u32, backoff: Duration) -> bool;
    fn is_suspended(&self, device_ip: &str) -> bool;
}

impl BreakerRegistry for DeviceRegistry {
    fn update_last_seen(&self, device_ip: &str) {
        DeviceRegistry::update_last_seen(self, device_ip);
    }

    fn report_success(&self, device_ip: &str) {
        DeviceRegistry::report_success(self, device_ip);
    }

    fn report_fail(&self, device_ip: &str, max_fails: u32, backoff: Duration) -> bool {
        DeviceRegistry::report_fail(self, device_ip, max_fails, backoff)
    }

    fn is_suspended(&self, device_ip: &str) -> bool {
        DeviceRegistry::is_suspended(self, device_ip)
    }
}

/// Capacidad mínima del sumidero que el prober necesita (costura de test).
pub trait ProbeResultSink: Send + Sync {
    fn write_probe_result(
        &self,
        device_ip: &str,
        rtt_ms: f64,
        success: bool,
        suspended: bool,
        probe_started_at: DateTime<Utc>,
    );
}

impl ProbeResultSink for MetricsSink {
    fn write_probe_result(
        &self,
        device_ip: &str,
        rtt_ms: f64,
        success: bool,
        suspended: bool,
        probe_started_at: DateTime<Utc>,
    ) {
        MetricsSink::write_probe_result(self, device_ip, rtt_ms, success, suspended, probe_started_at);
    }
}

/// Cadencia y umbrales de un prober individual.
#[derive(Debug, Clone, Copy)]
pub struct ProbeCadence {
    pub probe_interval: Duration,
    pub probe_timeout: Duration,
    pub max_consecutive_fails: u32,
    pub backoff: Duration,
}

/**
 * Plantilla del prober continuo: una instancia compartida produce el
 * bucle de cada dispositivo con las mismas dependencias inyectadas.
 */
pub struct ContinuousProber {
    registry: Arc<dyn BreakerRegistry>,
    sink: Arc<dyn ProbeResultSink>,
    probe: Arc<dyn EchoProbe>,
    throttle: Arc<ProbeThrottle>,
    registers: Arc<ProbeRegisters>,
    cadence: ProbeCadence,
}

impl ContinuousProber {
    #[must_use]
    pub fn new(
        registry: Arc<dyn BreakerRegistry>,
        sink: Arc<dyn ProbeResultSink>,
        probe: Arc<dyn EchoProbe>,
        throttle: Arc<ProbeThrottle>,
        registers: Arc<ProbeRegisters>,
        cadence: ProbeCadence,
    ) -> Self {
        Self { registry, sink, probe, throttle, registers, cadence }
    }

    /**
     * Bucle perpetuo de sondeo de un dispositivo. Solo la cancelación
     * lo termina; el supervisor contiene los pánicos en su frontera.
     */
    pub async fn run(&self, device_ip: String, cancellation: CancellationToken) {
        let Ok(target_address) = device_ip.parse::<Ipv4Addr>() else {
            error!("🧬 [PROBER_BAD_TARGET]: [{}] is not an IPv4 address; worker aborts.", device_ip);
            return;
        };

        let mut probe_ticker = interval(self.cadence.probe_interval);
        probe_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // 1. ESPERA: siguiente tic o cancelación.
            tokio::select! {
                _ = cancellation.cancelled() => return,
                _ = probe_ticker.tick() => {}
            }

            // 2. BREAKER ANTES DE FICHA: la suspensión no consume bucket.
            if self.registry.is_suspended(&device_ip) {
                self.sink.write_probe_result(&device_ip, 0.0, false, true, Utc::now());
                continue;
            }

            // 3. FICHA GLOBAL: espera cancelable.
            if !self.throttle.acquire(&cancellation).await {
                return;
            }

            // 4. VENTANA EN VUELO: el guard decrementa en toda salida.
            let _inflight_window = self.registers.open_inflight_window();

            // 5. GUARDIA DEFENSIVA: estos rangos no deberían llegar aquí.
            if !is_probe_eligible(target_address) {
                warn!("🧱 [PROBER_GUARD]: Ineligible target [{}] skipped.", device_ip);
                continue;
            }

            // 6. ECO
            let probe_started_at = Utc::now();
            let verdict = self.probe.echo(target_address, self.cadence.probe_timeout).await;

            match verdict {
                // 7. ÉXITO: respuesta con round-trip positivo.
                EchoVerdict::Reply(round_trip) if round_trip > Duration::ZERO => {
                    self.registry.report_success(&device_ip);
                    self.registry.update_last_seen(&device_ip);
                    self.sink.write_probe_result(
                        &device_ip,
                        round_trip.as_secs_f64() * 1000.0,
                        true,
                        false,
                        probe_started_at,
                    );
                }

                // 8a. FALLO RÁPIDO: mismo tratamiento, distinto nivel de log.
                EchoVerdict::Unreachable(fast_failure_cause) => {
                    warn!(
                        "⚡ [PROBER_FAST_FAIL]: [{}] rejected probe: {}",
                        device_ip, fast_failure_cause
                    );
                    self.register_failure(&device_ip, probe_started_at);
                }

                // 8b. SILENCIO (o respuesta sin round-trip observable).
                _ => {
                    debug!("🌫️ [PROBER_NO_REPLY]: [{}] silent within window.", device_ip);
                    self.register_failure(&device_ip, probe_started_at);
                }
            }

            // 9. CONTABILIDAD GLOBAL
            self.registers.record_ping_sent();
        }
    }

    fn register_failure(&self, device_ip: &str, probe_started_at: DateTime<Utc>) {
        let suspended_now = self.registry.report_fail(
            device_ip,
            self.cadence.max_consecutive_fails,
            self.cadence.backoff,
        );

        if suspended_now {
            warn!(
                "⛔ [BREAKER_TRIPPED]: [{}] suspended for {}s after {} consecutive failures.",
                device_ip,
                self.cadence.backoff.as_secs(),
                self.cadence.max_consecutive_fails
            );
        }

        self.sink.write_probe_result(device_ip, 0.0, false, false, probe_started_at);
    }
}
