// [apps/sentinel/src/services/enricher.rs]
/*!
 * =================================================================
 * APARATO: SNMP ENRICHER (V9.2 - CONTINUOUS POLLING)
 * CLASIFICACIÓN: BACKGROUND SERVICE (ESTRATO L1-APP)
 * RESPONSABILIDAD: POBLACIÓN DE sysName/sysDescr POR DISPOSITIVO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TWO TRIGGER PATHS: Enriquecimiento one-shot al descubrir (acotado
 *    por semáforo) y sondeo continuo por dispositivo (tic de 1h por
 *    defecto); el primer tic del poller se difiere un periodo porque
 *    el one-shot ya cubrió t0.
 * 2. INDEPENDENT BREAKER: Cada poller posee su breaker SNMP local
 *    (fallos consecutivos + backoff), independiente del breaker ICMP
 *    del registro; muere con la tarea.
 * 3. SESSION SEAM: Las sesiones se abren por el contrato
 *    'IdentityProbeFactory'; producción usa csnmp sobre UDP y los
 *    Proving Grounds inyectan agentes guionizados.
 * =================================================================
 */

use argos_core_registry::DeviceRegistry;
use argos_core_sweep::ProbeThrottle;
use argos_infra_influx::MetricsSink;
use argos_infra_snmp::{CsnmpTransport, SnmpFault, SnmpTransport, SystemIdentityFetcher};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fábrica de sesiones SNMP hacia el agente de un dispositivo.
#[async_trait]
pub trait IdentityProbeFactory: Send + Sync {
    async fn open_session(&self, device_ip: &str) -> Result<Arc<dyn SnmpTransport>, SnmpFault>;
}

/// Fábrica de producción: sesión csnmp UDP por dispositivo.
pub struct UdpIdentityProbeFactory {
    pub agent_port: u16,
    pub community: String,
    pub timeout: Duration,
}

#[async_trait]
impl IdentityProbeFactory for UdpIdentityProbeFactory {
    async fn open_session(&self, device_ip: &str) -> Result<Arc<dyn SnmpTransport>, SnmpFault> {
        let agent_address: SocketAddr = format!("{}:{}", device_ip, self.agent_port)
            .parse()
            .map_err(|_| SnmpFault::SessionInit(format!("unparseable agent address for {}", device_ip)))?;

        let transport = CsnmpTransport::connect(agent_address, &self.community, self.timeout).await?;
        Ok(Arc::new(transport))
    }
}

/// Sintonía del enriquecimiento continuo.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentCadence {
    pub poll_interval: Duration,
    pub retry_budget: u32,
    pub max_consecutive_fails: u32,
    pub backoff: Duration,
}

/**
 * Servicio de enriquecimiento: comparte fábrica, acelerador SNMP y
 * semáforo de one-shots entre todos los dispositivos.
 */
pub struct SnmpEnricher {
    registry: Arc<DeviceRegistry>,
    sink: Arc<MetricsSink>,
    session_factory: Arc<dyn IdentityProbeFactory>,
    throttle: Arc<ProbeThrottle>,
    oneshot_permits: Arc<Semaphore>,
    cadence: EnrichmentCadence,
}

impl SnmpEnricher {
    #[must_use]
    pub fn new(
        registry: Arc<DeviceRegistry>,
        sink: Arc<MetricsSink>,
        session_factory: Arc<dyn IdentityProbeFactory>,
        throttle: Arc<ProbeThrottle>,
        oneshot_pool_size: usize,
        cadence: EnrichmentCadence,
    ) -> Self {
        Self {
            registry,
            sink,
            session_factory,
            throttle,
            oneshot_permits: Arc::new(Semaphore::new(oneshot_pool_size.max(1))),
            cadence,
        }
    }

    /**
     * Dispara el enriquecimiento one-shot de un dispositivo recién
     * descubierto, acotado por la poza de permisos.
     */
    pub fn spawn_oneshot_enrichment(
        self: &Arc<Self>,
        device_ip: String,
        cancellation: CancellationToken,
    ) -> JoinHandle<()> {
        let enricher = Arc::clone(self);

        tokio::spawn(async move {
            let Ok(_pool_permit) = enricher.oneshot_permits.acquire().await else {
                return;
            };

            if !enricher.throttle.acquire(&cancellation).await {
                return;
            }

            enricher.enrich_once(&device_ip).await;
        })
    }

    /**
     * Una pasada de enriquecimiento: sesión, lectura con fallback,
     * fusión en el registro y punto 'device_info'.
     */
    pub async fn enrich_once(&self, device_ip: &str) -> bool {
        let session = match self.session_factory.open_session(device_ip).await {
            Ok(session) => session,
            Err(session_fault) => {
                debug!("🔌 [SNMP_SESSION_MISS]: [{}]: {}", device_ip, session_fault);
                return false;
            }
        };

        let fetcher = SystemIdentityFetcher::new(session, self.cadence.retry_budget);

        match fetcher.fetch_identity().await {
            Ok(identity) => {
                self.registry.update_snmp(device_ip, &identity.sys_name, &identity.sys_descr);

                // El punto emite los valores ya almacenados (desinfectados).
                if let Some(stored_identity) = self.registry.get_device(device_ip) {
                    self.sink.write_device_info(&stored_identity);
                }

                info!("🧬 [SNMP_ENRICHED]: [{}] identified as [{}].", device_ip, identity.sys_name);
                true
            }
            Err(fetch_fault) => {
                debug!("🌫️ [SNMP_SILENT]: [{}] did not answer: {}", device_ip, fetch_fault);
                false
            }
        }
    }

    /**
     * Poller continuo de un dispositivo con breaker SNMP local. El
     * primer tic se difiere un periodo completo: el one-shot del
     * descubrimiento ya cubrió el instante inicial.
     */
    pub async fn run_continuous_poller(&self, device_ip: String, cancellation: CancellationToken) {
        let mut consecutive_fails: u32 = 0;
        let mut suspended_until: Option<Instant> = None;

        let first_poll_at = Instant::now() + self.cadence.poll_interval;
        let mut poll_ticker = interval_at(first_poll_at, self.cadence.poll_interval);
        poll_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => return,
                _ = poll_ticker.tick() => {}
            }

            // Breaker local antes de ficha: la suspensión no consume bucket.
            if let Some(backoff_deadline) = suspended_until {
                if backoff_deadline > Instant::now() {
                    debug!("⏸️ [SNMP_SUSPENDED]: [{}] poll skipped under backoff.", device_ip);
                    continue;
                }
                suspended_until = None;
            }

            if !self.throttle.acquire(&cancellation).await {
                return;
            }

            if self.enrich_once(&device_ip).await {
                consecutive_fails = 0;
            } else {
                consecutive_fails = consecutive_fails.saturating_add(1);

                if consecutive_fails >= self.cadence.max_consecutive_fails.max(1) {
                    suspended_until = Some(Instant::now() + self.cadence.backoff);
                    consecutive_fails = 0;
                    warn!(
                        "⛔ [SNMP_BREAKER]: [{}] suspended from SNMP polling for {}s.",
                        device_ip,
                        self.cadence.backoff.as_secs()
                    );
                }
            }
        }
    }
}
