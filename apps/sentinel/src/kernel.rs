// INICIO DEL ARCHIVO [apps/sentinel/src/kernel.rs]
/**
 * =================================================================
 * APARATO: SENTINEL SOVEREIGN KERNEL (V9.4 - ORDERED SHUTDOWN)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios:
 * descubrimiento, supervisores de sondeo ICMP y SNMP, podador,
 * reportero de signos vitales y superficie HTTP. Los únicos fallos
 * fatales son los de ignición (configuración, almacén inalcanzable,
 * puerto de salud ocupado, socket raw denegado); todo lo demás se
 * recupera localmente.
 *
 * # Mathematical Proof (Shutdown Order):
 * cancelar raíz -> detener tickers del plano de control -> cancelar y
 * esperar probers/pollers -> drenar y sellar el sumidero -> soltar el
 * cliente del almacén. Cada paso solo comienza cuando el anterior
 * confirmó; ningún punto encolado antes del cierre se pierde salvo
 * rechazo del propio almacén.
 * =================================================================
 */

use anyhow::{bail, Context, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use argos_core_registry::DeviceRegistry;
use argos_core_sweep::ProbeThrottle;
use argos_domain_config::SentinelConfig;
use argos_infra_icmp::{EchoProbe, SurgeEchoProbe};
use argos_infra_influx::{InfluxHttpUplink, MetricsSink, SinkTuning, StoreUplink};

use crate::routes::create_health_router;
use crate::services::discovery::DiscoveryService;
use crate::services::enricher::{EnrichmentCadence, SnmpEnricher, UdpIdentityProbeFactory};
use crate::services::prober::{
    BreakerRegistry, ContinuousProber, ProbeCadence, ProbeResultSink,
};
use crate::services::pruner::run_pruner;
use crate::services::supervisor::{run_reconciliation_daemon, TaskReconciler};
use crate::services::vital_signs::run_vital_signs_reporter;
use crate::state::{AppState, ProbeRegisters};

/// Cadencia de reconciliación de los supervisores.
const RECONCILIATION_TICK_PERIOD: Duration = Duration::from_secs(5);

pub struct SentinelKernel {
    config: SentinelConfig,
    application_state: AppState,
    health_listener: TcpListener,
    probe: Arc<dyn EchoProbe>,
    probe_throttle: Arc<ProbeThrottle>,
    snmp_throttle: Arc<ProbeThrottle>,
    root_cancellation: CancellationToken,
}

impl SentinelKernel {
    /**
     * Realiza la ignición de la infraestructura: uplink del almacén,
     * sumidero, registro, socket raw y puerto de salud.
     *
     * # Errors:
     * Todo fallo aquí es fatal y aborta el arranque con código distinto
     * de cero: almacén inalcanzable, puerto ocupado o socket denegado.
     */
    pub async fn ignite(config: SentinelConfig) -> Result<Self> {
        // 1. UPLINK DEL ALMACÉN + CHEQUEO FATAL DE ALCANZABILIDAD
        let uplink: Arc<dyn StoreUplink> = Arc::new(InfluxHttpUplink::new(
            &config.influxdb.url,
            &config.influxdb.token,
            &config.influxdb.org,
        )?);

        if !uplink.is_reachable().await {
            bail!(
                "STORE_UNREACHABLE_AT_START: InfluxDB at [{}] did not answer the ignition probe.",
                config.influxdb.url
            );
        }

        // 2. SUMIDERO DE MÉTRICAS (WRITE-BEHIND)
        let sink = Arc::new(MetricsSink::new(
            Arc::clone(&uplink),
            SinkTuning {
                batch_size: config.influxdb.batch_size,
                flush_interval: config.influxdb.flush_interval,
                primary_bucket: config.influxdb.bucket.clone(),
                health_bucket: config.influxdb.health_bucket.clone(),
            },
        ));

        // 3. REGISTRO SOBERANO Y GAUGES
        let registry = Arc::new(DeviceRegistry::new(config.max_devices));
        let registers = Arc::new(ProbeRegisters::new());
        // El chequeo de ignición ya confirmó el almacén; la superficie de
        // readiness arranca verde hasta el primer tic del reportero.
        registers.set_store_reachable(true);

        // 4. SUPERFICIE DE SALUD (BIND FATAL)
        let bind_address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.health_check_port));
        let health_listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("HEALTH_PORT_BIND_FAULT: Unable to claim {}", bind_address))?;

        // 5. SOCKET RAW ICMP (FATAL SIN CAP_NET_RAW)
        let probe: Arc<dyn EchoProbe> = Arc::new(SurgeEchoProbe::new()?);

        // 6. ACELERADORES GLOBALES
        let probe_throttle = Arc::new(ProbeThrottle::new(
            config.ping_rate_limit,
            config.ping_burst_limit,
        ));
        let snmp_throttle = Arc::new(ProbeThrottle::new(
            config.snmp_rate_limit,
            config.snmp_burst_limit,
        ));

        let application_state = AppState::new(
            Arc::clone(&registry),
            Arc::clone(&sink),
            Arc::clone(&registers),
            config.memory_limit_mb,
        );

        Ok(Self {
            config,
            application_state,
            health_listener,
            probe,
            probe_throttle,
            snmp_throttle,
            root_cancellation: CancellationToken::new(),
        })
    }

    /**
     * Lanza todos los daemons del plano de control y bloquea sirviendo
     * la superficie HTTP hasta la cancelación; después ejecuta la
     * secuencia de cierre ordenada.
     */
    pub async fn launch_sovereign_operations(self) -> Result<()> {
        let root_cancellation = self.root_cancellation.clone();
        spawn_signal_listener(root_cancellation.clone());

        let control_tracker = TaskTracker::new();

        // --- 1. ENRIQUECEDOR SNMP (FÁBRICA UDP DE PRODUCCIÓN) ---
        let enricher = Arc::new(SnmpEnricher::new(
            Arc::clone(&self.application_state.registry),
            Arc::clone(&self.application_state.sink),
            Arc::new(UdpIdentityProbeFactory {
                agent_port: self.config.snmp.port,
                community: self.config.snmp.community.clone(),
                timeout: self.config.snmp.timeout,
            }),
            Arc::clone(&self.snmp_throttle),
            self.config.snmp_workers,
            EnrichmentCadence {
                poll_interval: self.config.snmp_interval,
                retry_budget: self.config.snmp.retries,
                max_consecutive_fails: self.config.snmp_max_consecutive_fails,
                backoff: self.config.snmp_backoff_duration,
            },
        ));

        // --- 2. SERVICIO DE DESCUBRIMIENTO ---
        let discovery = DiscoveryService::new(
            Arc::clone(&self.application_state.registry),
            Arc::clone(&enricher),
            Arc::clone(&self.probe),
            Arc::clone(&self.probe_throttle),
            self.config.parsed_networks(),
            self.config.icmp_workers,
            self.config.icmp_discovery_interval,
            self.config.min_scan_interval,
        );
        control_tracker.spawn(discovery.run(root_cancellation.child_token()));

        // --- 3. SUPERVISOR DE PROBERS ICMP ---
        let registry_capability: Arc<dyn BreakerRegistry> =
            Arc::clone(&self.application_state.registry) as Arc<dyn BreakerRegistry>;
        let sink_capability: Arc<dyn ProbeResultSink> =
            Arc::clone(&self.application_state.sink) as Arc<dyn ProbeResultSink>;

        let prober_template = Arc::new(ContinuousProber::new(
            registry_capability,
            sink_capability,
            Arc::clone(&self.probe),
            Arc::clone(&self.probe_throttle),
            Arc::clone(&self.application_state.registers),
            ProbeCadence {
                probe_interval: self.config.ping_interval,
                probe_timeout: self.config.ping_timeout,
                max_consecutive_fails: self.config.ping_max_consecutive_fails,
                backoff: self.config.ping_backoff_duration,
            },
        ));

        let ping_reconciler = TaskReconciler::new(
            "PINGER",
            self.config.max_concurrent_pingers,
            root_cancellation.clone(),
        );

        let ping_worker_factory = {
            let prober = Arc::clone(&prober_template);
            move |device_ip: String, cancellation: CancellationToken| {
                let prober = Arc::clone(&prober);
                async move { prober.run(device_ip, cancellation).await }
            }
        };

        control_tracker.spawn(run_reconciliation_daemon(
            Arc::clone(&ping_reconciler),
            Arc::clone(&self.application_state.registry),
            RECONCILIATION_TICK_PERIOD,
            root_cancellation.child_token(),
            ping_worker_factory,
        ));

        // --- 4. SUPERVISOR DE POLLERS SNMP ---
        let snmp_reconciler = TaskReconciler::new(
            "SNMP_POLLER",
            self.config.max_concurrent_snmp_pollers,
            root_cancellation.clone(),
        );

        let snmp_worker_factory = {
            let enricher = Arc::clone(&enricher);
            move |device_ip: String, cancellation: CancellationToken| {
                let enricher = Arc::clone(&enricher);
                async move { enricher.run_continuous_poller(device_ip, cancellation).await }
            }
        };

        control_tracker.spawn(run_reconciliation_daemon(
            Arc::clone(&snmp_reconciler),
            Arc::clone(&self.application_state.registry),
            RECONCILIATION_TICK_PERIOD,
            root_cancellation.child_token(),
            snmp_worker_factory,
        ));

        // --- 5. HIGIENE Y AUTO-OBSERVACIÓN ---
        control_tracker.spawn(run_pruner(
            Arc::clone(&self.application_state.registry),
            root_cancellation.child_token(),
        ));
        control_tracker.spawn(run_vital_signs_reporter(
            self.application_state.clone(),
            self.config.health_report_interval,
            root_cancellation.child_token(),
        ));

        // --- 6. IGNICIÓN DEL TRANSPORTE HTTP (AXUM) ---
        let health_router = create_health_router(self.application_state.clone());

        info!(
            "🚀 [KERNEL_ONLINE]: Sentinel control plane active; health surface on port {}.",
            self.config.health_check_port
        );

        axum::serve(self.health_listener, health_router)
            .with_graceful_shutdown(root_cancellation.clone().cancelled_owned())
            .await
            .context("KERNEL_COLLAPSE: Health surface runtime failure")?;

        // --- 7. SECUENCIA DE CIERRE ORDENADA ---
        info!("🌒 [KERNEL_SHUTDOWN]: Root scope cancelled; sealing strata in order.");
        root_cancellation.cancel();

        // 7a. Tickers del plano de control.
        control_tracker.close();
        control_tracker.wait().await;

        // 7b/7c. Probers y pollers: cancelar, esperar el wait-group.
        ping_reconciler.shutdown().await;
        snmp_reconciler.shutdown().await;

        // 7d. Sumidero: drenar el canal y volcar el remanente.
        self.application_state.sink.close().await;

        // 7e. El cliente del almacén cae con su último Arc.
        info!("🏁 [KERNEL_OFFLINE]: Clean shutdown complete.");
        Ok(())
    }
}

/// Traduce SIGINT/SIGTERM a la cancelación del ámbito raíz.
fn spawn_signal_listener(root_cancellation: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut terminate_stream = tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            )
            .expect("FATAL: SIGTERM handler registration failed.");

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate_stream.recv() => {}
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        warn!("⚠️ [SIGNAL]: Termination requested by host. Sealing current strata...");
        root_cancellation.cancel();
    });
}
// FIN DEL ARCHIVO [apps/sentinel/src/kernel.rs]
