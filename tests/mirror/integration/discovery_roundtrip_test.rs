// [tests/mirror/integration/discovery_roundtrip_test.rs]
/**
 * =================================================================
 * APARATO: DISCOVERY ROUNDTRIP CERTIFIER (V1.2)
 * CLASIFICACIÓN: TRINITY EVIDENCE // INTEGRACIÓN
 * RESPONSABILIDAD: BARRIDO + ALTA + ENRIQUECIMIENTO + PUNTO device_info
 *
 * Escenario canónico: un /30 con un único host vivo. El ciclo de
 * descubrimiento debe dar de alta exactamente ese host, enriquecerlo
 * vía SNMP guionizado y cristalizar un punto 'device_info' con los
 * metadatos desinfectados.
 * =================================================================
 */

use argos_core_registry::DeviceRegistry;
use argos_core_sweep::ProbeThrottle;
use argos_infra_icmp::{EchoProbe, EchoVerdict};
use argos_infra_influx::{InfluxError, MetricsSink, SinkTuning, StoreUplink};
use argos_infra_snmp::{
    SnmpFault, SnmpTransport, SnmpValue, SYS_DESCR_INSTANCE_OID, SYS_NAME_INSTANCE_OID,
};
use argos_sentinel::services::discovery::DiscoveryService;
use argos_sentinel::services::enricher::{EnrichmentCadence, IdentityProbeFactory, SnmpEnricher};
use async_trait::async_trait;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Red con un único superviviente: 10.0.0.1 responde, 10.0.0.2 calla.
struct SingleSurvivorProbe;

#[async_trait]
impl EchoProbe for SingleSurvivorProbe {
    async fn echo(&self, target: Ipv4Addr, _timeout: Duration) -> EchoVerdict {
        if target == Ipv4Addr::new(10, 0, 0, 1) {
            EchoVerdict::Reply(Duration::from_millis(2))
        } else {
            EchoVerdict::Timeout
        }
    }
}

/// Agente SNMP guionizado del router superviviente.
struct ScriptedRouterAgent;

#[async_trait]
impl SnmpTransport for ScriptedRouterAgent {
    async fn get(&self, oid_text: &str) -> Result<SnmpValue, SnmpFault> {
        match oid_text {
            oid if oid == SYS_NAME_INSTANCE_OID => Ok(SnmpValue::Text("r1".to_string())),
            oid if oid == SYS_DESCR_INSTANCE_OID => Ok(SnmpValue::Text("router".to_string())),
            _ => Err(SnmpFault::RequestFailed("noSuchInstance".to_string())),
        }
    }

    async fn get_next(&self, _oid_text: &str) -> Result<(String, SnmpValue), SnmpFault> {
        Err(SnmpFault::RequestFailed("endOfMib".to_string()))
    }
}

/// Fábrica de sesiones que solo conoce al superviviente.
struct ScriptedSessionFactory;

#[async_trait]
impl IdentityProbeFactory for ScriptedSessionFactory {
    async fn open_session(&self, device_ip: &str) -> Result<Arc<dyn SnmpTransport>, SnmpFault> {
        if device_ip == "10.0.0.1" {
            Ok(Arc::new(ScriptedRouterAgent))
        } else {
            Err(SnmpFault::SessionInit(format!("no agent at {}", device_ip)))
        }
    }
}

/// Almacén grabador compartido por el sumidero.
#[derive(Default)]
struct RecordingStore {
    recorded_bodies: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn all_lines(&self) -> Vec<String> {
        self.recorded_bodies
            .lock()
            .expect("test lock")
            .iter()
            .flat_map(|body| body.lines().map(str::to_string).collect::<Vec<String>>())
            .collect()
    }
}

#[async_trait]
impl StoreUplink for RecordingStore {
    async fn write_lines(&self, _bucket: &str, body: String) -> Result<(), InfluxError> {
        self.recorded_bodies.lock().expect("test lock").push(body);
        Ok(())
    }

    async fn is_reachable(&self) -> bool {
        true
    }
}

/// Espera acotada en tiempo real hasta cumplir la condición.
async fn await_condition(description: &str, condition: impl Fn() -> bool) {
    for _ in 0..300 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("CONDITION_TIMEOUT: {}", description);
}

/**
 * CERTIFICACIÓN: Ida y vuelta completa de descubrimiento (S-canónico).
 */
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn certify_discovery_and_enrichment_roundtrip() {
    println!("\n🧪 [PROVING_GROUNDS]: Initiating discovery roundtrip audit...");

    let store = Arc::new(RecordingStore::default());
    let sink = Arc::new(MetricsSink::new(
        store.clone(),
        SinkTuning {
            batch_size: 1,
            flush_interval: Duration::from_millis(100),
            primary_bucket: "telemetry".to_string(),
            health_bucket: "health".to_string(),
        },
    ));

    let registry = Arc::new(DeviceRegistry::new(8));

    let enricher = Arc::new(SnmpEnricher::new(
        registry.clone(),
        sink.clone(),
        Arc::new(ScriptedSessionFactory),
        Arc::new(ProbeThrottle::new(1_000.0, 64)),
        4,
        EnrichmentCadence {
            poll_interval: Duration::from_secs(3600),
            retry_budget: 1,
            max_consecutive_fails: 5,
            backoff: Duration::from_secs(3600),
        },
    ));

    let discovery = DiscoveryService::new(
        registry.clone(),
        enricher,
        Arc::new(SingleSurvivorProbe),
        Arc::new(ProbeThrottle::new(10_000.0, 256)),
        vec!["10.0.0.0/30".parse().expect("valid CIDR")],
        4,
        Duration::from_secs(1800),
        Duration::from_secs(60),
    );

    // 1. UN ÚNICO CICLO DE DESCUBRIMIENTO
    discovery.execute_discovery_cycle(&CancellationToken::new()).await;

    // 2. EL REGISTRO CONTIENE EXACTAMENTE AL SUPERVIVIENTE
    let admitted: HashSet<String> = registry.get_all_ips().into_iter().collect();
    let expected: HashSet<String> = ["10.0.0.1".to_string()].into_iter().collect();
    assert_eq!(admitted, expected, "/30 sweep must admit .1 only");

    // 3. EL ENRIQUECIMIENTO ONE-SHOT POBLÓ LOS METADATOS
    await_condition("one-shot enrichment merged metadata", || {
        registry
            .get_device("10.0.0.1")
            .map(|identity| identity.hostname == "r1" && identity.sys_descr == "router")
            .unwrap_or(false)
    })
    .await;

    // 4. EL PUNTO device_info CRISTALIZÓ EN EL ALMACÉN
    await_condition("device_info point flushed", || {
        store.all_lines().iter().any(|line| line.starts_with("device_info,ip=10.0.0.1 "))
    })
    .await;

    let device_info_line = store
        .all_lines()
        .into_iter()
        .find(|line| line.starts_with("device_info,ip=10.0.0.1 "))
        .expect("device_info line present");

    assert!(device_info_line.contains("hostname=\"r1\""));
    assert!(device_info_line.contains("snmp_description=\"router\""));

    sink.close().await;
    println!("   ✅ Roundtrip certified: sweep -> admission -> enrichment -> point.");
}
