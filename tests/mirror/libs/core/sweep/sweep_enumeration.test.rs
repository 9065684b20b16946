// [tests/mirror/libs/core/sweep/sweep_enumeration.test.rs]
/**
 * =================================================================
 * APARATO: SWEEP ENUMERATION CERTIFIER (V1.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-SWEEP
 * RESPONSABILIDAD: PLAN DE HOSTS, RAÍL DE SEGURIDAD Y BARRIDO REAL
 * =================================================================
 */

use argos_core_sweep::{enumerate_usable_hosts, execute_sweep, ProbeThrottle, SweepPlan};
use argos_infra_icmp::{EchoProbe, EchoVerdict};
use async_trait::async_trait;
use ipnet::Ipv4Net;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Agente guionizado: vivo únicamente en las direcciones sembradas.
struct ScriptedProbe {
    alive: HashSet<Ipv4Addr>,
}

#[async_trait]
impl EchoProbe for ScriptedProbe {
    async fn echo(&self, target: Ipv4Addr, _timeout: Duration) -> EchoVerdict {
        if self.alive.contains(&target) {
            EchoVerdict::Reply(Duration::from_millis(2))
        } else {
            EchoVerdict::Timeout
        }
    }
}

/**
 * CERTIFICACIÓN: El plan de un /30 direcciona exactamente .1 y .2.
 * Red y broadcast quedan excluidos del espacio utilizable.
 */
#[test]
fn certify_slash_30_flight_plan_is_exactly_two_hosts() {
    println!("\n🧪 [PROVING_GROUNDS]: Auditing /30 usable-host exclusion...");

    let network: Ipv4Net = "10.0.0.0/30".parse().expect("valid CIDR");
    let flight_plan: HashSet<Ipv4Addr> = enumerate_usable_hosts(network).into_iter().collect();

    let expected: HashSet<Ipv4Addr> =
        [Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)].into_iter().collect();

    assert_eq!(flight_plan, expected);
    println!("   ✅ Network and broadcast excluded; .1 and .2 addressed.");
}

/// El raíl de seguridad rehúsa cualquier rango más amplio que /16.
#[test]
fn certify_safety_rail_refuses_oversized_ranges() {
    for oversized in ["10.0.0.0/8", "172.16.0.0/12", "10.0.0.0/15"] {
        let network: Ipv4Net = oversized.parse().expect("valid CIDR");
        assert!(
            enumerate_usable_hosts(network).is_empty(),
            "RAIL_BREACH: {} produced hosts",
            oversized
        );
    }
}

/**
 * CERTIFICACIÓN: Barrido extremo a extremo sobre varios rangos.
 * El conjunto reportado es exactamente el de los hosts vivos y cada
 * candidato consumió una única ficha del acelerador global.
 */
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn certify_multi_range_sweep_reports_alive_set_exactly() {
    let alive: HashSet<Ipv4Addr> = [
        Ipv4Addr::new(10, 0, 0, 1),
        Ipv4Addr::new(10, 0, 1, 14),
        Ipv4Addr::new(192, 168, 50, 3),
    ]
    .into_iter()
    .collect();

    let plan = SweepPlan {
        networks: vec![
            "10.0.0.0/29".parse().expect("valid CIDR"),
            "10.0.1.8/29".parse().expect("valid CIDR"),
            "192.168.50.0/29".parse().expect("valid CIDR"),
        ],
        worker_pool_size: 8,
        probe_timeout: Duration::from_millis(25),
    };

    let throttle = Arc::new(ProbeThrottle::new(50_000.0, 512));

    let responsive = execute_sweep(
        plan,
        Arc::new(ScriptedProbe { alive: alive.clone() }),
        Arc::clone(&throttle),
        CancellationToken::new(),
    )
    .await;

    let responsive_set: HashSet<Ipv4Addr> = responsive.into_iter().collect();
    assert_eq!(responsive_set, alive);

    // Tres /29 => 18 hosts utilizables => 18 fichas exactas.
    assert_eq!(throttle.dispensed(), 18);
}
