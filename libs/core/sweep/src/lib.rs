// [libs/core/sweep/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DISCOVERY SWEEP ENGINE (V5.2 - HYDRA POOL)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: BARRIDO ICMP DE RANGOS CIDR CON POZA ACOTADA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. USABLE HOSTS ONLY: Para prefijos <= /30 se excluyen red y
 *    broadcast; /31 y /32 se toman tal cual.
 * 2. RANDOMIZED ORDER: El orden de emisión se baraja para difuminar
 *    el patrón de escaneo y repartir la carga entre segmentos.
 * 3. SAFETY RAIL: Un CIDR más amplio que /16 se rehúsa con advertencia
 *    y aporta cero hosts, aunque la configuración ya lo haya filtrado.
 * 4. PROMPT DRAIN: La cancelación vacía la poza de trabajadores sin
 *    esperar al resto del espacio de direcciones.
 *
 * # Mathematical Proof (Bounded Burst):
 * Cada trabajador adquiere exactamente una ficha del acelerador global
 * antes de emitir un eco; el caudal del barrido queda acotado por la
 * tasa sostenida del bucket con independencia del tamaño de la poza.
 * =================================================================
 */

/// Acelerador global de sondas (token bucket cancelable).
pub mod throttle;

pub use crate::throttle::ProbeThrottle;

use argos_infra_icmp::EchoProbe;
use ipnet::Ipv4Net;
use rand::seq::SliceRandom;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Prefijo mínimo aceptado por el raíl de seguridad del barrido.
const SWEEP_REFUSAL_PREFIX_LENGTH: u8 = 16;

/// Capacidad del canal que alimenta a la poza de trabajadores.
const SWEEP_FEED_CHANNEL_CAPACITY: usize = 1024;

/// Directivas de un barrido de descubrimiento.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    /// Rangos objetivo ya validados por la configuración.
    pub networks: Vec<Ipv4Net>,
    /// Tamaño fijo de la poza de trabajadores.
    pub worker_pool_size: usize,
    /// Ventana de espera por eco durante el descubrimiento.
    pub probe_timeout: Duration,
}

/**
 * Enumera los hosts utilizables de un rango, aplicando el raíl de
 * seguridad contra barridos accidentales de rangos masivos.
 */
pub fn enumerate_usable_hosts(network: Ipv4Net) -> Vec<Ipv4Addr> {
    if network.prefix_len() < SWEEP_REFUSAL_PREFIX_LENGTH {
        warn!(
            "🛡️ [SWEEP_RAIL]: Network [{}] is broader than /16. Refusing sweep for this range.",
            network
        );
        return Vec::new();
    }

    // ipnet ya excluye red y broadcast para <= /30 e incluye todo en /31 y /32.
    network.hosts().collect()
}

/**
 * Ejecuta un barrido completo sobre el plan dado y retorna el conjunto
 * de direcciones que respondieron dentro de la ventana.
 *
 * El espacio de direcciones fluye por un canal acotado hacia una poza
 * fija de trabajadores; cada trabajador adquiere una ficha global antes
 * de emitir y reporta los vivos por un canal de resultados.
 */
#[instrument(skip_all, fields(networks = plan.networks.len(), workers = plan.worker_pool_size))]
pub async fn execute_sweep(
    plan: SweepPlan,
    probe: Arc<dyn EchoProbe>,
    throttle: Arc<ProbeThrottle>,
    cancellation: CancellationToken,
) -> Vec<Ipv4Addr> {
    // 1. PLAN DE VUELO: enumeración y barajado del espacio de direcciones.
    let mut flight_plan: Vec<Ipv4Addr> = plan
        .networks
        .iter()
        .flat_map(|network| enumerate_usable_hosts(*network))
        .collect();

    flight_plan.shuffle(&mut rand::thread_rng());

    if flight_plan.is_empty() {
        debug!("🌫️ [SWEEP]: Flight plan empty; nothing to probe.");
        return Vec::new();
    }

    info!("📡 [SWEEP_IGNITION]: Probing {} candidate hosts.", flight_plan.len());

    // 2. CANALES: alimentación acotada y recolección de vivos.
    let (feed_sender, feed_receiver) = mpsc::channel::<Ipv4Addr>(SWEEP_FEED_CHANNEL_CAPACITY);
    let shared_feed_receiver = Arc::new(Mutex::new(feed_receiver));
    let (alive_sender, mut alive_receiver) = mpsc::unbounded_channel::<Ipv4Addr>();

    // 3. PRODUCTOR: emite el plan de vuelo respetando la cancelación.
    let producer_cancellation = cancellation.clone();
    let producer_handle = tokio::spawn(async move {
        for candidate in flight_plan {
            tokio::select! {
                _ = producer_cancellation.cancelled() => break,
                send_outcome = feed_sender.send(candidate) => {
                    if send_outcome.is_err() {
                        break;
                    }
                }
            }
        }
        // El cierre implícito del canal drena la poza de trabajadores.
    });

    // 4. POZA DE TRABAJADORES: una ficha global por eco emitido.
    let mut worker_handles = Vec::with_capacity(plan.worker_pool_size.max(1));

    for _ in 0..plan.worker_pool_size.max(1) {
        let worker_feed = Arc::clone(&shared_feed_receiver);
        let worker_probe = Arc::clone(&probe);
        let worker_throttle = Arc::clone(&throttle);
        let worker_cancellation = cancellation.clone();
        let worker_alive_sender = alive_sender.clone();
        let worker_timeout = plan.probe_timeout;

        worker_handles.push(tokio::spawn(async move {
            loop {
                let next_candidate = {
                    let mut feed_guard = worker_feed.lock().await;
                    tokio::select! {
                        _ = worker_cancellation.cancelled() => None,
                        candidate = feed_guard.recv() => candidate,
                    }
                };

                let Some(target) = next_candidate else { break };

                if !worker_throttle.acquire(&worker_cancellation).await {
                    break;
                }

                let verdict = worker_probe.echo(target, worker_timeout).await;

                if verdict.is_success() {
                    let _ = worker_alive_sender.send(target);
                }
            }
        }));
    }

    drop(alive_sender);

    // 5. RECOLECCIÓN: los vivos llegan mientras la poza trabaja.
    let mut responsive_hosts = Vec::new();
    while let Some(alive_host) = alive_receiver.recv().await {
        responsive_hosts.push(alive_host);
    }

    let _ = producer_handle.await;
    for worker_handle in worker_handles {
        let _ = worker_handle.await;
    }

    info!("🏁 [SWEEP_COMPLETE]: {} hosts responded.", responsive_hosts.len());
    responsive_hosts
}
