// [tests/mirror/apps/sentinel/services/prober_breaker.test.rs]
/**
 * =================================================================
 * APARATO: PROBER BREAKER CERTIFIER (V1.3 - VIRTUAL CLOCK)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-APP
 * RESPONSABILIDAD: DISPARO, SUSPENSIÓN Y RECUPERACIÓN EN EL BUCLE
 *
 * Certifica la secuencia completa del prober contra el registro real:
 * tres silencios consecutivos disparan el breaker; el tic suspendido
 * emite su punto marcado SIN consumir ficha del acelerador; superado
 * el backoff y con el agente de vuelta, el éxito limpia el estado.
 * =================================================================
 */

use argos_core_registry::DeviceRegistry;
use argos_core_sweep::ProbeThrottle;
use argos_infra_icmp::{EchoProbe, EchoVerdict};
use argos_sentinel::services::prober::{ContinuousProber, ProbeCadence, ProbeResultSink};
use argos_sentinel::state::ProbeRegisters;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Punto observado por el sumidero doble.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ObservedPoint {
    rtt_ms: f64,
    success: bool,
    suspended: bool,
}

/// Sumidero doble: registra cada punto en orden de emisión.
#[derive(Default)]
struct RecordingSink {
    points: Mutex<Vec<ObservedPoint>>,
}

impl RecordingSink {
    fn snapshot(&self) -> Vec<ObservedPoint> {
        self.points.lock().expect("test lock").clone()
    }
}

impl ProbeResultSink for RecordingSink {
    fn write_probe_result(
        &self,
        _device_ip: &str,
        rtt_ms: f64,
        success: bool,
        suspended: bool,
        _probe_started_at: DateTime<Utc>,
    ) {
        self.points
            .lock()
            .expect("test lock")
            .push(ObservedPoint { rtt_ms, success, suspended });
    }
}

/// Agente conmutable: silencio total o respuesta inmediata.
struct TogglingProbe {
    replying: AtomicBool,
}

#[async_trait]
impl EchoProbe for TogglingProbe {
    async fn echo(&self, _target: Ipv4Addr, _timeout: Duration) -> EchoVerdict {
        if self.replying.load(Ordering::SeqCst) {
            EchoVerdict::Reply(Duration::from_millis(4))
        } else {
            EchoVerdict::Timeout
        }
    }
}

/// Espera acotada en reloj virtual hasta cumplir la condición.
async fn await_condition(description: &str, condition: impl Fn() -> bool) {
    for _ in 0..600 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("CONDITION_TIMEOUT: {}", description);
}

/**
 * CERTIFICACIÓN: Escenario completo de disparo y recuperación.
 */
#[tokio::test(start_paused = true)]
async fn certify_trip_suspend_and_recover_cycle() {
    println!("\n🧪 [PROVING_GROUNDS]: Initiating prober breaker cycle audit...");

    let device_ip = "10.0.0.77".to_string();

    let registry = Arc::new(DeviceRegistry::new(8));
    registry.add_device(&device_ip);

    let sink = Arc::new(RecordingSink::default());
    let probe = Arc::new(TogglingProbe { replying: AtomicBool::new(false) });
    let throttle = Arc::new(ProbeThrottle::new(100_000.0, 1024));
    let registers = Arc::new(ProbeRegisters::new());

    let prober = Arc::new(ContinuousProber::new(
        registry.clone(),
        sink.clone(),
        probe.clone(),
        throttle.clone(),
        registers.clone(),
        ProbeCadence {
            probe_interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(1),
            max_consecutive_fails: 3,
            backoff: Duration::from_secs(120),
        },
    ));

    let cancellation = CancellationToken::new();
    let worker_handle = {
        let prober = Arc::clone(&prober);
        let worker_ip = device_ip.clone();
        let worker_cancellation = cancellation.clone();
        tokio::spawn(async move { prober.run(worker_ip, worker_cancellation).await })
    };

    // FASE 1: tres silencios consecutivos disparan el breaker.
    await_condition("three failure points emitted", || {
        sink.snapshot().iter().filter(|point| !point.success && !point.suspended).count() >= 3
    })
    .await;

    await_condition("breaker engaged", || registry.is_suspended(&device_ip)).await;
    assert_eq!(registry.get_suspended_count(), 1);

    let tokens_at_trip = throttle.dispensed();
    assert_eq!(tokens_at_trip, 3, "one token per real probe");

    // FASE 2: los tics bajo suspensión emiten su marca y no consumen bucket.
    await_condition("suspended point emitted", || {
        sink.snapshot().iter().any(|point| point.suspended)
    })
    .await;

    assert_eq!(
        throttle.dispensed(),
        tokens_at_trip,
        "suspended ticks must never consume rate-limiter tokens"
    );

    let suspended_sample = sink
        .snapshot()
        .into_iter()
        .find(|point| point.suspended)
        .expect("suspended point recorded");
    assert_eq!(suspended_sample.rtt_ms, 0.0);
    assert!(!suspended_sample.success);

    // FASE 3: el agente vuelve; superado el backoff llega el éxito.
    probe.replying.store(true, Ordering::SeqCst);

    await_condition("recovery point emitted", || {
        sink.snapshot().iter().any(|point| point.success)
    })
    .await;

    assert_eq!(registry.get_suspended_count(), 0, "success clears the suspension");
    assert!(!registry.is_suspended(&device_ip));

    let recovery_sample = sink
        .snapshot()
        .into_iter()
        .find(|point| point.success)
        .expect("success point recorded");
    assert!(recovery_sample.rtt_ms > 0.0);
    assert!(!recovery_sample.suspended);

    // FASE 4: cierre del bucle y contabilidad global.
    cancellation.cancel();
    worker_handle.await.expect("prober joins cleanly");

    assert_eq!(registers.inflight(), 0, "inflight window closed on exit");
    assert!(registers.pings_sent() >= 4);

    println!("   ✅ Breaker cycle certified end to end.");
}

/**
 * CERTIFICACIÓN: Los fallos rápidos (unreachable) son fallos
 * ordinarios: alimentan el breaker y jamás matan el bucle.
 */
#[tokio::test(start_paused = true)]
async fn certify_fast_failures_feed_the_breaker_without_killing_the_loop() {
    let device_ip = "10.0.0.78".to_string();

    let registry = Arc::new(DeviceRegistry::new(8));
    registry.add_device(&device_ip);

    struct UnreachableProbe;

    #[async_trait]
    impl EchoProbe for UnreachableProbe {
        async fn echo(&self, _target: Ipv4Addr, _timeout: Duration) -> EchoVerdict {
            EchoVerdict::Unreachable("host unreachable".to_string())
        }
    }

    let sink = Arc::new(RecordingSink::default());
    let registers = Arc::new(ProbeRegisters::new());

    let prober = Arc::new(ContinuousProber::new(
        registry.clone(),
        sink.clone(),
        Arc::new(UnreachableProbe),
        Arc::new(ProbeThrottle::new(100_000.0, 1024)),
        registers.clone(),
        ProbeCadence {
            probe_interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(1),
            max_consecutive_fails: 2,
            backoff: Duration::from_secs(600),
        },
    ));

    let cancellation = CancellationToken::new();
    let worker_handle = {
        let prober = Arc::clone(&prober);
        let worker_ip = device_ip.clone();
        let worker_cancellation = cancellation.clone();
        tokio::spawn(async move { prober.run(worker_ip, worker_cancellation).await })
    };

    await_condition("fast failures tripped the breaker", || {
        registry.is_suspended(&device_ip)
    })
    .await;

    let observed = sink.snapshot();
    assert!(observed.iter().filter(|point| !point.success).count() >= 2);

    cancellation.cancel();
    worker_handle.await.expect("prober joins cleanly");
}
