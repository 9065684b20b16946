// [tests/mirror/libs/infra/influx/sink_backpressure.test.rs]
/**
 * =================================================================
 * APARATO: SINK BACKPRESSURE CERTIFIER (V1.2)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-INFLUX
 * RESPONSABILIDAD: EL SUMIDERO JAMÁS BLOQUEA A LOS PRODUCTORES
 *
 * Con el almacén artificialmente atascado, los productores siguen
 * encolando sin esperar: el canal retiene su capacidad y el resto se
 * descarta con contabilidad. Al recuperarse el almacén, el volcador
 * entrega lo retenido sin pérdidas adicionales.
 * =================================================================
 */

use argos_infra_influx::{InfluxError, MetricsSink, SinkTuning, StoreUplink};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Almacén guionizado con compuerta de atasco.
struct StallableStore {
    stalled: AtomicBool,
    recorded_bodies: Mutex<Vec<String>>,
}

impl StallableStore {
    fn new(stalled: bool) -> Arc<Self> {
        Arc::new(Self {
            stalled: AtomicBool::new(stalled),
            recorded_bodies: Mutex::new(Vec::new()),
        })
    }

    fn release(&self) {
        self.stalled.store(false, Ordering::SeqCst);
    }

    fn total_lines(&self) -> usize {
        self.recorded_bodies
            .lock()
            .expect("test lock")
            .iter()
            .map(|body| body.lines().count())
            .sum()
    }
}

#[async_trait]
impl StoreUplink for StallableStore {
    async fn write_lines(&self, _bucket: &str, body: String) -> Result<(), InfluxError> {
        while self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        self.recorded_bodies.lock().expect("test lock").push(body);
        Ok(())
    }

    async fn is_reachable(&self) -> bool {
        !self.stalled.load(Ordering::SeqCst)
    }
}

/**
 * CERTIFICACIÓN: Ráfaga de 40 puntos contra un almacén atascado.
 * Capacidad del canal = max(2 x lote, 16) = 16: los primeros 16 se
 * retienen, los 24 restantes se descartan sin bloquear; tras liberar
 * el almacén, los 16 retenidos llegan íntegros y en orden.
 */
#[tokio::test(start_paused = true)]
async fn certify_burst_against_stalled_store_drops_without_blocking() {
    println!("\n🧪 [PROVING_GROUNDS]: Initiating stalled-store backpressure audit...");

    let store = StallableStore::new(true);
    let sink = MetricsSink::new(
        store.clone(),
        SinkTuning {
            batch_size: 8,
            flush_interval: Duration::from_secs(10),
            primary_bucket: "telemetry".to_string(),
            health_bucket: "health".to_string(),
        },
    );

    // Ráfaga síncrona: ningún punto de espera entre encolados.
    for sequence in 1..=40 {
        sink.write_probe_result("10.0.0.1", sequence as f64, true, false, Utc::now());
    }

    assert_eq!(sink.dropped_points(), 24, "exactly the overflow is dropped");

    // El almacén se recupera; el cierre drena y entrega lo retenido.
    store.release();
    sink.close().await;

    assert_eq!(store.total_lines(), 16);
    assert_eq!(sink.failed_batches(), 0, "recovery before retry exhaustion");

    println!("   ✅ Producers never blocked; retained points delivered.");
}

/**
 * CERTIFICACIÓN: El descarte es del punto nuevo, nunca de los
 * retenidos: los primeros en encolar son los que sobreviven.
 */
#[tokio::test(start_paused = true)]
async fn certify_retained_points_are_the_earliest_enqueued() {
    let store = StallableStore::new(true);
    let sink = MetricsSink::new(
        store.clone(),
        SinkTuning {
            batch_size: 8,
            flush_interval: Duration::from_secs(10),
            primary_bucket: "telemetry".to_string(),
            health_bucket: "health".to_string(),
        },
    );

    for sequence in 1..=20 {
        sink.write_probe_result("10.0.0.1", sequence as f64, true, false, Utc::now());
    }

    store.release();
    sink.close().await;

    let recorded = store.recorded_bodies.lock().expect("test lock").join("\n");
    let lines: Vec<&str> = recorded.lines().collect();

    assert_eq!(lines.len(), 16);
    for (index, line) in lines.iter().enumerate() {
        assert!(
            line.contains(&format!("rtt_ms={}", index + 1)),
            "ORDER_BREACH: line {} was {}",
            index,
            line
        );
    }
}
