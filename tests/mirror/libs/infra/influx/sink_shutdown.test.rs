// [tests/mirror/libs/infra/influx/sink_shutdown.test.rs]
/**
 * =================================================================
 * APARATO: SINK SHUTDOWN CERTIFIER (V1.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-INFLUX
 * RESPONSABILIDAD: EL CIERRE DRENA TODO PUNTO ENCOLADO
 * =================================================================
 */

use argos_infra_influx::{InfluxError, MetricsSink, SinkTuning, StoreUplink};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Almacén grabador con presupuesto de fallos inyectables.
struct RecordingStore {
    recorded_bodies: Mutex<Vec<String>>,
    failures_to_inject: AtomicU32,
    write_attempts: AtomicU32,
}

impl RecordingStore {
    fn new(failures_to_inject: u32) -> Arc<Self> {
        Arc::new(Self {
            recorded_bodies: Mutex::new(Vec::new()),
            failures_to_inject: AtomicU32::new(failures_to_inject),
            write_attempts: AtomicU32::new(0),
        })
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
impl StoreUplink for RecordingStore {
    async fn write_lines(&self, _bucket: &str, body: String) -> Result<(), InfluxError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failures_to_inject.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_to_inject.store(remaining - 1, Ordering::SeqCst);
            return Err(InfluxError::WriteRejected(500));
        }

        self.recorded_bodies.lock().expect("test lock").push(body);
        Ok(())
    }

    async fn is_reachable(&self) -> bool {
        true
    }
}

fn wide_open_tuning() -> SinkTuning {
    SinkTuning {
        // Lote enorme e intervalo de una hora: solo el cierre puede volcar.
        batch_size: 10_000,
        flush_interval: Duration::from_secs(3600),
        primary_bucket: "telemetry".to_string(),
        health_bucket: "health".to_string(),
    }
}

/**
 * CERTIFICACIÓN: Todo punto encolado antes de 'close()' llega al
 * almacén en el volcado final, sin esperar lote ni tic.
 */
#[tokio::test(start_paused = true)]
async fn certify_close_flushes_every_enqueued_point() {
    println!("\n🧪 [PROVING_GROUNDS]: Initiating drain-on-close audit...");

    let store = RecordingStore::new(0);
    let sink = MetricsSink::new(store.clone(), wide_open_tuning());

    for sequence in 1..=7 {
        sink.write_probe_result("10.0.0.1", sequence as f64, true, false, Utc::now());
    }

    sink.close().await;

    assert_eq!(store.total_lines(), 7);
    assert_eq!(sink.successful_batches(), 1);
    assert_eq!(sink.failed_batches(), 0);
    assert_eq!(sink.dropped_points(), 0);

    println!("   ✅ Final flush delivered the complete backlog.");
}

/// Los puntos emitidos DESPUÉS del cierre se descartan con contabilidad.
#[tokio::test(start_paused = true)]
async fn certify_post_close_writes_are_counted_drops() {
    let store = RecordingStore::new(0);
    let sink = MetricsSink::new(store.clone(), wide_open_tuning());

    sink.close().await;
    sink.write_probe_result("10.0.0.1", 1.0, true, false, Utc::now());

    assert_eq!(store.total_lines(), 0);
    assert_eq!(sink.dropped_points(), 1);
}

/**
 * CERTIFICACIÓN: El volcado final también atraviesa el presupuesto de
 * reintentos antes de rendirse.
 */
#[tokio::test(start_paused = true)]
async fn certify_final_flush_retries_before_surrender() {
    let store = RecordingStore::new(2);
    let sink = MetricsSink::new(store.clone(), wide_open_tuning());

    sink.write_probe_result("10.0.0.1", 1.0, true, false, Utc::now());
    sink.close().await;

    // Dos rechazos inyectados + un éxito final = tres envíos.
    assert_eq!(store.write_attempts.load(Ordering::SeqCst), 3);
    assert_eq!(store.total_lines(), 1);
    assert_eq!(sink.successful_batches(), 1);
    assert_eq!(sink.failed_batches(), 0);
}
