// [libs/infra/influx/src/sink.rs]
/*!
 * =================================================================
 * APARATO: METRICS SINK (V5.2 - NON BLOCKING MANDATE)
 * CLASIFICACIÓN: INFRASTRUCTURE SERVICE (ESTRATO L3)
 * RESPONSABILIDAD: SUMIDERO POR LOTES CON DESCARTE CONTABILIZADO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NON BLOCKING MANDATE: Los productores encolan con 'try_send';
 *    con el canal lleno el punto se descarta y se advierte con paso
 *    limitado. Perder observaciones dispersas es preferible a frenar
 *    a los probers y degradar la fidelidad de toda la flota.
 * 2. SINGLE FLUSHER: Un único volcador posee el lote local; vuelca por
 *    tamaño o por tic de intervalo, reintenta con backoff 1s/2s/4s y
 *    contabiliza lotes confirmados y descartados.
 * 3. HEALTH BYPASS: Los signos vitales escriben directo al bucket
 *    secundario, fuera del canal de lotes (bajo volumen, baja latencia).
 * 4. DRAIN ON CLOSE: El cierre cancela el volcador, drena el canal y
 *    vuelca el remanente antes de soltar el cliente.
 *
 * # Mathematical Proof (Ordering):
 * El canal es FIFO y existe un único consumidor; dentro del flujo de un
 * productor el orden de encolado se preserva en el lote y el lote se
 * envía íntegro. Entre productores no se garantiza orden alguno.
 * =================================================================
 */

use crate::point::{render_batch, DataPoint};
use crate::StoreUplink;
use argos_domain_models::{DeviceIdentity, VitalSignsReport};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reintentos tras el envío inicial de un lote (backoff 1s, 2s, 4s).
const WRITE_RETRY_BUDGET: u32 = 3;

/// Paso del aviso de desbordamiento: una advertencia por cada tramo.
const DROP_WARNING_STRIDE: u64 = 500;

/// Capacidad mínima del canal de puntos pendientes.
const MINIMUM_CHANNEL_CAPACITY: usize = 16;

/// Sintonía del sumidero.
#[derive(Debug, Clone)]
pub struct SinkTuning {
    pub batch_size: usize,
    pub flush_interval: Duration,
    /// Bucket primario: sondas y metadatos de dispositivo.
    pub primary_bucket: String,
    /// Bucket secundario: signos vitales del propio daemon.
    pub health_bucket: String,
}

/**
 * Sumidero de métricas: fachada no bloqueante para los productores y
 * volcador único hacia el almacén.
 */
pub struct MetricsSink {
    uplink: Arc<dyn StoreUplink>,
    point_sender: mpsc::Sender<DataPoint>,
    flusher_cancellation: CancellationToken,
    flusher_handle: StdMutex<Option<JoinHandle<()>>>,
    successful_batches: Arc<AtomicU64>,
    failed_batches: Arc<AtomicU64>,
    dropped_points: AtomicU64,
    health_bucket: String,
}

impl MetricsSink {
    /// Levanta el sumidero y su volcador de fondo.
    pub fn new(uplink: Arc<dyn StoreUplink>, tuning: SinkTuning) -> Self {
        let channel_capacity = (tuning.batch_size * 2).max(MINIMUM_CHANNEL_CAPACITY);
        let (point_sender, point_receiver) = mpsc::channel(channel_capacity);

        let flusher_cancellation = CancellationToken::new();
        let successful_batches = Arc::new(AtomicU64::new(0));
        let failed_batches = Arc::new(AtomicU64::new(0));

        let flusher = BatchFlusher {
            point_receiver,
            uplink: Arc::clone(&uplink),
            primary_bucket: tuning.primary_bucket.clone(),
            batch_size: tuning.batch_size.max(1),
            flush_interval: tuning.flush_interval,
            cancellation: flusher_cancellation.clone(),
            successful_batches: Arc::clone(&successful_batches),
            failed_batches: Arc::clone(&failed_batches),
        };

        let flusher_handle = tokio::spawn(flusher.run());

        Self {
            uplink,
            point_sender,
            flusher_cancellation,
            flusher_handle: StdMutex::new(Some(flusher_handle)),
            successful_batches,
            failed_batches,
            dropped_points: AtomicU64::new(0),
            health_bucket: tuning.health_bucket,
        }
    }

    /// Encola el resultado de una sonda; la marca temporal es el inicio.
    pub fn write_probe_result(
        &self,
        device_ip: &str,
        rtt_ms: f64,
        success: bool,
        suspended: bool,
        probe_started_at: DateTime<Utc>,
    ) {
        self.try_enqueue(DataPoint::ping_measurement(
            device_ip,
            rtt_ms,
            success,
            suspended,
            probe_started_at,
        ));
    }

    /// Encola los metadatos SNMP de un dispositivo recién sondeado.
    pub fn write_device_info(&self, identity: &DeviceIdentity) {
        self.try_enqueue(DataPoint::device_info_measurement(identity, Utc::now()));
    }

    /**
     * Escribe los signos vitales directo al bucket secundario, fuera
     * del canal de lotes.
     */
    pub async fn write_health_metrics(&self, report: &VitalSignsReport) {
        let line_body = DataPoint::health_measurement(report, Utc::now()).render_line();

        if let Err(health_write_fault) =
            self.uplink.write_lines(&self.health_bucket, line_body).await
        {
            warn!("🩺 [HEALTH_WRITE_FAULT]: Vital signs write failed: {}", health_write_fault);
        }
    }

    /// Sondeo ligero de alcanzabilidad del almacén (ventana corta).
    pub async fn health_check(&self) -> bool {
        self.uplink.is_reachable().await
    }

    /**
     * Cierre ordenado: cancela el volcador, que drena el canal y vuelca
     * el remanente antes de retornar.
     */
    pub async fn close(&self) {
        self.flusher_cancellation.cancel();

        let pending_handle = self
            .flusher_handle
            .lock()
            .expect("LOCK_POISONED: flusher handle")
            .take();

        if let Some(handle) = pending_handle {
            if handle.await.is_err() {
                warn!("💀 [SINK_CLOSE]: Flusher task ended abnormally during drain.");
            }
        }

        info!("🔒 [SINK_CLOSED]: Metrics sink drained and sealed.");
    }

    pub fn successful_batches(&self) -> u64 {
        self.successful_batches.load(Ordering::SeqCst)
    }

    pub fn failed_batches(&self) -> u64 {
        self.failed_batches.load(Ordering::SeqCst)
    }

    pub fn dropped_points(&self) -> u64 {
        self.dropped_points.load(Ordering::SeqCst)
    }

    fn try_enqueue(&self, point: DataPoint) {
        if self.point_sender.try_send(point).is_err() {
            let dropped_so_far = self.dropped_points.fetch_add(1, Ordering::SeqCst) + 1;

            if dropped_so_far % DROP_WARNING_STRIDE == 1 {
                warn!(
                    "🛑 [SINK_OVERFLOW]: Pending channel saturated; {} points dropped so far.",
                    dropped_so_far
                );
            }
        }
    }
}

/// Volcador único: posee el lote local; los productores solo encolan.
struct BatchFlusher {
    point_receiver: mpsc::Receiver<DataPoint>,
    uplink: Arc<dyn StoreUplink>,
    primary_bucket: String,
    batch_size: usize,
    flush_interval: Duration,
    cancellation: CancellationToken,
    successful_batches: Arc<AtomicU64>,
    failed_batches: Arc<AtomicU64>,
}

impl BatchFlusher {
    async fn run(mut self) {
        let mut pending_batch: Vec<DataPoint> = Vec::with_capacity(self.batch_size);
        let mut flush_ticker = interval(self.flush_interval);
        flush_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => {
                    // Drenaje final: todo lo encolado antes del cierre se vuelca.
                    while let Ok(late_point) = self.point_receiver.try_recv() {
                        pending_batch.push(late_point);
                    }
                    self.flush(&mut pending_batch).await;
                    break;
                }

                incoming = self.point_receiver.recv() => {
                    match incoming {
                        Some(point) => {
                            pending_batch.push(point);
                            if pending_batch.len() >= self.batch_size {
                                self.flush(&mut pending_batch).await;
                            }
                        }
                        None => {
                            self.flush(&mut pending_batch).await;
                            break;
                        }
                    }
                }

                _ = flush_ticker.tick() => {
                    if !pending_batch.is_empty() {
                        self.flush(&mut pending_batch).await;
                    }
                }
            }
        }
    }

    /**
     * Envía el lote con reintentos exponenciales. Tras agotar el
     * presupuesto el lote se descarta y queda contabilizado; el
     * volcador sigue vivo para el siguiente.
     */
    async fn flush(&self, pending_batch: &mut Vec<DataPoint>) {
        if pending_batch.is_empty() {
            return;
        }

        let batch = std::mem::take(pending_batch);
        let line_body = render_batch(&batch);
        let mut backoff_window = Duration::from_secs(1);

        for attempt in 0..=WRITE_RETRY_BUDGET {
            match self.uplink.write_lines(&self.primary_bucket, line_body.clone()).await {
                Ok(()) => {
                    self.successful_batches.fetch_add(1, Ordering::SeqCst);
                    debug!("📦 [BATCH_CONFIRMED]: {} points written (attempt {}).", batch.len(), attempt + 1);
                    return;
                }
                Err(write_fault) => {
                    warn!(
                        "⚠️ [BATCH_RETRY]: Attempt {} failed for {} points: {}",
                        attempt + 1,
                        batch.len(),
                        write_fault
                    );

                    if attempt < WRITE_RETRY_BUDGET {
                        tokio::time::sleep(backoff_window).await;
                        backoff_window *= 2;
                    }
                }
            }
        }

        self.failed_batches.fetch_add(1, Ordering::SeqCst);
        warn!("🗑️ [BATCH_DROPPED]: {} points lost after retry exhaustion.", batch.len());
    }
}
