// [apps/sentinel/src/services/supervisor.rs]
/*!
 * =================================================================
 * APARATO: TASK RECONCILER SUPERVISOR (V9.3 - SINGLETON GUARANTEE)
 * CLASIFICACIÓN: CONTROL PLANE SERVICE (ESTRATO L1-APP)
 * RESPONSABILIDAD: EXACTAMENTE UNA TAREA VIVA POR DISPOSITIVO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. HALF-STATE LEDGER: 'stopping' es el medio-estado entre "cancelado"
 *    y "salida confirmada". Un dispositivo re-descubierto durante esa
 *    ventana NO recibe una segunda tarea hasta que la primera confirme
 *    su salida por el canal de balizas.
 * 2. EXIT BEACON: La baliza de salida es un guard de Drop; dispara
 *    incluso si la tarea colapsa por pánico, y el drenador reconstruye
 *    el ledger para que el siguiente tic re-levante al caído.
 * 3. CAPACITY SHIELD: Al alcanzar el tope de tareas en vuelo, las
 *    altas restantes se omiten en ese tic con advertencia.
 * 4. WAIT-GROUP: TaskTracker es el único punto de join; el cierre
 *    cancela, espera a todas las tareas y después apaga el drenador.
 *
 * # Mathematical Proof (No Double Start):
 * El arranque y la parada para una misma IP se serializan bajo el
 * cerrojo del ledger; una IP presente en 'active' ∪ 'stopping' nunca
 * recibe un segundo arranque. La baliza elimina de 'stopping' bajo el
 * mismo cerrojo, por lo que en todo instante existe a lo sumo una
 * tarea viva por dispositivo.
 * =================================================================
 */

use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use argos_core_registry::DeviceRegistry;

/// Ledger de tareas por dispositivo, protegido por un único cerrojo.
#[derive(Default)]
struct ReconcilerLedger {
    /// Tareas vivas: IP -> mango de cancelación.
    active: HashMap<String, CancellationToken>,
    /// Cancelaciones señaladas cuya salida aún no se confirmó.
    stopping: HashSet<String>,
}

/**
 * Supervisor genérico de tareas por dispositivo.
 *
 * Se instancia una vez para los probers ICMP y otra para los pollers
 * SNMP; la fábrica de trabajo se inyecta en cada reconciliación.
 */
pub struct TaskReconciler {
    designation: &'static str,
    max_in_flight: usize,
    root_cancellation: CancellationToken,
    ledger: StdMutex<ReconcilerLedger>,
    exit_beacon_sender: StdMutex<Option<mpsc::UnboundedSender<String>>>,
    tracker: TaskTracker,
    drainer_handle: StdMutex<Option<JoinHandle<()>>>,
}

impl TaskReconciler {
    /// Levanta el supervisor y su drenador de balizas de salida.
    pub fn new(
        designation: &'static str,
        max_in_flight: usize,
        root_cancellation: CancellationToken,
    ) -> Arc<Self> {
        let (exit_beacon_sender, exit_beacon_receiver) = mpsc::unbounded_channel::<String>();

        let reconciler = Arc::new(Self {
            designation,
            max_in_flight: max_in_flight.max(1),
            root_cancellation,
            ledger: StdMutex::new(ReconcilerLedger::default()),
            exit_beacon_sender: StdMutex::new(Some(exit_beacon_sender)),
            tracker: TaskTracker::new(),
            drainer_handle: StdMutex::new(None),
        });

        let drainer_reference = Arc::clone(&reconciler);
        let drainer_handle = tokio::spawn(async move {
            drainer_reference.drain_exit_beacons(exit_beacon_receiver).await;
        });

        *reconciler
            .drainer_handle
            .lock()
            .expect("LOCK_POISONED: drainer handle") = Some(drainer_handle);

        reconciler
    }

    /**
     * Una pasada de reconciliación contra la instantánea deseada.
     *
     * Arranques y paradas se resuelven bajo el cerrojo del ledger; la
     * fábrica produce el futuro de trabajo de cada IP nueva.
     */
    pub fn reconcile<WorkerFactory, WorkerFuture>(
        &self,
        desired_ips: &[String],
        spawn_worker: &WorkerFactory,
    ) where
        WorkerFactory: Fn(String, CancellationToken) -> WorkerFuture,
        WorkerFuture: Future<Output = ()> + Send + 'static,
    {
        if self.tracker.is_closed() {
            return;
        }

        let desired_set: HashSet<&String> = desired_ips.iter().collect();
        let mut ledger_guard = self.ledger.lock().expect("LOCK_POISONED: reconciler ledger");

        // 1. ALTAS: dispositivos deseados sin tarea viva ni en extinción.
        for device_ip in desired_ips {
            if ledger_guard.active.contains_key(device_ip)
                || ledger_guard.stopping.contains(device_ip)
            {
                continue;
            }

            if ledger_guard.active.len() >= self.max_in_flight {
                warn!(
                    "🛡️ [{}_CAP_REACHED]: {} tasks in flight; start of [{}] skipped this tick.",
                    self.designation,
                    ledger_guard.active.len(),
                    device_ip
                );
                continue;
            }

            let worker_cancellation = self.root_cancellation.child_token();
            let worker_future = spawn_worker(device_ip.clone(), worker_cancellation.clone());

            let beacon_sender = self
                .exit_beacon_sender
                .lock()
                .expect("LOCK_POISONED: beacon sender")
                .clone();

            let Some(beacon_sender) = beacon_sender else {
                // El supervisor ya entró en cierre; no se arranca nada nuevo.
                return;
            };

            let beacon_ip = device_ip.clone();
            let designation = self.designation;

            self.tracker.spawn(async move {
                let _exit_beacon = ExitBeacon { device_ip: beacon_ip.clone(), sender: beacon_sender };

                if let Err(panic_payload) = AssertUnwindSafe(worker_future).catch_unwind().await {
                    let panic_analysis = panic_payload
                        .downcast_ref::<&str>()
                        .copied()
                        .map(str::to_string)
                        .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "UNDEFINED_TASK_COLLAPSE_PAYLOAD".to_string());

                    error!(
                        "🔥 [{}_TASK_PANIC]: Worker for [{}] collapsed: {}",
                        designation, beacon_ip, panic_analysis
                    );
                }
            });

            ledger_guard.active.insert(device_ip.clone(), worker_cancellation);
            debug!("🚀 [{}_START]: Worker for [{}] launched.", self.designation, device_ip);
        }

        // 2. BAJAS: tareas vivas cuyo dispositivo salió del registro.
        let departed_ips: Vec<String> = ledger_guard
            .active
            .keys()
            .filter(|active_ip| !desired_set.contains(*active_ip))
            .cloned()
            .collect();

        for device_ip in departed_ips {
            if let Some(worker_cancellation) = ledger_guard.active.remove(&device_ip) {
                worker_cancellation.cancel();
                ledger_guard.stopping.insert(device_ip.clone());
                debug!("🛑 [{}_STOP]: Cancel signalled for [{}].", self.designation, device_ip);
            }
        }
    }

    /// Tareas vivas en este instante.
    pub fn active_count(&self) -> usize {
        self.ledger
            .lock()
            .expect("LOCK_POISONED: reconciler ledger")
            .active
            .len()
    }

    /// IPs cuya cancelación aún no confirmó salida.
    pub fn stopping_count(&self) -> usize {
        self.ledger
            .lock()
            .expect("LOCK_POISONED: reconciler ledger")
            .stopping
            .len()
    }

    /**
     * Cierre ordenado: cancela toda tarea viva, espera el wait-group y
     * después apaga el drenador de balizas.
     */
    pub async fn shutdown(&self) {
        {
            let mut ledger_guard = self.ledger.lock().expect("LOCK_POISONED: reconciler ledger");
            let live_ips: Vec<String> = ledger_guard.active.keys().cloned().collect();

            for device_ip in live_ips {
                if let Some(worker_cancellation) = ledger_guard.active.remove(&device_ip) {
                    worker_cancellation.cancel();
                    ledger_guard.stopping.insert(device_ip);
                }
            }
        }

        self.tracker.close();
        self.tracker.wait().await;

        // Con todas las tareas confirmadas, el canal de balizas se sella
        // para que el drenador procese el remanente y termine.
        let drained_sender = self
            .exit_beacon_sender
            .lock()
            .expect("LOCK_POISONED: beacon sender")
            .take();
        drop(drained_sender);

        let drainer_handle = self
            .drainer_handle
            .lock()
            .expect("LOCK_POISONED: drainer handle")
            .take();

        if let Some(handle) = drainer_handle {
            let _ = handle.await;
        }

        info!("🏁 [{}_SHUTDOWN]: All workers joined; ledger empty.", self.designation);
    }

    async fn drain_exit_beacons(
        self: Arc<Self>,
        mut exit_beacon_receiver: mpsc::UnboundedReceiver<String>,
    ) {
        while let Some(exited_ip) = exit_beacon_receiver.recv().await {
            let mut ledger_guard = self.ledger.lock().expect("LOCK_POISONED: reconciler ledger");

            if ledger_guard.stopping.remove(&exited_ip) {
                debug!("✅ [{}_EXIT]: Worker for [{}] confirmed stop.", self.designation, exited_ip);
            } else if ledger_guard.active.remove(&exited_ip).is_some() {
                // Salida sin cancelación previa: colapso de la tarea. El
                // siguiente tic de reconciliación la reconstruirá.
                warn!(
                    "⚰️ [{}_UNEXPECTED_EXIT]: Worker for [{}] died uncancelled; it will be rebuilt.",
                    self.designation, exited_ip
                );
            }
        }
    }
}

/// Baliza de salida: notifica al drenador incluso ante pánico.
struct ExitBeacon {
    device_ip: String,
    sender: mpsc::UnboundedSender<String>,
}

impl Drop for ExitBeacon {
    fn drop(&mut self) {
        let _ = self.sender.send(std::mem::take(&mut self.device_ip));
    }
}

/**
 * Daemon de reconciliación: cada tic toma la instantánea del registro
 * y la reconcilia contra el ledger de tareas vivas.
 */
pub async fn run_reconciliation_daemon<WorkerFactory, WorkerFuture>(
    reconciler: Arc<TaskReconciler>,
    registry: Arc<DeviceRegistry>,
    tick_period: Duration,
    cancellation: CancellationToken,
    spawn_worker: WorkerFactory,
) where
    WorkerFactory: Fn(String, CancellationToken) -> WorkerFuture + Send + Sync + 'static,
    WorkerFuture: Future<Output = ()> + Send + 'static,
{
    let mut reconciliation_ticker = interval(tick_period);
    reconciliation_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "🧭 [{}_RECONCILER]: Online with {}s cadence.",
        reconciler.designation,
        tick_period.as_secs()
    );

    loop {
        tokio::select! {
            _ = cancellation.cancelled() => break,
            _ = reconciliation_ticker.tick() => {}
        }

        let registry_snapshot = registry.get_all_ips();
        reconciler.reconcile(&registry_snapshot, &spawn_worker);
    }
}
