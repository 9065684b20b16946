// [libs/core/registry/src/manager.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN DEVICE REGISTRY (V5.3 - ATOMIC GAUGE)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: CONJUNTO AUTORITATIVO, BREAKER Y DESALOJO LRU
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ATOMIC GAUGE: El total de suspensiones se mantiene en un contador
 *    atómico actualizado solo en las transiciones de estado; la lectura
 *    es O(1) y no compite por el cerrojo del registro.
 * 2. BOUNDED DRIFT: Las suspensiones expiradas por el paso del tiempo
 *    no se reflejan hasta la siguiente operación que transicione estado;
 *    'get_suspended_count_exact' existe para auditorías.
 * 3. LRU EVICTION: Al superar la capacidad, cae el dispositivo con el
 *    'last_seen' más antiguo (raíz del montículo indexado).
 *
 * # Mathematical Proof (Gauge Coherence):
 * El gauge cuenta dispositivos con 'suspended_until' poblado. Toda
 * operación que puebla el campo desde None incrementa; toda operación
 * que lo vacía o destruye el dispositivo decrementa. Inmediatamente
 * después de cualquier transición, gauge == |{d : d.suspended_until
 * estrictamente futuro}|; entre transiciones solo puede sobre-reportar,
 * acotado por las suspensiones expiradas pasivamente.
 * =================================================================
 */

use crate::ledger::{DeviceSlot, RecencyLedger};
use argos_domain_models::device::DEVICE_STRING_STORAGE_LIMIT_CHARS;
use argos_domain_models::{sanitize_display_string, DeviceIdentity};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Veredicto de una solicitud de alta en el registro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// El dispositivo no existía y fue creado.
    New,
    /// El dispositivo ya estaba registrado; alta sin efecto.
    Existing,
}

/**
 * Registro soberano de dispositivos (Thread-Safe).
 *
 * Lectores concurrentes, escritores exclusivos. El gauge de suspensiones
 * vive fuera del cerrojo como entero atómico.
 */
pub struct DeviceRegistry {
    ledger: RwLock<RecencyLedger>,
    suspended_gauge: AtomicI64,
    max_devices: usize,
}

impl DeviceRegistry {
    #[must_use]
    pub fn new(max_devices: usize) -> Self {
        Self {
            ledger: RwLock::new(RecencyLedger::default()),
            suspended_gauge: AtomicI64::new(0),
            max_devices: max_devices.max(1),
        }
    }

    /**
     * Da de alta un dispositivo, desalojando por LRU si la capacidad
     * está agotada. Un alta sobre un dispositivo existente no altera
     * su 'last_seen'.
     */
    pub fn add_device(&self, device_ip: &str) -> AdmissionOutcome {
        let mut ledger_guard = self.ledger.write().expect("LOCK_POISONED: registry ledger");

        if ledger_guard.devices.contains_key(device_ip) {
            return AdmissionOutcome::Existing;
        }

        // Desalojo LRU: cae la raíz del montículo (el 'last_seen' más antiguo).
        while ledger_guard.len() >= self.max_devices {
            if let Some((evicted_ip, evicted_slot)) = ledger_guard.evict_oldest() {
                if evicted_slot.suspended_until.is_some() {
                    self.suspended_gauge.fetch_sub(1, Ordering::SeqCst);
                }
                info!("📤 [REGISTRY_EVICTION]: Capacity reached. Oldest device [{}] evicted.", evicted_ip);
            } else {
                break;
            }
        }

        ledger_guard.insert(
            device_ip.to_string(),
            DeviceSlot {
                hostname: device_ip.to_string(),
                sys_descr: String::new(),
                last_seen: Instant::now(),
                consecutive_fails: 0,
                suspended_until: None,
                heap_slot: 0,
            },
        );

        debug!("📥 [REGISTRY_ADMISSION]: Device [{}] registered.", device_ip);
        AdmissionOutcome::New
    }

    /**
     * Fusiona los metadatos SNMP desinfectándolos en el momento de
     * almacenamiento. No altera 'last_seen'.
     */
    pub fn update_snmp(&self, device_ip: &str, hostname: &str, sys_descr: &str) {
        let clean_hostname = sanitize_display_string(hostname, DEVICE_STRING_STORAGE_LIMIT_CHARS);
        let clean_description = sanitize_display_string(sys_descr, DEVICE_STRING_STORAGE_LIMIT_CHARS);

        let mut ledger_guard = self.ledger.write().expect("LOCK_POISONED: registry ledger");

        match ledger_guard.devices.get_mut(device_ip) {
            Some(slot) => {
                slot.hostname = if clean_hostname.is_empty() {
                    device_ip.to_string()
                } else {
                    clean_hostname
                };
                slot.sys_descr = clean_description;
            }
            None => {
                debug!("👻 [REGISTRY_MISS]: SNMP merge for unknown device [{}] ignored.", device_ip);
            }
        }
    }

    /// Refresca 'last_seen' y re-posiciona el mango en el montículo.
    pub fn update_last_seen(&self, device_ip: &str) {
        let mut ledger_guard = self.ledger.write().expect("LOCK_POISONED: registry ledger");

        if !ledger_guard.refresh_timestamp(device_ip, Instant::now()) {
            debug!("👻 [REGISTRY_MISS]: Timestamp refresh for unknown device [{}] ignored.", device_ip);
        }
    }

    /**
     * Registra una sonda exitosa: limpia la suspensión (reconciliando el
     * gauge), resetea los fallos consecutivos y refresca 'last_seen'.
     */
    pub fn report_success(&self, device_ip: &str) {
        let mut ledger_guard = self.ledger.write().expect("LOCK_POISONED: registry ledger");

        match ledger_guard.devices.get_mut(device_ip) {
            Some(slot) => {
                if slot.suspended_until.take().is_some() {
                    self.suspended_gauge.fetch_sub(1, Ordering::SeqCst);
                }
                slot.consecutive_fails = 0;
            }
            None => {
                debug!("👻 [REGISTRY_MISS]: Success report for unknown device [{}] ignored.", device_ip);
                return;
            }
        }

        ledger_guard.refresh_timestamp(device_ip, Instant::now());
    }

    /**
     * Registra un fallo de sonda. Al alcanzar 'max_fails' consecutivos
     * dispara el breaker y retorna true. No altera 'last_seen'.
     */
    pub fn report_fail(&self, device_ip: &str, max_fails: u32, backoff: Duration) -> bool {
        let mut ledger_guard = self.ledger.write().expect("LOCK_POISONED: registry ledger");

        let Some(slot) = ledger_guard.devices.get_mut(device_ip) else {
            debug!("👻 [REGISTRY_MISS]: Failure report for unknown device [{}] ignored.", device_ip);
            return false;
        };

        slot.consecutive_fails = slot.consecutive_fails.saturating_add(1);

        if slot.consecutive_fails >= max_fails.max(1) {
            let newly_suspended = slot.suspended_until.is_none();
            slot.suspended_until = Some(Instant::now() + backoff);

            if newly_suspended {
                self.suspended_gauge.fetch_add(1, Ordering::SeqCst);
            }

            return true;
        }

        false
    }

    /// True si y solo si la suspensión existe y es estrictamente futura.
    pub fn is_suspended(&self, device_ip: &str) -> bool {
        let ledger_guard = self.ledger.read().expect("LOCK_POISONED: registry ledger");
        let now = Instant::now();

        ledger_guard
            .devices
            .get(device_ip)
            .map(|slot| matches!(slot.suspended_until, Some(deadline) if deadline > now))
            .unwrap_or(false)
    }

    /// Instantánea inmutable del conjunto de IPs registradas.
    pub fn get_all_ips(&self) -> Vec<String> {
        let ledger_guard = self.ledger.read().expect("LOCK_POISONED: registry ledger");
        ledger_guard.devices.keys().cloned().collect()
    }

    /// Identidad pública del dispositivo, si está registrado.
    pub fn get_device(&self, device_ip: &str) -> Option<DeviceIdentity> {
        let ledger_guard = self.ledger.read().expect("LOCK_POISONED: registry ledger");

        ledger_guard.devices.get(device_ip).map(|slot| DeviceIdentity {
            ip: device_ip.to_string(),
            hostname: slot.hostname.clone(),
            sys_descr: slot.sys_descr.clone(),
        })
    }

    /**
     * Poda los dispositivos cuyo silencio supera el umbral, retornando
     * las identidades desalojadas. Reconcilia el gauge para cada
     * dispositivo podado que siguiera marcado como suspendido.
     */
    pub fn prune_stale(&self, stale_threshold: Duration) -> Vec<DeviceIdentity> {
        let mut ledger_guard = self.ledger.write().expect("LOCK_POISONED: registry ledger");
        let now = Instant::now();

        let stale_ips: Vec<String> = ledger_guard
            .devices
            .iter()
            .filter(|(_, slot)| now.saturating_duration_since(slot.last_seen) > stale_threshold)
            .map(|(device_ip, _)| device_ip.clone())
            .collect();

        let mut pruned_identities = Vec::with_capacity(stale_ips.len());

        for device_ip in stale_ips {
            if let Some(removed_slot) = ledger_guard.remove(&device_ip) {
                if removed_slot.suspended_until.is_some() {
                    self.suspended_gauge.fetch_sub(1, Ordering::SeqCst);
                }

                debug!("🧹 [REGISTRY_PRUNE]: Stale device [{}] removed.", device_ip);

                pruned_identities.push(DeviceIdentity {
                    ip: device_ip,
                    hostname: removed_slot.hostname,
                    sys_descr: removed_slot.sys_descr,
                });
            }
        }

        pruned_identities
    }

    /// Lectura O(1) del gauge de suspensiones (deriva acotada documentada).
    pub fn get_suspended_count(&self) -> i64 {
        self.suspended_gauge.load(Ordering::SeqCst).max(0)
    }

    /// Conteo exacto por barrido completo (solo auditorías).
    pub fn get_suspended_count_exact(&self) -> i64 {
        let ledger_guard = self.ledger.read().expect("LOCK_POISONED: registry ledger");
        let now = Instant::now();

        ledger_guard
            .devices
            .values()
            .filter(|slot| matches!(slot.suspended_until, Some(deadline) if deadline > now))
            .count() as i64
    }

    pub fn count(&self) -> usize {
        let ledger_guard = self.ledger.read().expect("LOCK_POISONED: registry ledger");
        ledger_guard.len()
    }

    /// Certifica la simetría interna mapa/montículo (solo Proving Grounds).
    #[cfg(test)]
    pub(crate) fn assert_internal_symmetry(&self) {
        let ledger_guard = self.ledger.read().expect("LOCK_POISONED: registry ledger");
        ledger_guard.assert_symmetry();
    }
}
