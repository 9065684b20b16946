// [apps/sentinel/src/state/registers.rs]
/*!
 * =================================================================
 * APARATO: PROBE ACTIVITY REGISTERS (V9.0 - ATOMIC GAUGES)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: CONTADORES ATÓMICOS DE ACTIVIDAD DE SONDEO
 *
 * 'active_pingers' canónico = sondas en vuelo en este instante; la
 * ventana en vuelo es un guard RAII para que el decremento sobreviva
 * a cualquier salida del cuerpo de la sonda.
 * =================================================================
 */

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Gauges atómicos compartidos por probers, reportero y superficie HTTP.
#[derive(Debug, Default)]
pub struct ProbeRegisters {
    inflight_probes: AtomicI64,
    pings_sent_total: AtomicU64,
    store_reachable: AtomicBool,
}

impl ProbeRegisters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abre una ventana en vuelo; el cierre ocurre al soltar el guard.
    pub fn open_inflight_window(&self) -> InflightWindow<'_> {
        self.inflight_probes.fetch_add(1, Ordering::SeqCst);
        InflightWindow { registers: self }
    }

    pub fn inflight(&self) -> i64 {
        self.inflight_probes.load(Ordering::SeqCst)
    }

    pub fn record_ping_sent(&self) {
        self.pings_sent_total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn pings_sent(&self) -> u64 {
        self.pings_sent_total.load(Ordering::SeqCst)
    }

    pub fn set_store_reachable(&self, reachable: bool) {
        self.store_reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn store_reachable(&self) -> bool {
        self.store_reachable.load(Ordering::SeqCst)
    }
}

/// Guard RAII de una sonda en vuelo.
pub struct InflightWindow<'a> {
    registers: &'a ProbeRegisters,
}

impl Drop for InflightWindow<'_> {
    fn drop(&mut self) {
        self.registers.inflight_probes.fetch_sub(1, Ordering::SeqCst);
    }
}
