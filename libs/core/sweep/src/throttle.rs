// [libs/core/sweep/src/throttle.rs]
/*!
 * =================================================================
 * APARATO: PROBE THROTTLE (V5.0 - TOKEN BUCKET SOBERANO)
 * CLASIFICACIÓN: CORE SCHEDULING (ESTRATO L1)
 * RESPONSABILIDAD: ACELERADOR GLOBAL DE SONDAS CON CANCELACIÓN
 *
 * # Mathematical Proof (Little's Law Guard):
 * Con tasa sostenida r y ráfaga b, ninguna ventana de t segundos emite
 * más de r·t + b sondas. El contador de fichas dispensadas permite a
 * los Proving Grounds certificar que los dispositivos suspendidos
 * jamás consumen presupuesto del bucket.
 * =================================================================
 */

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tasa sostenida mínima admitida (protege la división del periodo).
const MINIMUM_SUSTAINED_RATE_PER_SECOND: f64 = 0.001;

/**
 * Acelerador global de sondas: token bucket con tasa sostenida
 * fraccionaria, ráfaga configurable y adquisición cancelable.
 */
pub struct ProbeThrottle {
    bucket: DefaultDirectRateLimiter,
    dispensed_tokens: AtomicU64,
}

impl ProbeThrottle {
    #[must_use]
    pub fn new(rate_per_second: f64, burst_capacity: u32) -> Self {
        let sustained_period =
            Duration::from_secs_f64(1.0 / rate_per_second.max(MINIMUM_SUSTAINED_RATE_PER_SECOND));

        let quota = Quota::with_period(sustained_period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::new(burst_capacity.max(1)).unwrap_or(NonZeroU32::MIN));

        Self {
            bucket: RateLimiter::direct(quota),
            dispensed_tokens: AtomicU64::new(0),
        }
    }

    /**
     * Adquiere una ficha, esperando si el bucket está seco.
     * Retorna false si la cancelación gana la carrera; en ese caso
     * ninguna ficha queda consumida.
     */
    pub async fn acquire(&self, cancellation: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancellation.cancelled() => false,
            _ = self.bucket.until_ready() => {
                self.dispensed_tokens.fetch_add(1, Ordering::Relaxed);
                true
            }
        }
    }

    /// Fichas dispensadas desde el arranque (instrumentación de auditoría).
    pub fn dispensed(&self) -> u64 {
        self.dispensed_tokens.load(Ordering::Relaxed)
    }
}
