// [tests/mirror/libs/core/registry/registry_breaker.test.rs]
/**
 * =================================================================
 * APARATO: REGISTRY BREAKER CERTIFIER (V1.1 - VIRTUAL CLOCK)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-REGISTRY
 * RESPONSABILIDAD: CIRCUIT BREAKER Y GAUGE ATÓMICO DE SUSPENSIONES
 *
 * El reloj pausado del runtime gobierna la expiración: las leyes de
 * deriva acotada se certifican sin dormir tiempo real.
 * =================================================================
 */

use argos_core_registry::DeviceRegistry;
use std::time::Duration;

/**
 * CERTIFICACIÓN: Ida y vuelta del breaker con K=3.
 * Exactamente K fallos consecutivos disparan la suspensión; un único
 * éxito la limpia y resetea el contador de fallos.
 */
#[tokio::test(start_paused = true)]
async fn certify_breaker_round_trip_at_threshold() {
    println!("\n🧪 [PROVING_GROUNDS]: Initiating breaker round-trip audit...");

    let registry = DeviceRegistry::new(8);
    registry.add_device("10.0.0.9");

    let backoff = Duration::from_secs(60);

    assert!(!registry.report_fail("10.0.0.9", 3, backoff));
    assert!(!registry.report_fail("10.0.0.9", 3, backoff));
    assert!(!registry.is_suspended("10.0.0.9"));

    assert!(registry.report_fail("10.0.0.9", 3, backoff), "third failure must trip");
    assert!(registry.is_suspended("10.0.0.9"));
    assert_eq!(registry.get_suspended_count(), 1);
    assert_eq!(registry.get_suspended_count_exact(), 1);

    registry.report_success("10.0.0.9");
    assert!(!registry.is_suspended("10.0.0.9"));
    assert_eq!(registry.get_suspended_count(), 0);
    assert_eq!(registry.get_suspended_count_exact(), 0);

    // Tras el reset, hacen falta de nuevo K fallos completos.
    assert!(!registry.report_fail("10.0.0.9", 3, backoff));
    assert!(!registry.report_fail("10.0.0.9", 3, backoff));
    assert!(registry.report_fail("10.0.0.9", 3, backoff));

    println!("   ✅ Breaker trip/clear cycle certified.");
}

/**
 * CERTIFICACIÓN: La expiración pasiva NO muta el gauge hasta la
 * siguiente transición; la deriva es unilateral (sobre-reporte) y la
 * transición siguiente reconcilia ambos conteos.
 */
#[tokio::test(start_paused = true)]
async fn certify_expiry_drift_is_bounded_and_one_sided() {
    let registry = DeviceRegistry::new(8);
    registry.add_device("10.0.0.9");

    assert!(registry.report_fail("10.0.0.9", 1, Duration::from_secs(1)));
    assert_eq!(registry.get_suspended_count(), 1);
    assert!(registry.is_suspended("10.0.0.9"));

    // El reloj virtual supera el backoff sin que nadie toque el registro.
    tokio::time::advance(Duration::from_millis(1500)).await;

    assert!(!registry.is_suspended("10.0.0.9"), "suspension expired on the clock");
    assert_eq!(registry.get_suspended_count(), 1, "cached gauge may over-report");
    assert_eq!(registry.get_suspended_count_exact(), 0, "exact scan sees the expiry");

    // Cualquier transición reconcilia: aquí, un éxito.
    registry.report_success("10.0.0.9");
    assert_eq!(registry.get_suspended_count(), 0);
    assert_eq!(registry.get_suspended_count_exact(), 0);
}

/**
 * CERTIFICACIÓN: Un re-disparo sobre una suspensión expirada no
 * duplica el gauge (transición Some->Some).
 */
#[tokio::test(start_paused = true)]
async fn certify_retrip_over_expired_suspension_keeps_gauge_stable() {
    let registry = DeviceRegistry::new(8);
    registry.add_device("10.0.0.9");

    assert!(registry.report_fail("10.0.0.9", 1, Duration::from_secs(1)));
    tokio::time::advance(Duration::from_secs(2)).await;

    // Expirada pero nunca limpiada: un nuevo fallo re-dispara.
    assert!(registry.report_fail("10.0.0.9", 1, Duration::from_secs(60)));
    assert!(registry.is_suspended("10.0.0.9"));
    assert_eq!(registry.get_suspended_count(), 1);
    assert_eq!(registry.get_suspended_count_exact(), 1);
}

/**
 * CERTIFICACIÓN: El desalojo LRU de un dispositivo suspendido
 * reconcilia el gauge en la misma operación.
 */
#[tokio::test(start_paused = true)]
async fn certify_eviction_of_suspended_device_reconciles_gauge() {
    let registry = DeviceRegistry::new(1);
    registry.add_device("10.0.0.1");
    assert!(registry.report_fail("10.0.0.1", 1, Duration::from_secs(600)));
    assert_eq!(registry.get_suspended_count(), 1);

    // La capacidad 1 fuerza el desalojo del suspendido al admitir otro.
    registry.add_device("10.0.0.2");

    assert_eq!(registry.count(), 1);
    assert_eq!(registry.get_suspended_count(), 0);
    assert_eq!(registry.get_suspended_count_exact(), 0);
}
