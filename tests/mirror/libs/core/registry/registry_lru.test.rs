// [tests/mirror/libs/core/registry/registry_lru.test.rs]
/**
 * =================================================================
 * APARATO: REGISTRY LRU CERTIFIER (V1.2)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-REGISTRY
 * RESPONSABILIDAD: DESALOJO LRU Y EQUIVALENCIA DE CONJUNTOS
 * =================================================================
 */

use argos_core_registry::{AdmissionOutcome, DeviceRegistry};
use std::collections::HashSet;
use std::time::Duration;

/// Separación mínima entre marcas temporales de inserción.
fn timestamp_gap() {
    std::thread::sleep(Duration::from_millis(3));
}

/**
 * CERTIFICACIÓN: Escenario canónico de desalojo bajo carga.
 * Con capacidad 2 y tres altas de marca creciente, sobrevive el par
 * más reciente y el snapshot refleja exactamente ese conjunto.
 */
#[test]
fn certify_capacity_two_evicts_the_oldest_admission() {
    println!("\n🧪 [PROVING_GROUNDS]: Initiating LRU eviction audit...");

    let registry = DeviceRegistry::new(2);

    assert_eq!(registry.add_device("10.0.0.1"), AdmissionOutcome::New);
    timestamp_gap();
    assert_eq!(registry.add_device("10.0.0.2"), AdmissionOutcome::New);
    timestamp_gap();
    assert_eq!(registry.add_device("10.0.0.3"), AdmissionOutcome::New);

    let survivors: HashSet<String> = registry.get_all_ips().into_iter().collect();
    let expected: HashSet<String> =
        ["10.0.0.2".to_string(), "10.0.0.3".to_string()].into_iter().collect();

    assert_eq!(survivors, expected);
    assert_eq!(registry.count(), 2);
    assert!(registry.get_device("10.0.0.1").is_none());

    println!("   ✅ Oldest admission evicted; snapshot is exact.");
}

/**
 * CERTIFICACIÓN: N+1 inserciones con marcas estrictamente crecientes.
 * Cae siempre la marca mínima; quedan las N mayores.
 */
#[test]
fn certify_n_plus_one_insertions_drop_the_minimum_timestamp() {
    let capacity = 5;
    let registry = DeviceRegistry::new(capacity);

    for host_octet in 1..=(capacity + 1) {
        registry.add_device(&format!("10.1.0.{}", host_octet));
        timestamp_gap();
    }

    let survivors: HashSet<String> = registry.get_all_ips().into_iter().collect();
    let expected: HashSet<String> =
        (2..=capacity + 1).map(|octet| format!("10.1.0.{}", octet)).collect();

    assert_eq!(survivors, expected);
}

/**
 * CERTIFICACIÓN: Equivalencia de conjuntos bajo churn mixto.
 * Tras altas, refrescos, podas y desalojos, el snapshot y el conteo
 * se mantienen coherentes y la capacidad jamás se supera.
 */
#[test]
fn certify_set_equality_under_mixed_churn() {
    let registry = DeviceRegistry::new(4);

    for wave in 0u8..3 {
        for host_octet in 0u8..8 {
            registry.add_device(&format!("10.2.{}.{}", wave, host_octet));
            registry.update_last_seen(&format!("10.2.{}.{}", wave, host_octet % 4));
        }

        let snapshot = registry.get_all_ips();
        assert_eq!(snapshot.len(), registry.count());
        assert!(snapshot.len() <= 4, "CAPACITY_BREACH: {} devices", snapshot.len());

        let unique: HashSet<String> = snapshot.iter().cloned().collect();
        assert_eq!(unique.len(), snapshot.len(), "DUPLICATE_HANDLE in snapshot");
    }

    // Poda total: umbral cero desaloja todo lo no refrescado en este instante.
    std::thread::sleep(Duration::from_millis(5));
    let pruned = registry.prune_stale(Duration::from_millis(1));
    assert_eq!(registry.count() + pruned.len(), 4);
}
