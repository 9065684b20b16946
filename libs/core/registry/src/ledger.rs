// [libs/core/registry/src/ledger.rs]
/*!
 * =================================================================
 * APARATO: RECENCY LEDGER (V5.1 - INDEXED HEAP)
 * CLASIFICACIÓN: CORE INTERNAL (ESTRATO L1)
 * RESPONSABILIDAD: MAPA DE DISPOSITIVOS + MONTÍCULO MÍNIMO INDEXADO
 *
 * # Mathematical Proof (Heap Symmetry):
 * Invariante: para todo dispositivo d, recency_heap[d.heap_slot] == d.ip,
 * y el conjunto de claves del mapa es idéntico al contenido del montículo.
 * Toda mutación pasa por heap_swap, que restaura los back-pointers en el
 * mismo paso en que permuta los mangos, por lo que el invariante se
 * conserva por inducción sobre las operaciones.
 * =================================================================
 */

use std::collections::HashMap;
use tokio::time::Instant;

/// Ficha interna de un dispositivo registrado.
#[derive(Debug, Clone)]
pub(crate) struct DeviceSlot {
    /// Último sysName conocido; degrada a la propia IP.
    pub hostname: String,
    /// Último sysDescr conocido.
    pub sys_descr: String,
    /// Última sonda exitosa o inserción inicial.
    pub last_seen: Instant,
    /// Fallos de sonda consecutivos.
    pub consecutive_fails: u32,
    /// Suspensión del breaker; activa si el instante es futuro.
    pub suspended_until: Option<Instant>,
    /// Back-pointer hacia su posición en el montículo de recencia.
    pub heap_slot: usize,
}

/// Mapa autoritativo + montículo mínimo de recencia con back-pointers.
#[derive(Debug, Default)]
pub(crate) struct RecencyLedger {
    pub devices: HashMap<String, DeviceSlot>,
    pub recency_heap: Vec<String>,
}

impl RecencyLedger {
    /// Marca temporal del mango en la posición dada del montículo.
    fn slot_timestamp(&self, heap_index: usize) -> Instant {
        let device_ip = &self.recency_heap[heap_index];
        self.devices
            .get(device_ip)
            .expect("HEAP_DESYNC: orphan handle inside recency heap")
            .last_seen
    }

    /// Permuta dos mangos y restaura sus back-pointers en el mismo paso.
    fn heap_swap(&mut self, first: usize, second: usize) {
        self.recency_heap.swap(first, second);

        for restored_index in [first, second] {
            let device_ip = self.recency_heap[restored_index].clone();
            self.devices
                .get_mut(&device_ip)
                .expect("HEAP_DESYNC: orphan handle inside recency heap")
                .heap_slot = restored_index;
        }
    }

    fn sift_up(&mut self, mut heap_index: usize) {
        while heap_index > 0 {
            let parent_index = (heap_index - 1) / 2;
            if self.slot_timestamp(heap_index) < self.slot_timestamp(parent_index) {
                self.heap_swap(heap_index, parent_index);
                heap_index = parent_index;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut heap_index: usize) {
        loop {
            let left_child = 2 * heap_index + 1;
            let right_child = left_child + 1;
            let mut smallest = heap_index;

            if left_child < self.recency_heap.len()
                && self.slot_timestamp(left_child) < self.slot_timestamp(smallest)
            {
                smallest = left_child;
            }
            if right_child < self.recency_heap.len()
                && self.slot_timestamp(right_child) < self.slot_timestamp(smallest)
            {
                smallest = right_child;
            }

            if smallest == heap_index {
                break;
            }

            self.heap_swap(heap_index, smallest);
            heap_index = smallest;
        }
    }

    /// Restaura el orden del montículo en torno a una posición mutada.
    fn heap_fix(&mut self, heap_index: usize) {
        self.sift_up(heap_index);
        self.sift_down(heap_index);
    }

    /// Inserta un dispositivo nuevo, posicionándolo en el montículo.
    pub fn insert(&mut self, device_ip: String, mut slot: DeviceSlot) {
        slot.heap_slot = self.recency_heap.len();
        self.recency_heap.push(device_ip.clone());
        self.devices.insert(device_ip, slot);
        let tail_index = self.recency_heap.len() - 1;
        self.sift_up(tail_index);
    }

    /// Actualiza 'last_seen' y re-posiciona el mango en O(log n).
    pub fn refresh_timestamp(&mut self, device_ip: &str, now: Instant) -> bool {
        let heap_index = match self.devices.get_mut(device_ip) {
            Some(slot) => {
                slot.last_seen = now;
                slot.heap_slot
            }
            None => return false,
        };

        self.heap_fix(heap_index);
        true
    }

    /// Extrae la raíz: el dispositivo con el 'last_seen' más antiguo.
    pub fn evict_oldest(&mut self) -> Option<(String, DeviceSlot)> {
        if self.recency_heap.is_empty() {
            return None;
        }

        let tail_index = self.recency_heap.len() - 1;
        self.heap_swap(0, tail_index);

        let evicted_ip = self.recency_heap.pop().expect("HEAP_DESYNC: pop after swap");
        let evicted_slot = self.devices.remove(&evicted_ip).expect("HEAP_DESYNC: unmapped handle");

        if !self.recency_heap.is_empty() {
            self.sift_down(0);
        }

        Some((evicted_ip, evicted_slot))
    }

    /// Extrae un dispositivo arbitrario preservando el orden del montículo.
    pub fn remove(&mut self, device_ip: &str) -> Option<DeviceSlot> {
        let heap_index = self.devices.get(device_ip)?.heap_slot;
        let tail_index = self.recency_heap.len() - 1;

        if heap_index != tail_index {
            self.heap_swap(heap_index, tail_index);
        }

        self.recency_heap.pop();
        let removed_slot = self.devices.remove(device_ip).expect("HEAP_DESYNC: unmapped handle");

        if heap_index < self.recency_heap.len() {
            self.heap_fix(heap_index);
        }

        Some(removed_slot)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Certifica la simetría mapa/montículo (solo Proving Grounds).
    #[cfg(test)]
    pub fn assert_symmetry(&self) {
        assert_eq!(self.devices.len(), self.recency_heap.len(), "SYMMETRY_BREACH: cardinality");

        for (heap_index, device_ip) in self.recency_heap.iter().enumerate() {
            let slot = self.devices.get(device_ip).expect("SYMMETRY_BREACH: orphan handle");
            assert_eq!(slot.heap_slot, heap_index, "SYMMETRY_BREACH: stale back-pointer");

            if heap_index > 0 {
                let parent_index = (heap_index - 1) / 2;
                assert!(
                    self.slot_timestamp(parent_index) <= self.slot_timestamp(heap_index),
                    "SYMMETRY_BREACH: heap order violated at {}",
                    heap_index
                );
            }
        }
    }
}
