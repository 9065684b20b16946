// [apps/sentinel/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: SERVICES MODULE ROOT (V9.0)
 * CLASIFICACIÓN: BACKGROUND SERVICES (ESTRATO L1-APP)
 * RESPONSABILIDAD: DAEMONS DEL PLANO DE CONTROL DEL CENTINELA
 * =================================================================
 */

/// Barridos periódicos de descubrimiento y altas en el registro.
pub mod discovery;
/// Enriquecimiento SNMP one-shot y continuo con breaker propio.
pub mod enricher;
/// Bucle de sondeo ICMP perpetuo por dispositivo.
pub mod prober;
/// Poda horaria de dispositivos silenciosos.
pub mod pruner;
/// Supervisor reconciliador: exactamente una tarea por dispositivo.
pub mod supervisor;
/// Auto-observación periódica y caché de alcanzabilidad del almacén.
pub mod vital_signs;
