// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS ROOT (V3.1 - SENTINEL GOLD)
 * CLASIFICACIÓN: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE DATOS DEL ECOSISTEMA ARGOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE SOURCE OF TRUTH: Todos los estratos (registro, sondas,
 *    sumidero y superficie HTTP) comparten estas definiciones.
 * 2. HOSTILE INPUT SHIELD: El sanitizador de cadenas se define aquí
 *    para que la desinfección ocurra en el momento de almacenamiento,
 *    nunca aguas abajo.
 * =================================================================
 */

/// Identidad y metadatos de un dispositivo descubierto en la red.
pub mod device;

/// Desinfección de cadenas hostiles (SNMP y afines).
pub mod sanitize;

/// Reportes de signos vitales y contrato JSON de la superficie de salud.
pub mod telemetry;

pub use crate::device::DeviceIdentity;
pub use crate::sanitize::{sanitize_display_string, sanitize_lossy_bytes};
pub use crate::telemetry::{HealthPayload, VitalSignsReport};
