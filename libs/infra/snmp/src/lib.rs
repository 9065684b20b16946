// [libs/infra/snmp/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SNMP IDENTITY ADAPTER ROOT (V4.2 - FALLBACK MANDATE)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LECTURA DE IDENTIDAD DE SISTEMA SNMPv2c
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FALLBACK MANDATE: Toda lectura intenta GET sobre la instancia
 *    '.0'; ante noSuchInstance/noSuchObject/endOfMib o cualquier otro
 *    fallo, reintenta con GETNEXT sobre el prefijo y acepta la primera
 *    respuesta cuyo OID permanezca dentro del subárbol solicitado.
 *    Hay agentes embebidos que solo responden a una de las dos formas.
 * 2. HOSTILE OCTETS: Los valores llegan como texto u octet strings;
 *    ambos degradan a UTF-8 con reemplazo y se desinfectan a 1024
 *    caracteres en la decodificación (el registro aplica su propio
 *    límite de 500 al almacenar).
 * 3. TRANSPORT SEAM: El protocolo vive tras el contrato
 *    'SnmpTransport'; la implementación csnmp queda aislada en un
 *    único módulo y los Proving Grounds inyectan dobles guionizados.
 * =================================================================
 */

/// Lector de identidad con fallback y presupuesto de reintentos.
pub mod fetcher;

/// Transporte de producción sobre csnmp (UDP asíncrono).
pub mod transport;

pub use crate::fetcher::{SystemIdentity, SystemIdentityFetcher};
pub use crate::transport::CsnmpTransport;

use argos_domain_models::sanitize_lossy_bytes;
use async_trait::async_trait;
use thiserror::Error;

/// OID de instancia de sysName (RFC 1213).
pub const SYS_NAME_INSTANCE_OID: &str = "1.3.6.1.2.1.1.5.0";
/// Subárbol de sysName para el fallback GETNEXT.
pub const SYS_NAME_SUBTREE_OID: &str = "1.3.6.1.2.1.1.5";
/// OID de instancia de sysDescr (RFC 1213).
pub const SYS_DESCR_INSTANCE_OID: &str = "1.3.6.1.2.1.1.1.0";
/// Subárbol de sysDescr para el fallback GETNEXT.
pub const SYS_DESCR_SUBTREE_OID: &str = "1.3.6.1.2.1.1.1";

/// Tope de caracteres aplicado en el momento de decodificación.
pub const DECODE_SANITIZE_LIMIT_CHARS: usize = 1024;

/// Valor SNMP ya desencapsulado del transporte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    /// Cadena de texto declarada por el agente.
    Text(String),
    /// Octet string crudo (potencialmente no UTF-8).
    Octets(Vec<u8>),
    /// Escalar entero.
    Integer(i64),
    /// Cualquier otro tipo, preservado como representación de depuración.
    Other(String),
}

impl SnmpValue {
    /// Decodifica el valor a una cadena desinfectada (tope de 1024).
    pub fn decode_sanitized(&self) -> String {
        match self {
            SnmpValue::Text(text) => sanitize_lossy_bytes(text.as_bytes(), DECODE_SANITIZE_LIMIT_CHARS),
            SnmpValue::Octets(bytes) => sanitize_lossy_bytes(bytes, DECODE_SANITIZE_LIMIT_CHARS),
            SnmpValue::Integer(scalar) => scalar.to_string(),
            SnmpValue::Other(repr) => sanitize_lossy_bytes(repr.as_bytes(), DECODE_SANITIZE_LIMIT_CHARS),
        }
    }
}

#[derive(Error, Debug)]
pub enum SnmpFault {
    #[error("SNMP_SESSION_FAULT: Unable to open SNMP session: {0}")]
    SessionInit(String),

    #[error("SNMP_OID_MALFORMED: '{0}' is not a valid OID")]
    MalformedOid(String),

    #[error("SNMP_REQUEST_FAULT: Agent did not answer: {0}")]
    RequestFailed(String),

    #[error("SNMP_SUBTREE_MISS: GETNEXT answered with OID '{answered}' outside subtree '{requested}'")]
    OutsideSubtree { requested: String, answered: String },
}

/**
 * Contrato de transporte SNMPv2c: exactamente las dos primitivas que
 * exige el helper de fallback.
 */
#[async_trait]
pub trait SnmpTransport: Send + Sync {
    /// GET sobre un OID de instancia completamente cualificado.
    async fn get(&self, oid_text: &str) -> Result<SnmpValue, SnmpFault>;

    /// GETNEXT: retorna el OID respondido y su valor.
    async fn get_next(&self, oid_text: &str) -> Result<(String, SnmpValue), SnmpFault>;
}
