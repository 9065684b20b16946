// [libs/domain/models/src/device.rs]

use serde::{Deserialize, Serialize};

/// Límite duro de almacenamiento para cadenas descriptivas de dispositivo.
pub const DEVICE_STRING_STORAGE_LIMIT_CHARS: usize = 500;

/**
 * Identidad pública de un dispositivo monitorizado.
 *
 * La clave canónica es la dirección IPv4 en notación decimal con puntos.
 * El 'hostname' degrada a la propia IP cuando el enriquecimiento SNMP
 * todavía no ha aportado un sysName.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    #[serde(rename = "ip_address")]
    pub ip: String,

    #[serde(rename = "hostname_identity")]
    pub hostname: String,

    #[serde(rename = "system_description")]
    pub sys_descr: String,
}

impl DeviceIdentity {
    /// Construye la identidad mínima de un dispositivo recién descubierto.
    pub fn unenriched(ip_address: &str) -> Self {
        Self {
            ip: ip_address.to_string(),
            hostname: ip_address.to_string(),
            sys_descr: String::new(),
        }
    }
}
