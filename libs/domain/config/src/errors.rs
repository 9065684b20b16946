// INICIO DEL ARCHIVO [libs/domain/config/src/errors.rs]
//! =================================================================
//! APARATO: CONFIG ERRORS (V4.0 - TRIAGE READY)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE CONFIGURACIÓN
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG_IO_FAULT: Unable to read configuration document: {0}")]
    IoFault(#[from] std::io::Error),

    #[error("CONFIG_PARSE_FAULT: Malformed YAML document: {0}")]
    ParseFault(#[from] serde_yaml::Error),

    #[error("ENV_INTERPOLATION_FAULT: Environment variable '{0}' is not set")]
    MissingEnvironmentVariable(String),

    #[error("ENV_INTERPOLATION_FAULT: Unterminated '${{' interpolation marker")]
    UnterminatedInterpolation,

    #[error("NETWORK_LIST_EMPTY: 'networks' must declare at least one CIDR")]
    EmptyNetworkList,

    #[error("CIDR_INVALID: '{0}' is not a valid IPv4 CIDR")]
    InvalidCidr(String),

    #[error("CIDR_TOO_BROAD: '{0}' is broader than /8 and is rejected")]
    CidrTooBroad(String),

    #[error("INTERVAL_TOO_SHORT: '{field}' must be at least {minimum_seconds}s")]
    IntervalTooShort { field: &'static str, minimum_seconds: u64 },

    #[error("RATE_INVALID: '{field}' must be strictly positive")]
    NonPositiveRate { field: &'static str },

    #[error("URL_WITHOUT_SCHEME: InfluxDB url '{0}' must start with http:// or https://")]
    UrlWithoutScheme(String),

    #[error("SNMP_COMMUNITY_BLANK: 'snmp.community' must not be empty")]
    BlankCommunity,

    #[error("SNMP_PORT_INVALID: 'snmp.port' must be non-zero")]
    InvalidSnmpPort,
}
// FIN DEL ARCHIVO [libs/domain/config/src/errors.rs]
