// [libs/domain/config/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN CONFIG DOCUMENT (V4.1 - SENTINEL ALIGNED)
 * CLASIFICACIÓN: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: CARGA, INTERPOLACIÓN Y VALIDACIÓN DE CONFIGURACIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ENV SYNAPSE: Cualquier escalar del documento admite '${VAR}';
 *    la interpolación ocurre sobre el texto crudo antes del parseo y
 *    una variable ausente es un fallo fatal de arranque.
 * 2. HUMAN DURATIONS: Todas las duraciones aceptan notación humana
 *    ('5s', '1h 30m') mediante humantime.
 * 3. LEGACY TOLERANCE: Las claves obsoletas 'discovery_interval' y
 *    'snmp_daily_schedule' se aceptan, se advierten y se ignoran.
 * 4. GUARD RAILS: CIDRs más amplios que /8 se rechazan; /16 o más
 *    amplios solo advierten (el barrido aplica su propio raíl).
 * =================================================================
 */

/// Catálogo de fallos de configuración para el triaje de arranque.
pub mod errors;

pub use crate::errors::ConfigError;

use ipnet::Ipv4Net;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

const MINIMUM_DISCOVERY_INTERVAL_SECONDS: u64 = 60;
const MINIMUM_PING_INTERVAL_SECONDS: u64 = 1;
const MAXIMUM_ICMP_WORKER_POOL: usize = 2000;
const MAXIMUM_SNMP_WORKER_POOL: usize = 1000;

/// Parámetros de sesión SNMPv2c.
#[derive(Debug, Clone, Deserialize)]
pub struct SnmpSection {
    pub community: String,
    pub port: u16,
    #[serde(with = "humantime_serde", default = "default_snmp_timeout")]
    pub timeout: Duration,
    pub retries: u32,
}

/// Endpoint y sintonía de lotes del almacén de series temporales.
#[derive(Debug, Clone, Deserialize)]
pub struct InfluxSection {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    #[serde(default = "default_health_bucket")]
    pub health_bucket: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(with = "humantime_serde", default = "default_flush_interval")]
    pub flush_interval: Duration,
}

/**
 * Documento de configuración completo del centinela.
 *
 * Los campos sin 'default' son obligatorios: su ausencia aborta el
 * arranque con un fallo de parseo explícito.
 */
#[derive(Debug, Clone, Deserialize)]
pub struct SentinelConfig {
    // --- DESCUBRIMIENTO ---
    pub networks: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub icmp_discovery_interval: Duration,
    #[serde(default = "default_icmp_workers")]
    pub icmp_workers: usize,
    #[serde(default = "default_snmp_workers")]
    pub snmp_workers: usize,

    // --- SONDEO CONTINUO ---
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,
    #[serde(with = "humantime_serde", default = "default_ping_timeout")]
    pub ping_timeout: Duration,
    #[serde(default = "default_ping_rate_limit")]
    pub ping_rate_limit: f64,
    #[serde(default = "default_ping_burst_limit")]
    pub ping_burst_limit: u32,
    #[serde(default = "default_ping_max_fails")]
    pub ping_max_consecutive_fails: u32,
    #[serde(with = "humantime_serde", default = "default_ping_backoff")]
    pub ping_backoff_duration: Duration,

    // --- ENRIQUECIMIENTO SNMP ---
    pub snmp: SnmpSection,
    #[serde(with = "humantime_serde", default = "default_snmp_interval")]
    pub snmp_interval: Duration,
    #[serde(default = "default_snmp_rate_limit")]
    pub snmp_rate_limit: f64,
    #[serde(default = "default_snmp_burst_limit")]
    pub snmp_burst_limit: u32,
    #[serde(default = "default_snmp_max_fails")]
    pub snmp_max_consecutive_fails: u32,
    #[serde(with = "humantime_serde", default = "default_snmp_backoff")]
    pub snmp_backoff_duration: Duration,

    // --- ALMACÉN DE SERIES TEMPORALES ---
    pub influxdb: InfluxSection,

    // --- SUPERFICIE DE SALUD ---
    #[serde(default = "default_health_check_port")]
    pub health_check_port: u16,
    #[serde(with = "humantime_serde", default = "default_health_report_interval")]
    pub health_report_interval: Duration,

    // --- TOPES DE RECURSOS ---
    #[serde(default = "default_resource_cap")]
    pub max_concurrent_pingers: usize,
    #[serde(default = "default_resource_cap")]
    pub max_concurrent_snmp_pollers: usize,
    #[serde(default = "default_resource_cap")]
    pub max_devices: usize,
    #[serde(with = "humantime_serde", default = "default_min_scan_interval")]
    pub min_scan_interval: Duration,
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u64,

    // --- CLAVES OBSOLETAS (aceptadas, advertidas, ignoradas) ---
    #[serde(default)]
    pub discovery_interval: Option<String>,
    #[serde(default)]
    pub snmp_daily_schedule: Option<String>,
}

fn default_icmp_workers() -> usize { 64 }
fn default_snmp_workers() -> usize { 32 }
fn default_ping_timeout() -> Duration { Duration::from_secs(3) }
fn default_ping_rate_limit() -> f64 { 64.0 }
fn default_ping_burst_limit() -> u32 { 256 }
fn default_ping_max_fails() -> u32 { 10 }
fn default_ping_backoff() -> Duration { Duration::from_secs(300) }
fn default_snmp_timeout() -> Duration { Duration::from_secs(5) }
fn default_snmp_interval() -> Duration { Duration::from_secs(3600) }
fn default_snmp_rate_limit() -> f64 { 10.0 }
fn default_snmp_burst_limit() -> u32 { 50 }
fn default_snmp_max_fails() -> u32 { 5 }
fn default_snmp_backoff() -> Duration { Duration::from_secs(3600) }
fn default_health_bucket() -> String { "health".to_string() }
fn default_batch_size() -> usize { 5000 }
fn default_flush_interval() -> Duration { Duration::from_secs(5) }
fn default_health_check_port() -> u16 { 8080 }
fn default_health_report_interval() -> Duration { Duration::from_secs(10) }
fn default_resource_cap() -> usize { 20000 }
fn default_min_scan_interval() -> Duration { Duration::from_secs(60) }
fn default_memory_limit_mb() -> u64 { 16384 }

impl SentinelConfig {
    /**
     * Carga el documento desde disco: lectura, interpolación de entorno,
     * parseo YAML y validación exhaustiva, en ese orden.
     *
     * # Errors:
     * Cualquier [`ConfigError`] aquí es fatal para el arranque del daemon.
     */
    pub fn load(document_path: &Path) -> Result<Self, ConfigError> {
        let raw_document = std::fs::read_to_string(document_path)?;
        Self::parse(&raw_document)
    }

    /// Parsea y valida un documento ya leído (punto de entrada de tests).
    pub fn parse(raw_document: &str) -> Result<Self, ConfigError> {
        let rendered_document = interpolate_environment(raw_document)?;
        let mut config: SentinelConfig = serde_yaml::from_str(&rendered_document)?;
        config.validate()?;
        Ok(config)
    }

    /// Lista de redes ya validadas como CIDRs IPv4.
    pub fn parsed_networks(&self) -> Vec<Ipv4Net> {
        self.networks
            .iter()
            .filter_map(|cidr_text| cidr_text.parse::<Ipv4Net>().ok())
            .collect()
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        // 1. REDES: lista obligatoria, CIDRs válidos y nunca más amplios que /8.
        if self.networks.is_empty() {
            return Err(ConfigError::EmptyNetworkList);
        }

        for cidr_text in &self.networks {
            let network: Ipv4Net = cidr_text
                .parse()
                .map_err(|_| ConfigError::InvalidCidr(cidr_text.clone()))?;

            if network.prefix_len() < 8 {
                return Err(ConfigError::CidrTooBroad(cidr_text.clone()));
            }

            if network.prefix_len() <= 16 {
                warn!(
                    "🌐 [CONFIG_GUARD]: Network [{}] spans a /16 or broader; discovery sweeps will be heavy.",
                    cidr_text
                );
            }
        }

        // 2. CADENCIAS MÍNIMAS
        if self.icmp_discovery_interval < Duration::from_secs(MINIMUM_DISCOVERY_INTERVAL_SECONDS) {
            return Err(ConfigError::IntervalTooShort {
                field: "icmp_discovery_interval",
                minimum_seconds: MINIMUM_DISCOVERY_INTERVAL_SECONDS,
            });
        }

        if self.ping_interval < Duration::from_secs(MINIMUM_PING_INTERVAL_SECONDS) {
            return Err(ConfigError::IntervalTooShort {
                field: "ping_interval",
                minimum_seconds: MINIMUM_PING_INTERVAL_SECONDS,
            });
        }

        // 3. TASAS Y POZAS DE TRABAJADORES
        if self.ping_rate_limit <= 0.0 {
            return Err(ConfigError::NonPositiveRate { field: "ping_rate_limit" });
        }
        if self.snmp_rate_limit <= 0.0 {
            return Err(ConfigError::NonPositiveRate { field: "snmp_rate_limit" });
        }

        if self.icmp_workers == 0 || self.icmp_workers > MAXIMUM_ICMP_WORKER_POOL {
            let clamped = self.icmp_workers.clamp(1, MAXIMUM_ICMP_WORKER_POOL);
            warn!("⚙️ [CONFIG_GUARD]: icmp_workers {} out of range; clamped to {}.", self.icmp_workers, clamped);
            self.icmp_workers = clamped;
        }

        if self.snmp_workers == 0 || self.snmp_workers > MAXIMUM_SNMP_WORKER_POOL {
            let clamped = self.snmp_workers.clamp(1, MAXIMUM_SNMP_WORKER_POOL);
            warn!("⚙️ [CONFIG_GUARD]: snmp_workers {} out of range; clamped to {}.", self.snmp_workers, clamped);
            self.snmp_workers = clamped;
        }

        // 4. SNMP
        if self.snmp.community.trim().is_empty() {
            return Err(ConfigError::BlankCommunity);
        }
        if self.snmp.port == 0 {
            return Err(ConfigError::InvalidSnmpPort);
        }

        // 5. ALMACÉN: el esquema es obligatorio en la URL.
        if !self.influxdb.url.starts_with("http://") && !self.influxdb.url.starts_with("https://") {
            return Err(ConfigError::UrlWithoutScheme(self.influxdb.url.clone()));
        }

        if self.influxdb.batch_size == 0 {
            warn!("⚙️ [CONFIG_GUARD]: influxdb.batch_size 0 is not usable; clamped to 1.");
            self.influxdb.batch_size = 1;
        }

        // 6. CLAVES OBSOLETAS
        if self.discovery_interval.is_some() {
            warn!("🕰️ [CONFIG_LEGACY]: 'discovery_interval' is deprecated and ignored; use 'icmp_discovery_interval'.");
        }
        if self.snmp_daily_schedule.is_some() {
            warn!("🕰️ [CONFIG_LEGACY]: 'snmp_daily_schedule' is deprecated and ignored; continuous SNMP polling supersedes it.");
        }

        Ok(())
    }
}

/**
 * Renderiza los marcadores '${VAR}' contra el entorno del proceso.
 *
 * # Errors:
 * - `MissingEnvironmentVariable` si la variable no está definida.
 * - `UnterminatedInterpolation` si falta la llave de cierre.
 */
pub fn interpolate_environment(raw_document: &str) -> Result<String, ConfigError> {
    let mut rendered_document = String::with_capacity(raw_document.len());
    let mut remaining_text = raw_document;

    while let Some(marker_start) = remaining_text.find("${") {
        rendered_document.push_str(&remaining_text[..marker_start]);
        let after_marker = &remaining_text[marker_start + 2..];

        let Some(marker_end) = after_marker.find('}') else {
            return Err(ConfigError::UnterminatedInterpolation);
        };

        let variable_name = &after_marker[..marker_end];
        let variable_value = std::env::var(variable_name)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(variable_name.to_string()))?;

        rendered_document.push_str(&variable_value);
        remaining_text = &after_marker[marker_end + 1..];
    }

    rendered_document.push_str(remaining_text);
    Ok(rendered_document)
}
