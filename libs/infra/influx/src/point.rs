// [libs/infra/influx/src/point.rs]
/*!
 * =================================================================
 * APARATO: LINE PROTOCOL POINTS (V5.1 - BIT EXACT SCHEMA)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PUNTOS DE DATOS Y SU RENDERIZADO DE LÍNEA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SCHEMA AUTHORITY: Las tres mediciones del sistema ('ping',
 *    'device_info', 'health_metrics') se construyen únicamente aquí;
 *    los nombres de campo son contrato con los tableros externos.
 * 2. ESCAPING DISCIPLINE: Comas, espacios y signos de igual se escapan
 *    según el protocolo de línea v2; los valores de texto escapan
 *    comillas y barras invertidas.
 * =================================================================
 */

use argos_domain_models::{DeviceIdentity, VitalSignsReport};
use chrono::{DateTime, Utc};

/// Valor tipado de un campo del protocolo de línea.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Text(String),
}

/// Punto de datos listo para su renderizado de línea.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub measurement: String,
    pub tags: Vec<(String, String)>,
    pub fields: Vec<(String, FieldValue)>,
    /// Nanosegundos desde época UNIX.
    pub timestamp_ns: i64,
}

fn escape_identifier(raw: &str) -> String {
    raw.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

fn escape_measurement(raw: &str) -> String {
    raw.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_text_value(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

fn timestamp_nanos(moment: DateTime<Utc>) -> i64 {
    moment.timestamp_nanos_opt().unwrap_or_default()
}

impl FieldValue {
    fn render(&self) -> String {
        match self {
            FieldValue::Float(scalar) => format!("{}", scalar),
            FieldValue::Bool(flag) => flag.to_string(),
            FieldValue::Integer(scalar) => format!("{}i", scalar),
            FieldValue::Unsigned(scalar) => format!("{}u", scalar),
            FieldValue::Text(text) => format!("\"{}\"", escape_text_value(text)),
        }
    }
}

impl DataPoint {
    /**
     * Medición 'ping': tag 'ip'; campos rtt_ms/success/suspended.
     * La marca temporal es el inicio de la sonda, no el encolado.
     */
    pub fn ping_measurement(
        device_ip: &str,
        rtt_ms: f64,
        success: bool,
        suspended: bool,
        probe_started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            measurement: "ping".to_string(),
            tags: vec![("ip".to_string(), device_ip.to_string())],
            fields: vec![
                ("rtt_ms".to_string(), FieldValue::Float(rtt_ms.max(0.0))),
                ("success".to_string(), FieldValue::Bool(success)),
                ("suspended".to_string(), FieldValue::Bool(suspended)),
            ],
            timestamp_ns: timestamp_nanos(probe_started_at),
        }
    }

    /**
     * Medición 'device_info': tag 'ip'; campos hostname/snmp_description.
     * La marca temporal es la finalización del sondeo SNMP.
     */
    pub fn device_info_measurement(identity: &DeviceIdentity, polled_at: DateTime<Utc>) -> Self {
        Self {
            measurement: "device_info".to_string(),
            tags: vec![("ip".to_string(), identity.ip.clone())],
            fields: vec![
                ("hostname".to_string(), FieldValue::Text(identity.hostname.clone())),
                ("snmp_description".to_string(), FieldValue::Text(identity.sys_descr.clone())),
            ],
            timestamp_ns: timestamp_nanos(polled_at),
        }
    }

    /// Medición 'health_metrics': sin tags; campos numéricos del reporte.
    pub fn health_measurement(report: &VitalSignsReport, reported_at: DateTime<Utc>) -> Self {
        Self {
            measurement: "health_metrics".to_string(),
            tags: Vec::new(),
            fields: vec![
                ("device_count".to_string(), FieldValue::Integer(report.device_count)),
                ("active_pingers".to_string(), FieldValue::Integer(report.active_pingers)),
                ("suspended_devices".to_string(), FieldValue::Integer(report.suspended_devices)),
                ("goroutines".to_string(), FieldValue::Integer(report.runtime_tasks)),
                ("memory_mb".to_string(), FieldValue::Integer(report.memory_mb)),
                ("rss_mb".to_string(), FieldValue::Integer(report.rss_mb)),
                ("influxdb_ok".to_string(), FieldValue::Bool(report.influxdb_ok)),
                (
                    "influxdb_successful_batches".to_string(),
                    FieldValue::Unsigned(report.influxdb_successful_batches),
                ),
                (
                    "influxdb_failed_batches".to_string(),
                    FieldValue::Unsigned(report.influxdb_failed_batches),
                ),
                ("pings_sent_total".to_string(), FieldValue::Unsigned(report.pings_sent_total)),
            ],
            timestamp_ns: timestamp_nanos(reported_at),
        }
    }

    /// Renderiza el punto como una línea del protocolo v2.
    pub fn render_line(&self) -> String {
        let mut rendered_line = escape_measurement(&self.measurement);

        for (tag_key, tag_value) in &self.tags {
            rendered_line.push(',');
            rendered_line.push_str(&escape_identifier(tag_key));
            rendered_line.push('=');
            rendered_line.push_str(&escape_identifier(tag_value));
        }

        rendered_line.push(' ');

        let rendered_fields: Vec<String> = self
            .fields
            .iter()
            .map(|(field_key, field_value)| {
                format!("{}={}", escape_identifier(field_key), field_value.render())
            })
            .collect();

        rendered_line.push_str(&rendered_fields.join(","));
        rendered_line.push(' ');
        rendered_line.push_str(&self.timestamp_ns.to_string());
        rendered_line
    }
}

/// Renderiza un lote completo, una línea por punto.
pub fn render_batch(points: &[DataPoint]) -> String {
    points
        .iter()
        .map(DataPoint::render_line)
        .collect::<Vec<String>>()
        .join("\n")
}
