// [libs/infra/influx/src/lib.rs]
/*!
 * =================================================================
 * APARATO: INFLUX ADAPTER ROOT (V5.0 - WRITE BEHIND)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PUBLICACIÓN DURABLE DE PUNTOS DE SERIE TEMPORAL
 *
 * ## Visión Holística 2026
 * Tres piezas cooperantes: el protocolo de línea ('point'), el uplink
 * HTTP contra la API v2 ('client') y el sumidero por lotes ('sink').
 * Los productores encolan sin bloquear jamás; un único volcador agrupa,
 * reintenta con backoff exponencial y descarta con contabilidad cuando
 * el almacén rechaza el lote de forma persistente.
 * =================================================================
 */

/// Puntos de datos y renderizado del protocolo de línea.
pub mod point;

/// Uplink HTTP de producción contra la API v2 del almacén.
pub mod client;

/// Sumidero por lotes: canal acotado, volcador único y reintentos.
pub mod sink;

pub use crate::client::{InfluxHttpUplink, StoreUplink};
pub use crate::point::{DataPoint, FieldValue};
pub use crate::sink::{MetricsSink, SinkTuning};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfluxError {
    #[error("STORE_ENDPOINT_FAULT: Unable to build store client: {0}")]
    ClientInit(String),

    #[error("STORE_NETWORK_FAULT: Write burst failed in flight: {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("STORE_REJECTION: Store answered HTTP {0}")]
    WriteRejected(u16),
}
