// [libs/infra/influx/src/client.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STORE UPLINK (V5.1 - API V2)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: TÚNEL HTTP HACIA EL ALMACÉN DE SERIES TEMPORALES
 *
 * VISION HIPER-HOLÍSTICA:
 * Implementa el contrato 'StoreUplink' sobre la API v2 de InfluxDB
 * ('/api/v2/write' y '/ping'). El sumidero y los Proving Grounds
 * dependen del contrato, nunca del transporte concreto.
 * =================================================================
 */

use crate::InfluxError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};

/// Ventana de espera del chequeo de alcanzabilidad.
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Ventana de espera de una ráfaga de escritura.
const WRITE_BURST_TIMEOUT: Duration = Duration::from_secs(30);

/**
 * Contrato del almacén: escritura asíncrona por bucket lógico y
 * sondeo ligero de alcanzabilidad.
 */
#[async_trait]
pub trait StoreUplink: Send + Sync {
    /// Envía un cuerpo de protocolo de línea al bucket indicado.
    async fn write_lines(&self, bucket: &str, line_protocol_body: String) -> Result<(), InfluxError>;

    /// True si el almacén responde al sondeo ligero dentro de la ventana.
    async fn is_reachable(&self) -> bool;
}

/// Uplink de producción contra la API v2 del almacén.
pub struct InfluxHttpUplink {
    network_session_client: Client,
    base_endpoint: String,
    organization: String,
}

impl InfluxHttpUplink {
    /**
     * Inicializa el túnel con el token maestro en las cabeceras.
     *
     * # Errors:
     * - `ClientInit` si el token no es una cabecera válida o el cliente
     *   TLS no puede construirse.
     */
    pub fn new(base_url: &str, access_token: &str, organization: &str) -> Result<Self, InfluxError> {
        let mut header_map = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("Token {}", access_token))
            .map_err(|header_fault| InfluxError::ClientInit(header_fault.to_string()))?;
        header_map.insert(AUTHORIZATION, auth_value);

        let network_session_client = Client::builder()
            .default_headers(header_map)
            .user_agent("Argos-Sentinel/V9")
            .timeout(WRITE_BURST_TIMEOUT)
            .build()
            .map_err(|build_fault| InfluxError::ClientInit(build_fault.to_string()))?;

        Ok(Self {
            network_session_client,
            base_endpoint: base_url.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
        })
    }
}

#[async_trait]
impl StoreUplink for InfluxHttpUplink {
    #[instrument(skip(self, line_protocol_body), fields(bucket = %bucket))]
    async fn write_lines(&self, bucket: &str, line_protocol_body: String) -> Result<(), InfluxError> {
        let write_endpoint = format!("{}/api/v2/write", self.base_endpoint);

        let network_response = self
            .network_session_client
            .post(&write_endpoint)
            .query(&[
                ("org", self.organization.as_str()),
                ("bucket", bucket),
                ("precision", "ns"),
            ])
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line_protocol_body)
            .send()
            .await?;

        if network_response.status().is_success() {
            Ok(())
        } else {
            Err(InfluxError::WriteRejected(network_response.status().as_u16()))
        }
    }

    async fn is_reachable(&self) -> bool {
        let ping_endpoint = format!("{}/ping", self.base_endpoint);

        match self
            .network_session_client
            .get(&ping_endpoint)
            .timeout(HEALTH_PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => {
                response.status() == StatusCode::NO_CONTENT || response.status().is_success()
            }
            Err(reachability_fault) => {
                debug!("🌩️ [STORE_UNREACHABLE]: Ping probe failed: {}", reachability_fault);
                false
            }
        }
    }
}
