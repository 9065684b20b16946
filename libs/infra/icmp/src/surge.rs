// [libs/infra/icmp/src/surge.rs]
/*!
 * =================================================================
 * APARATO: SURGE ECHO EXECUTOR (V4.1 - RAW SOCKET)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: EMISIÓN DE ECOS ICMP SOBRE SOCKET RAW COMPARTIDO
 *
 * # Reliability:
 * Un único cliente surge-ping multiplexa todos los ecos del proceso;
 * cada sonda usa un identificador aleatorio para desambiguar las
 * respuestas concurrentes del enjambre de probers.
 * =================================================================
 */

use crate::{EchoProbe, EchoVerdict, ProbeError};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError};
use tracing::debug;

/// Carga útil nominal de cada eco (8 bytes de relleno).
const ECHO_PAYLOAD: [u8; 8] = [0; 8];

/// Ejecutor de producción: un socket raw ICMP compartido por proceso.
#[derive(Clone)]
pub struct SurgeEchoProbe {
    raw_socket_client: Client,
}

impl SurgeEchoProbe {
    /**
     * Reclama el socket raw ICMP del proceso.
     *
     * # Errors:
     * - `SocketInit` si el proceso carece de CAP_NET_RAW o el socket
     *   no puede crearse.
     */
    pub fn new() -> Result<Self, ProbeError> {
        let client = Client::new(&Config::default())?;
        Ok(Self { raw_socket_client: client })
    }
}

#[async_trait]
impl EchoProbe for SurgeEchoProbe {
    async fn echo(&self, target: Ipv4Addr, timeout: Duration) -> EchoVerdict {
        let mut pinger = self
            .raw_socket_client
            .pinger(IpAddr::V4(target), PingIdentifier(rand::random::<u16>()))
            .await;

        pinger.timeout(timeout);

        match pinger.ping(PingSequence(0), &ECHO_PAYLOAD).await {
            Ok((_reply_packet, round_trip)) => EchoVerdict::Reply(round_trip),
            Err(SurgeError::Timeout { .. }) => EchoVerdict::Timeout,
            Err(fast_failure) => {
                debug!("⚡ [ECHO_FAST_FAIL]: Target [{}] rejected probe: {}", target, fast_failure);
                EchoVerdict::Unreachable(fast_failure.to_string())
            }
        }
    }
}
