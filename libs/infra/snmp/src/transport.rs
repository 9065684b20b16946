// [libs/infra/snmp/src/transport.rs]
/*!
 * =================================================================
 * APARATO: CSNMP TRANSPORT (V4.1 - PROTOCOL ISOLATION)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SESIÓN SNMPv2c DE PRODUCCIÓN SOBRE UDP
 *
 * El protocolo crudo queda confinado a este módulo: el resto del
 * sistema solo conoce el contrato 'SnmpTransport'.
 * =================================================================
 */

use crate::{SnmpFault, SnmpTransport, SnmpValue};
use async_trait::async_trait;
use csnmp::{ObjectIdentifier, ObjectValue, Snmp2cClient};
use std::net::SocketAddr;
use std::time::Duration;

/// Sesión SNMPv2c de producción contra un único agente.
pub struct CsnmpTransport {
    session_client: Snmp2cClient,
}

impl CsnmpTransport {
    /**
     * Abre la sesión UDP contra el agente del dispositivo.
     *
     * # Errors:
     * - `SessionInit` si el socket local no puede reclamarse.
     */
    pub async fn connect(
        agent_address: SocketAddr,
        community: &str,
        timeout: Duration,
    ) -> Result<Self, SnmpFault> {
        let session_client = Snmp2cClient::new(
            agent_address,
            community.as_bytes().to_vec(),
            None,
            Some(timeout),
            0,
        )
        .await
        .map_err(|session_fault| SnmpFault::SessionInit(session_fault.to_string()))?;

        Ok(Self { session_client })
    }
}

fn parse_oid(oid_text: &str) -> Result<ObjectIdentifier, SnmpFault> {
    oid_text
        .parse::<ObjectIdentifier>()
        .map_err(|_| SnmpFault::MalformedOid(oid_text.to_string()))
}

fn translate_object_value(value: ObjectValue) -> SnmpValue {
    match value {
        ObjectValue::String(raw_octets) => SnmpValue::Octets(raw_octets),
        ObjectValue::Integer(scalar) => SnmpValue::Integer(scalar as i64),
        other => SnmpValue::Other(format!("{:?}", other)),
    }
}

#[async_trait]
impl SnmpTransport for CsnmpTransport {
    async fn get(&self, oid_text: &str) -> Result<SnmpValue, SnmpFault> {
        let requested_oid = parse_oid(oid_text)?;

        let value = self
            .session_client
            .get(requested_oid)
            .await
            .map_err(|request_fault| SnmpFault::RequestFailed(request_fault.to_string()))?;

        Ok(translate_object_value(value))
    }

    async fn get_next(&self, oid_text: &str) -> Result<(String, SnmpValue), SnmpFault> {
        let requested_oid = parse_oid(oid_text)?;

        let (answered_oid, value) = self
            .session_client
            .get_next(requested_oid)
            .await
            .map_err(|request_fault| SnmpFault::RequestFailed(request_fault.to_string()))?;

        Ok((answered_oid.to_string(), translate_object_value(value)))
    }
}
