// [libs/infra/snmp/src/fetcher.rs]
/*!
 * =================================================================
 * APARATO: SYSTEM IDENTITY FETCHER (V4.2 - RETRY BUDGET)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LECTURA RESILIENTE DE sysName Y sysDescr
 * =================================================================
 */

use crate::{
    SnmpFault, SnmpTransport, SnmpValue, SYS_DESCR_INSTANCE_OID, SYS_DESCR_SUBTREE_OID,
    SYS_NAME_INSTANCE_OID, SYS_NAME_SUBTREE_OID,
};
use std::sync::Arc;
use tracing::debug;

/// Identidad de sistema reportada por el agente SNMP de un dispositivo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemIdentity {
    pub sys_name: String,
    pub sys_descr: String,
}

/**
 * Lector de identidad sobre un transporte arbitrario.
 *
 * El presupuesto de reintentos se aplica por campo: cada lectura
 * (GET + posible fallback GETNEXT) cuenta como un intento.
 */
pub struct SystemIdentityFetcher {
    transport: Arc<dyn SnmpTransport>,
    retry_budget: u32,
}

impl SystemIdentityFetcher {
    #[must_use]
    pub fn new(transport: Arc<dyn SnmpTransport>, retry_budget: u32) -> Self {
        Self { transport, retry_budget }
    }

    /**
     * Lee sysName y sysDescr aplicando el mandato de fallback.
     *
     * # Errors:
     * Retorna el último [`SnmpFault`] observado si el presupuesto de
     * reintentos se agota en cualquiera de los dos campos.
     */
    pub async fn fetch_identity(&self) -> Result<SystemIdentity, SnmpFault> {
        let sys_name = self
            .read_sanitized_field(SYS_NAME_INSTANCE_OID, SYS_NAME_SUBTREE_OID)
            .await?;
        let sys_descr = self
            .read_sanitized_field(SYS_DESCR_INSTANCE_OID, SYS_DESCR_SUBTREE_OID)
            .await?;

        Ok(SystemIdentity { sys_name, sys_descr })
    }

    async fn read_sanitized_field(
        &self,
        instance_oid: &str,
        subtree_oid: &str,
    ) -> Result<String, SnmpFault> {
        let mut last_fault = SnmpFault::RequestFailed("retry budget exhausted".to_string());

        for attempt in 0..=self.retry_budget {
            match get_with_getnext_fallback(self.transport.as_ref(), instance_oid, subtree_oid).await
            {
                Ok(value) => return Ok(value.decode_sanitized()),
                Err(fault) => {
                    debug!(
                        "🔁 [SNMP_RETRY]: Attempt {} for [{}] failed: {}",
                        attempt + 1,
                        instance_oid,
                        fault
                    );
                    last_fault = fault;
                }
            }
        }

        Err(last_fault)
    }
}

/**
 * Helper de compatibilidad obligatorio para toda lectura SNMP.
 *
 * Intenta GET sobre la instancia '.0'; ante cualquier fallo reintenta
 * con GETNEXT sobre el prefijo y acepta la primera respuesta cuyo OID
 * permanezca dentro del subárbol solicitado.
 */
pub async fn get_with_getnext_fallback(
    transport: &dyn SnmpTransport,
    instance_oid: &str,
    subtree_oid: &str,
) -> Result<SnmpValue, SnmpFault> {
    match transport.get(instance_oid).await {
        Ok(value) => Ok(value),
        Err(get_fault) => {
            debug!(
                "🪜 [SNMP_FALLBACK]: GET on [{}] failed ({}); walking with GETNEXT.",
                instance_oid, get_fault
            );

            let (answered_oid, value) = transport.get_next(subtree_oid).await?;

            if oid_within_subtree(&answered_oid, subtree_oid) {
                Ok(value)
            } else {
                Err(SnmpFault::OutsideSubtree {
                    requested: subtree_oid.to_string(),
                    answered: answered_oid,
                })
            }
        }
    }
}

/// Pertenencia léxica por arcos completos: '1.3.6.1.2.1.1.5' cubre
/// '1.3.6.1.2.1.1.5.0' pero no '1.3.6.1.2.1.1.50'.
fn oid_within_subtree(candidate_oid: &str, subtree_oid: &str) -> bool {
    candidate_oid == subtree_oid
        || candidate_oid
            .strip_prefix(subtree_oid)
            .map(|tail| tail.starts_with('.'))
            .unwrap_or(false)
}
