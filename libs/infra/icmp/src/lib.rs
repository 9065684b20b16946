// [libs/infra/icmp/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ICMP ECHO ADAPTER ROOT (V4.0 - CAPABILITY SEAM)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CONTRATO DE SONDA DE ECO Y GUARDIA DE OBJETIVOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CAPABILITY SEAM: El barrido y el prober dependen del contrato
 *    'EchoProbe', no del socket crudo; los Proving Grounds inyectan
 *    dobles deterministas por esta costura.
 * 2. VERDICT TAXONOMY: Un eco termina en Reply/Timeout/Unreachable;
 *    los fallos rápidos del kernel son veredictos, nunca errores que
 *    maten al prober.
 * =================================================================
 */

/// Guardia de elegibilidad de objetivos (defensa en profundidad).
pub mod guard;

/// Ejecutor de producción sobre surge-ping (socket raw ICMP).
pub mod surge;

pub use crate::guard::is_probe_eligible;
pub use crate::surge::SurgeEchoProbe;

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

/// Veredicto de una sonda de eco individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchoVerdict {
    /// Respuesta observada con su round-trip.
    Reply(Duration),
    /// Silencio dentro de la ventana de espera.
    Timeout,
    /// Fallo rápido reportado por el kernel o el socket.
    Unreachable(String),
}

impl EchoVerdict {
    /// Una sonda es exitosa si hubo respuesta con round-trip positivo.
    pub fn is_success(&self) -> bool {
        matches!(self, EchoVerdict::Reply(rtt) if *rtt > Duration::ZERO)
    }
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("SOCKET_INIT_FAULT: Unable to claim raw ICMP socket (CAP_NET_RAW?): {0}")]
    SocketInit(#[from] std::io::Error),
}

/**
 * Contrato de sonda de eco ICMP.
 *
 * Una invocación emite exactamente un eco y retorna su veredicto;
 * la cadencia, el limitador y el breaker viven aguas arriba.
 */
#[async_trait]
pub trait EchoProbe: Send + Sync {
    async fn echo(&self, target: Ipv4Addr, timeout: Duration) -> EchoVerdict;
}
