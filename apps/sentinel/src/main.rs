// [apps/sentinel/src/main.rs]
/*!
 * =================================================================
 * APARATO: SENTINEL SHELL (V9.1 - ZENITH SHELL)
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO E IGNICIÓN DEL KERNEL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ARCHITECTURAL PURITY: El shell solo parsea directivas, carga el
 *    documento de configuración e inicia el Kernel; toda la operación
 *    vive en 'SentinelKernel'.
 * 2. ERROR TRIAGE: Solo los fallos de ignición (configuración,
 *    almacén, puerto, socket raw) terminan el proceso con código
 *    distinto de cero.
 * =================================================================
 */

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use argos_domain_config::SentinelConfig;
use argos_sentinel::prelude::SentinelKernel;

/**
 * Directivas de mando del centinela soberano.
 * Configuración inyectada vía CLI o variables de entorno.
 */
#[derive(Parser, Debug)]
#[command(
    author = "Raz Podesta <metaShark Tech>",
    version,
    about = "Argos Sovereign Network Sentinel // ICMP discovery + SNMP enrichment + continuous probing"
)]
struct SentinelDirectives {
    /// Ruta del documento YAML de configuración.
    #[arg(long, env = "ARGOS_CONFIG", default_value = "/etc/argos/config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. ENTORNO LOCAL (.env) Y OBSERVABILIDAD
    dotenvy::dotenv().ok();
    argos_shared_atalaya::init_tracing("argos_sentinel");

    info!("💠 [SHELL]: Global Initiation Sequence V9 starting...");

    // 2. PARSEO DE DIRECTIVAS Y CARGA DEL DOCUMENTO
    let directives = SentinelDirectives::parse();

    let config = SentinelConfig::load(&directives.config)
        .with_context(|| format!("CONFIG_INVALID: Unable to load {:?}", directives.config))?;

    info!(
        "📜 [SHELL]: Configuration loaded; {} networks, {} max devices.",
        config.networks.len(),
        config.max_devices
    );

    // 3. IGNICIÓN Y TRANSFERENCIA DE CONTROL AL KERNEL
    let kernel = SentinelKernel::ignite(config).await?;
    kernel.launch_sovereign_operations().await?;

    // 4. CIERRE DETERMINISTA
    info!("🏁 [SHELL]: Shutdown sequence concluded. Sentinel offline.");
    Ok(())
}
