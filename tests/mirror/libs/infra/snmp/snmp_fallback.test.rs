// [tests/mirror/libs/infra/snmp/snmp_fallback.test.rs]
/**
 * =================================================================
 * APARATO: SNMP FALLBACK CERTIFIER (V1.1)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-SNMP
 * RESPONSABILIDAD: MANDATO GET -> GETNEXT Y LECTURA DE IDENTIDAD
 *
 * Hay agentes embebidos que solo responden a la instancia '.0' y
 * otros que solo responden al recorrido GETNEXT del subárbol; el
 * lector debe identificar a ambos mundos con el mismo código.
 * =================================================================
 */

use argos_infra_snmp::{
    SnmpFault, SnmpTransport, SnmpValue, SystemIdentityFetcher, SYS_DESCR_INSTANCE_OID,
    SYS_NAME_INSTANCE_OID,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Agente moderno: responde GET sobre instancias '.0' directamente.
struct InstanceAnsweringAgent {
    answers: HashMap<String, SnmpValue>,
}

#[async_trait]
impl SnmpTransport for InstanceAnsweringAgent {
    async fn get(&self, oid_text: &str) -> Result<SnmpValue, SnmpFault> {
        self.answers
            .get(oid_text)
            .cloned()
            .ok_or_else(|| SnmpFault::RequestFailed("noSuchInstance".to_string()))
    }

    async fn get_next(&self, _oid_text: &str) -> Result<(String, SnmpValue), SnmpFault> {
        Err(SnmpFault::RequestFailed("agent rejects GETNEXT".to_string()))
    }
}

/// Agente legado: GET siempre falla; solo habla GETNEXT por subárbol.
struct WalkOnlyAgent {
    subtree_answers: HashMap<String, (String, SnmpValue)>,
}

#[async_trait]
impl SnmpTransport for WalkOnlyAgent {
    async fn get(&self, _oid_text: &str) -> Result<SnmpValue, SnmpFault> {
        Err(SnmpFault::RequestFailed("noSuchObject".to_string()))
    }

    async fn get_next(&self, oid_text: &str) -> Result<(String, SnmpValue), SnmpFault> {
        self.subtree_answers
            .get(oid_text)
            .cloned()
            .ok_or_else(|| SnmpFault::RequestFailed("endOfMib".to_string()))
    }
}

/**
 * CERTIFICACIÓN: Identidad completa contra un agente de instancias.
 */
#[tokio::test]
async fn certify_identity_read_against_instance_agent() {
    println!("\n🧪 [PROVING_GROUNDS]: Auditing instance-answering agent...");

    let mut answers = HashMap::new();
    answers.insert(
        SYS_NAME_INSTANCE_OID.to_string(),
        SnmpValue::Text("core-fw-1".to_string()),
    );
    answers.insert(
        SYS_DESCR_INSTANCE_OID.to_string(),
        SnmpValue::Octets(b"FortiGate 100F v7.4".to_vec()),
    );

    let fetcher = SystemIdentityFetcher::new(Arc::new(InstanceAnsweringAgent { answers }), 1);
    let identity = fetcher.fetch_identity().await.expect("identity resolves");

    assert_eq!(identity.sys_name, "core-fw-1");
    assert_eq!(identity.sys_descr, "FortiGate 100F v7.4");
    println!("   ✅ GET path certified.");
}

/**
 * CERTIFICACIÓN: Identidad completa contra un agente solo-GETNEXT.
 * El fallback acepta la respuesta porque su OID cae en el subárbol.
 */
#[tokio::test]
async fn certify_identity_read_against_walk_only_agent() {
    let mut subtree_answers = HashMap::new();
    subtree_answers.insert(
        "1.3.6.1.2.1.1.5".to_string(),
        ("1.3.6.1.2.1.1.5.0".to_string(), SnmpValue::Text("legacy-sw".to_string())),
    );
    subtree_answers.insert(
        "1.3.6.1.2.1.1.1".to_string(),
        ("1.3.6.1.2.1.1.1.0".to_string(), SnmpValue::Octets(b"Catalyst 2960".to_vec())),
    );

    let fetcher = SystemIdentityFetcher::new(Arc::new(WalkOnlyAgent { subtree_answers }), 0);
    let identity = fetcher.fetch_identity().await.expect("fallback resolves identity");

    assert_eq!(identity.sys_name, "legacy-sw");
    assert_eq!(identity.sys_descr, "Catalyst 2960");
}

/**
 * CERTIFICACIÓN: Un GETNEXT que escapa del subárbol NO se acepta como
 * identidad; el fallo emerge tras agotar el presupuesto.
 */
#[tokio::test]
async fn certify_out_of_subtree_walk_is_rejected() {
    let mut subtree_answers = HashMap::new();
    // El agente salta directamente a sysContact: fuera de sysName.
    subtree_answers.insert(
        "1.3.6.1.2.1.1.5".to_string(),
        ("1.3.6.1.2.1.1.6.0".to_string(), SnmpValue::Text("basement".to_string())),
    );

    let fetcher = SystemIdentityFetcher::new(Arc::new(WalkOnlyAgent { subtree_answers }), 0);
    let outcome = fetcher.fetch_identity().await;

    assert!(matches!(outcome, Err(SnmpFault::OutsideSubtree { .. })));
}

/// Octet strings hostiles quedan desinfectados ya en la identidad.
#[tokio::test]
async fn certify_identity_values_arrive_sanitized() {
    let mut answers = HashMap::new();
    answers.insert(
        SYS_NAME_INSTANCE_OID.to_string(),
        SnmpValue::Octets(vec![0x00, 0x65, 0x64, 0x67, 0x65, 0x07, 0xFF]),
    );
    answers.insert(
        SYS_DESCR_INSTANCE_OID.to_string(),
        SnmpValue::Text(format!("  {}  ", "d".repeat(2000))),
    );

    let fetcher = SystemIdentityFetcher::new(Arc::new(InstanceAnsweringAgent { answers }), 0);
    let identity = fetcher.fetch_identity().await.expect("identity resolves");

    assert!(identity.sys_name.starts_with("edge"));
    assert!(!identity.sys_name.contains('\u{0000}'));
    assert_eq!(identity.sys_descr.chars().count(), 1024, "decode-time cap applies");
}
