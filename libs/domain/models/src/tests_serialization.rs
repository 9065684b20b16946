// [libs/domain/models/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V3.0 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON DE LOS CONTRATOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DATA INTEGRITY: Valida que los renombres serde de DeviceIdentity
 *    sobrevivan un roundtrip completo de red simulada.
 * 2. HEALTH CONTRACT: Certifica los nombres de campo exactos que los
 *    tableros de operaciones consultan en 'GET /health'.
 * =================================================================
 */
