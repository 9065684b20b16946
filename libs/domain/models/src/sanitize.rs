// [libs/domain/models/src/sanitize.rs]
/*!
 * =================================================================
 * APARATO: HOSTILE STRING SANITIZER (V2.0 - STORAGE TIME)
 * CLASIFICACIÓN: DOMAIN UTILITY (ESTRATO L2)
 * RESPONSABILIDAD: DESINFECCIÓN DE CADENAS DE ORIGEN NO CONFIABLE
 *
 * # Mathematical Proof (Idempotent Hygiene):
 * sanitize(sanitize(x)) == sanitize(x). Al aplicar la desinfección en el
 * momento de almacenamiento, ningún estrato aguas abajo del registro
 * necesita volver a desinfectar.
 * =================================================================
 */

/**
 * Desinfecta una cadena de origen hostil para su almacenamiento.
 *
 * Reglas, en orden:
 * 1. Elimina caracteres de control, preservando los blancos (tab, NL).
 * 2. Recorta los blancos de ambos extremos.
 * 3. Trunca a 'max_chars' caracteres completos (nunca parte un scalar).
 */
pub fn sanitize_display_string(raw_input: &str, max_chars: usize) -> String {
    let control_free: String = raw_input
        .chars()
        .filter(|candidate| !candidate.is_control() || candidate.is_whitespace())
        .collect();

    control_free.trim().chars().take(max_chars).collect()
}

/**
 * Desinfecta una ráfaga de bytes de origen hostil (octet strings SNMP).
 *
 * Los bytes inválidos UTF-8 degradan al carácter de reemplazo U+FFFD;
 * después aplica las mismas reglas que [`sanitize_display_string`].
 */
pub fn sanitize_lossy_bytes(raw_bytes: &[u8], max_chars: usize) -> String {
    sanitize_display_string(&String::from_utf8_lossy(raw_bytes), max_chars)
}
