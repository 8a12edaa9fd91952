//! Hash helpers – abstracción para permitir cambiar de algoritmo sin tocar resto del core.

use blake3::Hasher;
use serde_json::Value;

use super::to_canonical_json;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hashea un `Value` sobre su forma canónica (orden de claves irrelevante).
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_str_is_stable_hex() {
        let a = hash_str("Hello from Step A");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_str("Hello from Step A"));
        assert_ne!(a, hash_str("Hello from Step B"));
    }
}
