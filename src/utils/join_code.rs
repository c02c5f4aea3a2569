// src/utils/join_code.rs

use rand::Rng;

use crate::config::JOIN_CODE_LENGTH;

// Excludes 0, O, 1 and I.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generates a random class join code.
pub fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of a code typed by a student.
pub fn normalize_join_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}
