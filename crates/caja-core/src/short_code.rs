//! # Short Codes
//!
//! Human-readable references printed on receipts and used for vault
//! bookkeeping: `AB12C` for a register session, `PAY-7QX0Z` for a
//! supplier payment.
//!
//! Generation needs randomness and lives in caja-db; this module only
//! knows the alphabet, the shapes and the normalization.

/// Length of the random part of every short code.
pub const SHORT_CODE_LEN: usize = 5;

/// Prefix of supplier payment codes.
pub const PAYMENT_CODE_PREFIX: &str = "PAY-";

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Renders the low digits of `n` in uppercase base-36, zero-padded to `len`.
///
/// ## Example
/// ```rust
/// use caja_core::short_code::encode_base36;
///
/// assert_eq!(encode_base36(35, 5), "0000Z");
/// assert_eq!(encode_base36(36, 5), "00010");
/// ```
pub fn encode_base36(mut n: u64, len: usize) -> String {
    let mut digits = vec![b'0'; len];
    for slot in digits.iter_mut().rev() {
        *slot = ALPHABET[(n % 36) as usize];
        n /= 36;
    }
    digits.into_iter().map(char::from).collect()
}

/// Builds a supplier payment code from its random part.
pub fn payment_code(n: u64) -> String {
    format!("{}{}", PAYMENT_CODE_PREFIX, encode_base36(n, SHORT_CODE_LEN))
}

/// Normalizes user input before looking up a register by code.
pub fn normalize_short_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

/// Checks the register short-code shape (5 uppercase base-36 characters).
pub fn is_register_code(code: &str) -> bool {
    code.len() == SHORT_CODE_LEN && code.bytes().all(|b| ALPHABET.contains(&b))
}

// =============================================================================
// Unit Tests
// =============================================================================
