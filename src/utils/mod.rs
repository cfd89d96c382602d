pub mod url_validator;

pub use url_validator::{UrlValidationError, validate_url};

/// The 62-symbol code alphabet: upper, lower, digits.
pub const CODE_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a short code of `length` symbols drawn uniformly from
/// [`CODE_ALPHABET`].
///
/// Backed by the thread-local RNG, which is a CSPRNG, so codes resist
/// enumeration. Pure apart from RNG state; collision handling belongs to
/// the caller.
pub fn generate_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| CODE_ALPHABET[rand::random_range(0..CODE_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// Check that a candidate code is non-empty and drawn from the code
/// alphabet. Used as a fast reject on the resolve path before touching
/// the store.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_length() {
        for len in [1, 6, 10, 32] {
            assert_eq!(generate_code(len).len(), len);
        }
    }

    #[test]
    fn test_generate_code_alphabet() {
        let code = generate_code(256);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_code_zero_length() {
        assert_eq!(generate_code(0), "");
    }

    #[test]
    fn test_generated_codes_vary() {
        // 62^10 possibilities; two equal draws in a row would indicate a
        // broken RNG rather than bad luck.
        let a = generate_code(10);
        let b = generate_code(10);
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("aZ3kLmQ9pT"));
        assert!(is_valid_code("abc123"));
        assert!(!is_valid_code(""));
        assert!(!is_valid_code("has space"));
        assert!(!is_valid_code("semi;colon"));
        assert!(!is_valid_code("ünïcode"));
    }
}
