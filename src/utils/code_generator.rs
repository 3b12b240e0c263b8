use rand::Rng;

/// Claim code alphabet; omits I, O, 0 and 1, which are easy to misread at a counter.
pub const CLAIM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CLAIM_CODE_LEN: usize = 6;

const SALT_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

fn random_from(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// 6-digit numeric code in `100000..=999999`.
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(100000..=999999))
}

pub fn generate_claim_code() -> String {
    random_from(CLAIM_CODE_ALPHABET, CLAIM_CODE_LEN)
}

pub fn generate_salt(len: usize) -> String {
    random_from(SALT_ALPHABET, len)
}

/// Canonical form used for claim code lookups.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_six_digit_code() {
        let code = generate_six_digit_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let code_num: u32 = code.parse().unwrap();
        assert!((100000..=999999).contains(&code_num));
    }

    #[test]
    fn test_claim_code_uses_unambiguous_alphabet() {
        for _ in 0..200 {
            let code = generate_claim_code();
            assert_eq!(code.len(), CLAIM_CODE_LEN);
            assert!(code.bytes().all(|b| CLAIM_CODE_ALPHABET.contains(&b)));
            assert!(!code.contains(['0', '1', 'I', 'O']));
        }
    }

    #[test]
    fn test_salt_length() {
        let salt = generate_salt(16);
        assert_eq!(salt.len(), 16);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  ab3k9z \n"), "AB3K9Z");
    }
}
