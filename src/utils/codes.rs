// src/utils/codes.rs

use rand::{Rng, distributions::Uniform};

use crate::config::{OTP_CODE_LENGTH, STUDENT_CODE_LENGTH};

/// Ambiguous glyphs (0/O, 1/I) are left out so codes can be read aloud.
const STUDENT_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Numeric one-time code, zero-padded.
pub fn generate_otp<R: Rng + ?Sized>(rng: &mut R) -> String {
    let digits = Uniform::from(0..10u8);
    (0..OTP_CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.sample(&digits)))
        .collect()
}

pub fn generate_student_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let idx = Uniform::from(0..STUDENT_CODE_ALPHABET.len());
    (0..STUDENT_CODE_LENGTH)
        .map(|_| char::from(STUDENT_CODE_ALPHABET[rng.sample(&idx)]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::StudentLoginRequest;
    use rand::{SeedableRng, rngs::StdRng};
    use validator::Validate;

    #[test]
    fn otp_is_numeric_and_fixed_length() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let code = generate_otp(&mut rng);
            assert_eq!(code.len(), OTP_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn student_codes_pass_login_validation() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let login_code = generate_student_code(&mut rng);
            assert_eq!(login_code.len(), STUDENT_CODE_LENGTH);
            assert!(!login_code.contains('0') && !login_code.contains('O'));
            assert!(StudentLoginRequest { login_code }.validate().is_ok());
        }
    }
}
