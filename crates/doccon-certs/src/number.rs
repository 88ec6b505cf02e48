//! Certificate number allocation.
//!
//! Format: `CERT-<base36 unix millis>-<base36 of 5 random bytes>`,
//! upper-cased. Numbers sort roughly by issue time; the store's unique
//! index is the actual uniqueness guarantee.

use chrono::Utc;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn generate_certificate_number() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix = rand::random::<u64>() & 0xFF_FFFF_FFFF;
    format!("CERT-{}-{}", base36(millis), base36(suffix))
}

fn base36(mut value: u64) -> String {
    if value == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
