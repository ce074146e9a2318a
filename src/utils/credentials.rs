//! Random secrets and codes.

use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Length of generated proxy passwords.
pub const SECRET_LEN: usize = 24;

/// Length of generated referral codes.
pub const REFERRAL_CODE_LEN: usize = 8;

// Excludes 0, O, 1 and I.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Fresh alphanumeric proxy password.
pub fn generate_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Fresh referral code.
pub fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..REFERRAL_CODE_LEN)
        .filter_map(|_| CODE_ALPHABET.choose(&mut rng).copied())
        .map(char::from)
        .collect()
}

/// Pick up to `n` distinct items at random.
pub fn sample<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    let mut rng = rand::rng();
    items.choose_multiple(&mut rng, n).cloned().collect()
}
