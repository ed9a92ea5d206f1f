use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

/// Validates a PAN with the Luhn mod-10 check.
///
/// Empty strings and strings containing any non-digit character fail.
pub fn luhn_check(pan: &str) -> bool {
    if pan.is_empty() || !is_digits(pan) {
        return false;
    }
    luhn_sum(pan) % 10 == 0
}

/// Computes the Luhn check digit for a partial PAN (everything but the last
/// position). Returns `None` when the input contains a non-digit character.
pub fn luhn_check_digit(partial_pan: &str) -> Option<char> {
    if !is_digits(partial_pan) {
        return None;
    }
    // A placeholder zero occupies the check position, shifting the doubled
    // digits onto the correct parity.
    let mut padded = String::with_capacity(partial_pan.len() + 1);
    padded.push_str(partial_pan);
    padded.push('0');

    let check = (10 - luhn_sum(&padded) % 10) % 10;
    Some(char::from(b'0' + check as u8))
}

/// Synthesizes a Luhn-valid PAN of exactly `length` digits starting with
/// `prefix`.
///
/// Returns `None` when `length` is zero, the prefix contains a non-digit, or
/// the prefix leaves no room for the check digit. Middle digits come from a
/// non-cryptographic generator seeded from the wall clock; never use this
/// output as key or nonce material.
pub fn generate_pan(prefix: &str, length: usize) -> Option<String> {
    let mut rng = clock_rng();
    generate_pan_with(&mut rng, prefix, length)
}

/// Generates `count` independent PANs. Any invalid input yields an empty
/// list.
pub fn generate_pan_batch(prefix: &str, length: usize, count: usize) -> Vec<String> {
    if count == 0 || length == 0 || prefix.len() >= length || !is_digits(prefix) {
        return Vec::new();
    }

    let mut rng = clock_rng();
    let mut batch = Vec::with_capacity(count);
    for _ in 0..count {
        // Generation failures are skipped; with inputs that passed the
        // checks above they do not occur.
        if let Some(pan) = generate_pan_with(&mut rng, prefix, length) {
            batch.push(pan);
        }
    }
    batch
}

/// Classifies a PAN by its issuer prefix.
pub fn detect_card_brand(pan: &str) -> &'static str {
    if pan.starts_with('4') {
        return "visa";
    }
    match pan.get(..2) {
        Some(p) if ("51"..="55").contains(&p) => "mastercard",
        Some("34" | "37") => "amex",
        _ => "unknown",
    }
}

fn generate_pan_with(rng: &mut SmallRng, prefix: &str, length: usize) -> Option<String> {
    if length == 0 || prefix.len() >= length || !is_digits(prefix) {
        return None;
    }

    let mut pan = String::with_capacity(length);
    pan.push_str(prefix);
    for _ in 0..length - prefix.len() - 1 {
        pan.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }

    let check = luhn_check_digit(&pan)?;
    pan.push(check);
    Some(pan)
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn luhn_sum(digits: &str) -> u32 {
    digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(position, byte)| {
            let mut digit = u32::from(byte - b'0');
            if position % 2 == 1 {
                digit *= 2;
                if digit > 9 {
                    digit -= 9;
                }
            }
            digit
        })
        .sum()
}

fn clock_rng() -> SmallRng {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    SmallRng::seed_from_u64(seed)
}
