//! Invoice reference generation.
//!
//! References have the form `YYYYMMDD-NNNN`: the creation date in
//! compact numeric form plus a random 4-digit suffix. Uniqueness is
//! enforced by the store's unique constraint; the invoice service
//! regenerates and retries a bounded number of times on collision.

use chrono::NaiveDate;
use rand::Rng;

/// Generate a reference for the given creation date.
pub fn generate(date: NaiveDate, rng: &mut impl Rng) -> String {
    let suffix: u16 = rng.gen_range(1000..10000);
    format!("{}-{suffix}", date.format("%Y%m%d"))
}

/// Whether `s` matches the `YYYYMMDD-NNNN` reference shape.
pub fn is_well_formed(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 13
        && bytes[8] == b'-'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..].iter().all(u8::is_ascii_digit)
}
