//! Account number generation and normalization.
//!
//! Account numbers are IBAN-like: `FR` + 2 check digits + 23 alphanumeric
//! characters, 27 characters total, derived deterministically from the
//! account id so they are unique and never reused. Stored without spaces;
//! user input is normalized before comparison.

use uuid::Uuid;

/// Total length of a generated account number.
pub const ACCOUNT_NUMBER_LEN: usize = 27;

/// Generates the account number for a freshly created account.
///
/// Deterministic in the account id: the same id always yields the same
/// number, and distinct ids yield distinct numbers.
#[must_use]
pub fn generate_account_number(account_id: Uuid) -> String {
    let hex = account_id.simple().to_string().to_uppercase();
    // Check digits in 10..=99, like a real IBAN's two-digit key.
    let check = 10 + u32::from(account_id.as_bytes()[0]) % 90;
    format!("FR{check:02}{}", &hex[..ACCOUNT_NUMBER_LEN - 4])
}

/// Normalizes a user-supplied account number for comparison.
///
/// Strips all whitespace; `FR76 1234 ...` and `FR761234...` refer to the
/// same account.
#[must_use]
pub fn normalize_account_number(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}
