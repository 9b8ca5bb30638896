//! Constant time equality checks used when verifying hashes.

use subtle::ConstantTimeEq;

/// Compares a trusted string against a candidate without revealing where they differ.
///
/// Both sides are copied into zero filled buffers of the trusted length and compared in
/// full. The candidate length is checked separately and folded into the same result, so a
/// shorter or longer candidate takes the same path as a mismatching one.
#[must_use]
pub fn compare(trusted: &str, candidate: &str) -> bool {
    let trusted = trusted.as_bytes();
    let candidate = candidate.as_bytes();

    let expected = trusted.to_vec();
    let mut actual = vec![0; trusted.len()];

    let copied = candidate.len().min(trusted.len());
    actual[..copied].copy_from_slice(&candidate[..copied]);

    let same_bytes = expected.ct_eq(&actual);
    let same_length = trusted.len().ct_eq(&candidate.len());

    (same_bytes & same_length).into()
}

/// Compares two decoded hashes. A length difference returns `false` immediately.
#[must_use]
pub fn compare_bytes(trusted: &[u8], candidate: &[u8]) -> bool {
    trusted.ct_eq(candidate).into()
}
