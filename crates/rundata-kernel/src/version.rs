//! Natural ordering of plan IDs.
//!
//! A plan ID is read as alternating (non-digit, digit) runs. Non-digit runs
//! compare as strings, digit runs compare by numeric value, and equal values
//! fall back to the raw digits so `"01"` and `"1"` still order strictly.
//! Tokenization is lossless, which makes this a total order usable as a
//! sort key.

use std::cmp::Ordering;

fn tokens(s: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let text_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (text, tail) = rest.split_at(text_end);
        let digits_end = tail
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (digits, tail) = tail.split_at(digits_end);
        out.push((text, digits));
        rest = tail;
    }
    out
}

fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.cmp(b))
}

/// Compare two version-like strings.
pub fn version_cmp(a: &str, b: &str) -> Ordering {
    let left = tokens(a);
    let right = tokens(b);
    for ((a_text, a_digits), (b_text, b_digits)) in left.iter().zip(right.iter()) {
        let ord = a_text
            .cmp(b_text)
            .then_with(|| cmp_numeric(a_digits, b_digits));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}

/// Whether `a` sorts strictly before `b`.
pub fn less_version(a: &str, b: &str) -> bool {
    version_cmp(a, b) == Ordering::Less
}

/// Sort strings in place by [`version_cmp`].
pub fn sort_versions<S: AsRef<str>>(items: &mut [S]) {
    items.sort_by(|a, b| version_cmp(a.as_ref(), b.as_ref()));
}
