//! Redaction of `name=value` pair lists (query strings, form bodies).

use url::form_urlencoded;

use crate::redaction::rules::{NameSet, REPLACEMENT};

/// Replace the value of every pair whose decoded name is in `names`.
///
/// Pairs that do not match are kept byte-for-byte, including their
/// original encoding and order.
pub fn redact_pairs(input: &str, names: &NameSet) -> String {
    input
        .split('&')
        .map(|pair| {
            if pair.is_empty() {
                return pair.to_string();
            }
            let raw_name = pair.split_once('=').map_or(pair, |(name, _)| name);
            if names.contains(&decode_name(raw_name)) {
                format!("{raw_name}={REPLACEMENT}")
            } else {
                pair.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_name(raw: &str) -> String {
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(name, _)| name.into_owned())
        .unwrap_or_default()
}
