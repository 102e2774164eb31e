//! YAML 1.1 implicit type resolution for plain scalars.
//!
//! A YAML 1.1 parser assigns a type to every plain (unquoted) scalar by
//! matching its text against the regular expressions of the type repository
//! (`!!null`, `!!bool`, `!!int`, `!!float`, `!!timestamp`). Text that resolves
//! to anything other than `!!str` must be quoted when it is meant as a string.
//!
//! # Example
//!
//! ```
//! use yamlstamp::document::node::Tag;
//! use yamlstamp::document::resolve::{is_yaml11_non_string, resolve_plain};
//!
//! assert_eq!(resolve_plain("yes"), Tag::Bool);
//! assert_eq!(resolve_plain("0x1F"), Tag::Int);
//! assert!(is_yaml11_non_string("2020-01-01"));
//! assert!(!is_yaml11_non_string("hello"));
//! ```

use super::node::Tag;
use yaml_rust2::{Yaml, YamlLoader};

const NULLS: &[&str] = &["", "~", "null", "Null", "NULL"];

const BOOLS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "true", "True", "TRUE", "false",
    "False", "FALSE", "on", "On", "ON", "off", "Off", "OFF",
];

/// Returns the tag a YAML 1.1 parser would give `text` as a plain scalar.
pub fn resolve_plain(text: &str) -> Tag {
    if NULLS.contains(&text) {
        Tag::Null
    } else if BOOLS.contains(&text) {
        Tag::Bool
    } else if is_int(text) {
        Tag::Int
    } else if is_float(text) {
        Tag::Float
    } else if is_timestamp(text) {
        Tag::Timestamp
    } else {
        Tag::Str
    }
}

/// Returns true if `text`, written as a plain scalar, would not load back as
/// a string under YAML 1.1 rules.
///
/// Besides the implicit scalar types this also catches text that parses as a
/// collection (`a: b`, `- x`, `[1]`) or as nothing at all (a lone comment).
/// Empty and multi-line text is never reported: neither round-trips as a
/// plain scalar anyway and the emitter picks a block or quoted style for it.
pub fn is_yaml11_non_string(text: &str) -> bool {
    if text.is_empty() || text.contains('\n') {
        return false;
    }
    if resolve_plain(text) != Tag::Str {
        return true;
    }
    match YamlLoader::load_from_str(text) {
        Ok(docs) => !matches!(docs.as_slice(), [Yaml::String(_)]),
        Err(_) => false,
    }
}

fn strip_sign(text: &str) -> &str {
    text.strip_prefix(['-', '+']).unwrap_or(text)
}

fn all_digits(text: &str, radix: u32) -> bool {
    text.chars().all(|c| c == '_' || c.is_digit(radix))
}

fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

fn is_int(text: &str) -> bool {
    let body = strip_sign(text);
    if body.is_empty() {
        return false;
    }
    if let Some(bin) = body.strip_prefix("0b") {
        return !bin.is_empty() && bin.contains(['0', '1']) && all_digits(bin, 2);
    }
    if let Some(hex) = body.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().any(|c| c.is_ascii_hexdigit()) && all_digits(hex, 16);
    }
    if body == "0" {
        return true;
    }
    if let Some(oct) = body.strip_prefix('0') {
        return all_digits(oct, 8);
    }
    if body.contains(':') {
        return is_sexagesimal(body, false);
    }
    body.starts_with(|c: char| c.is_ascii_digit()) && all_digits(body, 10)
}

/// `[1-9][0-9_]*(:[0-5]?[0-9])+`, with a trailing `.[0-9_]*` when `fraction`.
fn is_sexagesimal(body: &str, fraction: bool) -> bool {
    let body = if fraction {
        match body.split_once('.') {
            Some((whole, frac)) if all_digits(frac, 10) => whole,
            _ => return false,
        }
    } else {
        body
    };
    let mut parts = body.split(':');
    let head = parts.next().unwrap_or_default();
    let head_ok = if fraction {
        head.starts_with(|c: char| c.is_ascii_digit()) && all_digits(head, 10)
    } else {
        head.starts_with(|c: char| matches!(c, '1'..='9')) && all_digits(head, 10)
    };
    let mut tail_count = 0;
    let tail_ok = parts.all(|part| {
        tail_count += 1;
        let bytes = part.as_bytes();
        match bytes {
            [d] => d.is_ascii_digit(),
            [a, b] => matches!(a, b'0'..=b'5') && b.is_ascii_digit(),
            _ => false,
        }
    });
    head_ok && tail_ok && tail_count > 0
}

fn is_float(text: &str) -> bool {
    if matches!(text, ".nan" | ".NaN" | ".NAN") {
        return true;
    }
    let body = strip_sign(text);
    if matches!(body, ".inf" | ".Inf" | ".INF") {
        return true;
    }
    if body.contains(':') {
        return is_sexagesimal(body, true);
    }
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };
    if let Some(exp) = exponent {
        let digits = strip_sign(exp);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }
    if !has_digit(mantissa) {
        return false;
    }
    match mantissa.split_once('.') {
        // `[0-9][0-9_]*` before the point may be omitted, `.5` is a float
        Some((whole, frac)) => {
            (whole.is_empty() || whole.starts_with(|c: char| c.is_ascii_digit()))
                && all_digits(whole, 10)
                && all_digits(frac, 10)
        }
        // `1e3` and `089` have no point but still resolve as floats
        None => mantissa.starts_with(|c: char| c.is_ascii_digit()) && all_digits(mantissa, 10),
    }
}

fn take_digits(text: &str, min: usize, max: usize) -> Option<(&str, &str)> {
    let count = text.chars().take_while(|c| c.is_ascii_digit()).count();
    (min..=max).contains(&count).then(|| text.split_at(count))
}

fn is_timestamp(text: &str) -> bool {
    // YYYY-MM-DD
    if text.len() == 10 {
        if let Some((_, rest)) = take_digits(text, 4, 4) {
            let b = rest.as_bytes();
            if b.len() == 6
                && b[0] == b'-'
                && b[3] == b'-'
                && b[1..3].iter().chain(&b[4..6]).all(u8::is_ascii_digit)
            {
                return true;
            }
        }
    }
    is_datetime(text).unwrap_or(false)
}

/// `YYYY-M-D(T|t|[ \t]+)h:mm:ss(.frac)?(([ \t]*)Z|[-+]h(:mm)?)?`
fn is_datetime(text: &str) -> Option<bool> {
    let (_, rest) = take_digits(text, 4, 4)?;
    let rest = rest.strip_prefix('-')?;
    let (_, rest) = take_digits(rest, 1, 2)?;
    let rest = rest.strip_prefix('-')?;
    let (_, rest) = take_digits(rest, 1, 2)?;
    let rest = match rest.strip_prefix(['T', 't']) {
        Some(r) => r,
        None => {
            let trimmed = rest.trim_start_matches([' ', '\t']);
            if trimmed.len() == rest.len() {
                return Some(false);
            }
            trimmed
        }
    };
    let (_, rest) = take_digits(rest, 1, 2)?;
    let rest = rest.strip_prefix(':')?;
    let (_, rest) = take_digits(rest, 2, 2)?;
    let rest = rest.strip_prefix(':')?;
    let (_, mut rest) = take_digits(rest, 2, 2)?;
    if let Some(frac) = rest.strip_prefix('.') {
        rest = frac.trim_start_matches(|c: char| c.is_ascii_digit());
    }
    let zone = rest.trim_start_matches([' ', '\t']);
    if zone.is_empty() {
        return Some(rest.is_empty());
    }
    if zone == "Z" {
        return Some(true);
    }
    let offset = zone.strip_prefix(['-', '+'])?;
    let (_, tail) = take_digits(offset, 1, 2)?;
    if tail.is_empty() {
        return Some(true);
    }
    let tail = tail.strip_prefix(':')?;
    let (_, tail) = take_digits(tail, 2, 2)?;
    Some(tail.is_empty())
}
