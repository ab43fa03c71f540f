//! Content addressing of parameter maps.
//!
//! Neighbor search hashes *hypothetical* parameter maps and compares the
//! result against ids recorded by the job store. If the two sides disagree
//! on canonicalization by a single byte, every probe misses and nothing
//! fails. Every id in this workspace is therefore computed through a
//! [`ContentAddresser`], and stored ids are re-verified against it on load
//! ([`find_id_mismatches`]).
//!
//! [`SignacAddresser`] reproduces the signac job id:
//! `md5(json.dumps(parameters, sort_keys=True))`, which means
//! - keys sorted by code point at every nesting level,
//! - `", "` and `": "` separators,
//! - ASCII-only output (`\uXXXX`, lowercase hex, surrogate pairs),
//! - Python `repr` floats (`1.0`, `1e+20`, `1e-07`).
//!
//! Integers are exact up to `u64::MAX` (and down to `i64::MIN`). `serde_json`
//! reads any integer outside that range as an `f64`, so it is written as a
//! float (`100000000000000000000` becomes `1e+20`) and its id differs from
//! signac's. Stores holding such values fail id verification on load rather
//! than navigating with wrong ids.

use crate::params::{Job, JobId, ParameterMap};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt::Write as _;

/// Deterministic parameter-map → id function shared with the job store.
pub trait ContentAddresser: Send + Sync {
    fn calc_id(&self, parameters: &ParameterMap) -> JobId;
}

impl<T: ContentAddresser + ?Sized> ContentAddresser for &T {
    fn calc_id(&self, parameters: &ParameterMap) -> JobId {
        (**self).calc_id(parameters)
    }
}

/// The signac-compatible addresser (MD5 over sorted-key Python JSON).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignacAddresser;

impl ContentAddresser for SignacAddresser {
    fn calc_id(&self, parameters: &ParameterMap) -> JobId {
        let canonical = canonical_json(parameters);
        let hash = Md5::digest(canonical.as_bytes());
        JobId(hex_lower(&hash))
    }
}

/// Canonical text of a parameter map, as hashed by [`SignacAddresser`].
pub fn canonical_json(parameters: &ParameterMap) -> String {
    let mut out = String::new();
    write_object(&mut out, parameters);
    out
}

/// Canonical text of a single value.
///
/// Also used as the equality key when collecting schema domains.
pub fn canonical_value_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map),
    }
}

fn write_object(out: &mut String, map: &ParameterMap) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    out.push('{');
    for (idx, key) in keys.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        write_string(out, key);
        out.push_str(": ");
        if let Some(value) = map.get(key.as_str()) {
            write_value(out, value);
        }
    }
    out.push('}');
}

/// Integers outside the `i64`/`u64` range arrive here as floats.
fn write_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        let _ = write!(out, "{i}");
    } else if let Some(u) = n.as_u64() {
        let _ = write!(out, "{u}");
    } else if let Some(f) = n.as_f64() {
        out.push_str(&python_float_repr(f));
    } else {
        let _ = write!(out, "{n}");
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{unit:04x}");
                }
            }
        }
    }
    out.push('"');
}

/// Python `repr(float)`: shortest round-trip digits, positional notation for
/// decimal exponents in `-4..16`, otherwise `d.ddde±XX`.
fn python_float_repr(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sci = format!("{value:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exponent) {
        let point = exponent + 1;
        if point <= 0 {
            format!("{sign}0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
        } else {
            let point = point as usize;
            if point >= digits.len() {
                format!("{sign}{digits}{}.0", "0".repeat(point - digits.len()))
            } else {
                format!("{sign}{}.{}", &digits[..point], &digits[point..])
            }
        }
    } else {
        let (lead, rest) = digits.split_at(1);
        let mantissa = if rest.is_empty() {
            lead.to_string()
        } else {
            format!("{lead}.{rest}")
        };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{sign}{mantissa}e{exp_sign}{:02}", exponent.unsigned_abs())
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

/// A job whose recorded id is not the id of its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdMismatch {
    pub recorded: JobId,
    pub computed: JobId,
}

/// Every job whose recorded id disagrees with `addresser`, in input order.
pub fn find_id_mismatches<'a>(
    jobs: impl IntoIterator<Item = &'a Job>,
    addresser: &dyn ContentAddresser,
) -> Vec<IdMismatch> {
    jobs.into_iter()
        .filter_map(|job| {
            let computed = addresser.calc_id(&job.parameters);
            (computed != job.id).then(|| IdMismatch {
                recorded: job.id.clone(),
                computed,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ParameterMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn id_of(value: Value) -> String {
        SignacAddresser.calc_id(&map(value)).0
    }

    #[test]
    fn matches_signac_ids_for_simple_state_points() {
        assert_eq!(id_of(json!({"a": 1})), "42b7b4f2921788ea14dac5566e6f06d0");
        assert_eq!(id_of(json!({"a": 2})), "9f8a8e5ba8c70c774d410a9107e2a32b");
        assert_eq!(
            id_of(json!({"a": 1, "seed": 0})),
            "7af33fa439e2c0bb69e9f865563e13bd"
        );
        assert_eq!(
            id_of(json!({"seed": 1, "a": 2})),
            "53b5effad94d233cead26298d23a2832"
        );
        assert_eq!(id_of(json!({})), "99914b932bd37a50b983c5e7c90ae93b");
    }

    #[test]
    fn nested_maps_are_sorted_at_every_level() {
        assert_eq!(
            canonical_json(&map(json!({"b": {"d": 1, "c": []}}))),
            r#"{"b": {"c": [], "d": 1}}"#
        );
        assert_eq!(
            id_of(json!({"b": {"d": 1, "c": []}})),
            "866ad99073324333abc4070ead87d34e"
        );
    }

    #[test]
    fn mixed_value_kinds_use_python_json_text() {
        let params = map(json!({
            "x": 1.5,
            "y": 1e20,
            "z": 1e-7,
            "w": "h\u{e9}\u{2603}\u{1F600}\n\"q",
            "n": null,
            "t": true,
            "l": [1, [2.0, {"b": 1, "a": 0}]],
        }));
        assert_eq!(
            canonical_json(&params),
            r#"{"l": [1, [2.0, {"a": 0, "b": 1}]], "n": null, "t": true, "w": "h\u00e9\u2603\ud83d\ude00\n\"q", "x": 1.5, "y": 1e+20, "z": 1e-07}"#
        );
        assert_eq!(
            SignacAddresser.calc_id(&params).0,
            "234ac04ad6ba04a5da5d2dc2c63b6fde"
        );
    }

    #[test]
    fn control_characters_escape_like_python() {
        assert_eq!(
            id_of(json!({"s": "\u{7f}\u{01}\t"})),
            "42ab83c06f61b36b236532832ff33c2c"
        );
    }

    #[test]
    fn float_repr_switches_notation_at_python_thresholds() {
        assert_eq!(python_float_repr(1.0), "1.0");
        assert_eq!(python_float_repr(-0.5), "-0.5");
        assert_eq!(python_float_repr(0.0), "0.0");
        assert_eq!(python_float_repr(123456.789), "123456.789");
        assert_eq!(python_float_repr(1e15), "1000000000000000.0");
        assert_eq!(python_float_repr(1e16), "1e+16");
        assert_eq!(python_float_repr(0.0001), "0.0001");
        assert_eq!(python_float_repr(1e-5), "1e-05");
        assert_eq!(python_float_repr(1.25e-10), "1.25e-10");
    }

    #[test]
    fn integers_are_exact_only_within_u64() {
        let largest: Value = serde_json::from_str("18446744073709551615").expect("parses");
        assert_eq!(canonical_value_json(&largest), "18446744073709551615");
        let smallest: Value = serde_json::from_str("-9223372036854775808").expect("parses");
        assert_eq!(canonical_value_json(&smallest), "-9223372036854775808");

        let beyond: Value = serde_json::from_str("100000000000000000000").expect("parses");
        assert_eq!(canonical_value_json(&beyond), "1e+20");
    }

    #[test]
    fn signed_zero_keeps_its_sign() {
        assert_eq!(python_float_repr(-0.0), "-0.0");
        assert_ne!(id_of(json!({"a": -0.0})), id_of(json!({"a": 0.0})));
    }

    #[test]
    fn integer_and_float_values_address_differently() {
        assert_eq!(id_of(json!({"a": 1.0})), "4b8937963abc9e9148b4524d4f837b4b");
        assert_ne!(id_of(json!({"a": 1.0})), id_of(json!({"a": 1})));
        assert_eq!(
            id_of(json!({"a": 10_000_000_000_000_000_000u64})),
            "1af558184a7822b5a5e9355049a93b61"
        );
    }

    #[test]
    fn find_id_mismatches_reports_every_divergent_job() {
        let good = Job::new(
            JobId::new("42b7b4f2921788ea14dac5566e6f06d0"),
            map(json!({"a": 1})),
        );
        let bad_one = Job::new(JobId::new("bogus-1"), map(json!({"a": 2})));
        let bad_two = Job::new(JobId::new("bogus-2"), map(json!({"a": 3})));

        let mismatches = find_id_mismatches([&good, &bad_one, &bad_two], &SignacAddresser);
        assert_eq!(
            mismatches,
            vec![
                IdMismatch {
                    recorded: JobId::new("bogus-1"),
                    computed: JobId::new("9f8a8e5ba8c70c774d410a9107e2a32b"),
                },
                IdMismatch {
                    recorded: JobId::new("bogus-2"),
                    computed: JobId::new("14fb5d016557165019abaac200785048"),
                },
            ]
        );
    }
}
