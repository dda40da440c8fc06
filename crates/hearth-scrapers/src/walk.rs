//! Generic walk over embedded JSON payloads.
//!
//! The embedded data has no fixed schema, so extraction is a recursive
//! visit of every object in the tree, applying a platform's alias table at
//! each one. Within a single walk a field is set by the first alias that
//! parses and never overwritten afterwards; ambiguous or unparseable
//! values leave the field untouched.

use crate::config::PlatformAliases;
use crate::value::{parse_number, plausible_year};
use hearth_core::PartialRecord;
use serde_json::{Map, Value};

/// Depth-first visit of every JSON object in the tree. Arrays are
/// descended into; scalars are ignored. Terminates on the materialized
/// tree's own depth.
pub fn visit_objects<'a>(node: &'a Value, visit: &mut dyn FnMut(&'a Map<String, Value>)) {
    match node {
        Value::Object(map) => {
            visit(map);
            for child in map.values() {
                visit_objects(child, visit);
            }
        }
        Value::Array(items) => {
            for child in items {
                visit_objects(child, visit);
            }
        }
        _ => {}
    }
}

/// Numeric coercion: JSON numbers pass through, strings go through the
/// normalizer.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

pub fn value_to_i64(value: &Value) -> Option<i64> {
    value_to_f64(value).map(|v| v.trunc() as i64)
}

/// Quantity fields (price, beds, baths) cannot be negative; a negative
/// embedded value is noise, not data.
pub fn value_to_quantity(value: &Value) -> Option<f64> {
    value_to_f64(value).filter(|v| *v >= 0.0)
}

pub fn value_to_area(value: &Value) -> Option<i64> {
    value_to_i64(value).filter(|v| *v >= 0)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// Postal codes appear both as strings and as bare numbers.
fn value_to_postal(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        _ => value_to_string(value),
    }
}

/// Source-native ids must be purely numeric; similarly-named keys carry
/// free text on some pages.
fn value_to_digits(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_u64().map(|v| v.to_string()),
        Value::String(s) => {
            (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())).then(|| s.to_string())
        }
        _ => None,
    }
}

fn value_to_year(value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse::<i64>().ok()?
        }
        _ => return None,
    };
    let year = i32::try_from(year).ok()?;
    plausible_year(year).then_some(year)
}

fn fill<T>(slot: &mut Option<T>, map: &Map<String, Value>, keys: &[&str], parse: impl Fn(&Value) -> Option<T>) {
    if slot.is_some() {
        return;
    }
    for key in keys {
        if let Some(parsed) = map.get(*key).and_then(&parse) {
            *slot = Some(parsed);
            return;
        }
    }
}

fn collect_photos(map: &Map<String, Value>, aliases: &PlatformAliases, out: &mut PartialRecord) {
    for key in aliases.photos {
        let Some(value) = map.get(*key) else {
            continue;
        };
        match value {
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(url) => out.push_photo(url.clone()),
                        Value::Object(photo) => {
                            for url_key in aliases.photo_url_keys {
                                if let Some(url) =
                                    photo.get(*url_key).and_then(|v| v.as_str())
                                {
                                    out.push_photo(url);
                                    break;
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Value::String(url) => out.push_photo(url.clone()),
            _ => {}
        }
    }
}

/// Apply one platform's alias table to one JSON object, filling only
/// fields the walk has not populated yet.
pub fn apply_aliases(map: &Map<String, Value>, aliases: &PlatformAliases, out: &mut PartialRecord) {
    fill(&mut out.external_id, map, aliases.external_id, value_to_digits);

    fill(&mut out.address.street, map, aliases.street, value_to_string);
    fill(&mut out.address.unit, map, aliases.unit, value_to_string);
    fill(&mut out.address.city, map, aliases.city, value_to_string);
    fill(&mut out.address.region, map, aliases.region, value_to_string);
    fill(
        &mut out.address.postal_code,
        map,
        aliases.postal_code,
        value_to_postal,
    );

    fill(&mut out.list_price, map, aliases.price, value_to_quantity);
    fill(&mut out.bedroom_count, map, aliases.beds, value_to_quantity);
    fill(&mut out.bathroom_count, map, aliases.baths, value_to_quantity);
    fill(&mut out.interior_area, map, aliases.area, value_to_area);
    fill(&mut out.year_built, map, aliases.year_built, value_to_year);
    // coordinates keep their sign
    fill(&mut out.latitude, map, aliases.latitude, value_to_f64);
    fill(&mut out.longitude, map, aliases.longitude, value_to_f64);

    collect_photos(map, aliases, out);
}
