//! Content hash of a geometry, reduced to a building number.
//!
//! The hash runs over the geometry's compact JSON text with members in the
//! order they were received, and numbers printed the way a browser's
//! `JSON.stringify` prints them. Two geometries that differ only in key
//! order therefore hash differently.

use serde_json::{Map, Number, Value};

use super::BUILDING_COUNT;

const DJB2_SEED: u32 = 5381;

/// DJB2 over UTF-16 code units: `h = h * 33 + c (mod 2^32)`
pub fn djb2(text: &str) -> u32 {
    text.encode_utf16().fold(DJB2_SEED, |h, c| {
        (h << 5).wrapping_add(h).wrapping_add(u32::from(c))
    })
}

/// Building number in 1..=BUILDING_COUNT
pub fn building_number(geometry: &Value) -> u32 {
    djb2(&geometry_text(geometry)) % BUILDING_COUNT + 1
}

/// Compact JSON text of a geometry
pub fn geometry_text(geometry: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, geometry);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(n)),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    out.push('{');
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    n.as_f64().map(format_f64).unwrap_or_else(|| n.to_string())
}

/// Shortest round-trip decimal, exponent form only below 1e-6 or at/above 1e21
fn format_f64(x: f64) -> String {
    if !x.is_finite() {
        return "null".to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    let abs = x.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{x}");
    }
    let s = format!("{x:e}");
    if s.contains("e-") {
        s
    } else {
        s.replacen('e', "e+", 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_djb2_known_values() {
        assert_eq!(djb2(""), 5381);
        assert_eq!(djb2("a"), 177_670);
        assert_eq!(djb2("hello"), 261_238_937);
    }

    #[test]
    fn test_djb2_utf16_units() {
        assert_eq!(djb2("é"), 177_806);
        // surrogate pair hashes as two units
        assert_eq!(djb2("😀"), 7_743_522);
    }

    #[test]
    fn test_geometry_text_compact() {
        let geometry = json!({"type": "Point", "coordinates": [102.6, 17.97]});
        assert_eq!(
            geometry_text(&geometry),
            r#"{"type":"Point","coordinates":[102.6,17.97]}"#
        );
    }

    #[test]
    fn test_geometry_text_numbers() {
        let geometry = json!([0.0, -0.0, 2.0, 1.5, 0.000001, 1e-7, 2.5e-8, 1e21, -3]);
        assert_eq!(
            geometry_text(&geometry),
            "[0,0,2,1.5,0.000001,1e-7,2.5e-8,1e+21,-3]"
        );
    }

    #[test]
    fn test_full_precision_coordinates_keep_received_text() {
        let geometry: Value =
            serde_json::from_str(r#"{"type":"Point","coordinates":[102.23325973832581,17.97]}"#)
                .unwrap();
        assert_eq!(
            geometry_text(&geometry),
            r#"{"type":"Point","coordinates":[102.23325973832581,17.97]}"#
        );
        assert_eq!(building_number(&geometry), 297);
    }

    #[test]
    fn test_geometry_text_strings() {
        let geometry = json!({"type": "Point", "name": "a\"b\\c\n\u{1}é"});
        assert_eq!(
            geometry_text(&geometry),
            "{\"type\":\"Point\",\"name\":\"a\\\"b\\\\c\\n\\u0001é\"}"
        );
    }

    #[test]
    fn test_building_numbers_match_browser() {
        let cases = [
            (json!({"type": "Point", "coordinates": [102.6, 17.97]}), 258),
            (json!({"type": "Point", "coordinates": [102.60001, 17.97]}), 515),
            (json!({"type": "Point", "coordinates": [-122.4194, 37.7749]}), 738),
            (
                json!({
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]]
                }),
                443,
            ),
        ];
        for (geometry, expected) in cases {
            assert_eq!(building_number(&geometry), expected, "{geometry}");
        }
    }

    #[test]
    fn test_key_order_changes_hash() {
        let a: Value = serde_json::from_str(r#"{"type":"Point","coordinates":[1,2]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"coordinates":[1,2],"type":"Point"}"#).unwrap();
        assert_ne!(geometry_text(&a), geometry_text(&b));
        assert_ne!(djb2(&geometry_text(&a)), djb2(&geometry_text(&b)));
    }

    #[test]
    fn test_float_literal_of_integer_matches_integer() {
        let a: Value = serde_json::from_str(r#"{"type":"Point","coordinates":[1.0,2.0]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"type":"Point","coordinates":[1,2]}"#).unwrap();
        assert_eq!(building_number(&a), building_number(&b));
    }

    #[test]
    fn test_nearby_points_mostly_differ() {
        let numbers: Vec<u32> = (0..200)
            .map(|i| {
                let lon = 102.6 + f64::from(i) * 0.00001;
                building_number(&json!({"type": "Point", "coordinates": [lon, 17.97]}))
            })
            .collect();

        let mut distinct = numbers.clone();
        distinct.sort_unstable();
        distinct.dedup();
        // 200 draws from 1000 buckets: expect well over 150 distinct values
        assert!(distinct.len() > 150, "only {} distinct", distinct.len());
        assert!(numbers.iter().all(|n| (1..=BUILDING_COUNT).contains(n)));
    }
}
