//! Wire codec for annotation messages.
//!
//! Payloads are UTF-8 JSON objects:
//! ```json
//! {"color":{"r":0,"g":0,"b":0,"a":1},"points":[{"x":0.1,"y":0.1}]}
//! {"clear":true}
//! ```
//! Strokes and clears may carry an extra `"session"` number. The decoder
//! tells the two kinds apart by the presence of the `clear` key versus the
//! `points` key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::stroke::{ClearDirective, Stroke, WireMessage};

const CLEAR_KEY: &str = "clear";
const POINTS_KEY: &str = "points";

#[derive(Serialize, Deserialize)]
struct ClearWire {
    clear: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<u64>,
}

/// Encode a stroke.
pub fn encode_stroke(stroke: &Stroke) -> Vec<u8> {
    // Plain data with string keys; serialization cannot fail
    serde_json::to_vec(stroke).unwrap_or_default()
}

/// Encode a clear directive.
pub fn encode_clear(clear: &ClearDirective) -> Vec<u8> {
    let wire = ClearWire {
        clear: true,
        session: clear.session,
    };
    serde_json::to_vec(&wire).unwrap_or_default()
}

/// Encode any wire message.
pub fn encode(message: &WireMessage) -> Vec<u8> {
    match message {
        WireMessage::Stroke(stroke) => encode_stroke(stroke),
        WireMessage::Clear(clear) => encode_clear(clear),
    }
}

/// Decode a payload. Never panics on malformed input.
pub fn decode(bytes: &[u8]) -> Result<WireMessage, DecodeError> {
    let text = std::str::from_utf8(bytes)?;
    let value: Value = serde_json::from_str(text)?;
    let Some(object) = value.as_object() else {
        return Err(DecodeError::UnknownKind);
    };

    if object.contains_key(CLEAR_KEY) {
        let wire: ClearWire = serde_json::from_value(value)?;
        if !wire.clear {
            return Err(DecodeError::InvalidClear);
        }
        return Ok(WireMessage::Clear(ClearDirective {
            session: wire.session,
        }));
    }

    if object.contains_key(POINTS_KEY) {
        let stroke: Stroke = serde_json::from_value(value)?;
        validate_stroke(&stroke)?;
        return Ok(WireMessage::Stroke(stroke));
    }

    Err(DecodeError::UnknownKind)
}

fn validate_stroke(stroke: &Stroke) -> Result<(), DecodeError> {
    if stroke.is_empty() {
        return Err(DecodeError::EmptyStroke);
    }
    for (field, value) in stroke.color.channels() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(DecodeError::OutOfRange {
                field,
                value: value as f64,
            });
        }
    }
    for point in &stroke.points {
        if !point.is_valid() {
            let (field, value) = if (0.0..=1.0).contains(&point.x) {
                ("y", point.y)
            } else {
                ("x", point.x)
            };
            return Err(DecodeError::OutOfRange { field, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::normalize::point;

    fn sample_stroke() -> Stroke {
        Stroke::new(
            Rgba::new(0.0, 0.5, 1.0, 1.0),
            vec![point(0.1, 0.1), point(0.2, 0.1), point(0.9, 0.9)],
        )
    }

    #[test]
    fn test_stroke_wire_format() {
        let stroke = Stroke::new(Rgba::BLACK, vec![point(0.25, 0.5)]);
        let json = String::from_utf8(encode_stroke(&stroke)).unwrap();
        assert_eq!(
            json,
            r#"{"color":{"r":0.0,"g":0.0,"b":0.0,"a":1.0},"points":[{"x":0.25,"y":0.5}]}"#
        );
    }

    #[test]
    fn test_clear_wire_format() {
        let json = String::from_utf8(encode_clear(&ClearDirective::new())).unwrap();
        assert_eq!(json, r#"{"clear":true}"#);

        let json = String::from_utf8(encode_clear(&ClearDirective::with_session(3))).unwrap();
        assert_eq!(json, r#"{"clear":true,"session":3}"#);
    }

    #[test]
    fn test_roundtrip_preserves_order_and_color() {
        let stroke = sample_stroke();
        let decoded = decode(&encode_stroke(&stroke)).unwrap();
        assert_eq!(decoded, WireMessage::Stroke(stroke));
    }

    #[test]
    fn test_roundtrip_lengths_and_colors() {
        let coords = [0.0, 1.0, 0.5, 0.25, 0.123, 0.9, 0.016, 0.92, 0.333, 0.75];
        let colors = [
            Rgba::BLACK,
            Rgba::WHITE,
            Rgba::new(0.0, 0.0, 0.0, 0.0),
            Rgba::new(0.92, 0.016, 0.5, 1.0),
            Rgba::new(0.1, 0.2, 0.3, 0.4),
        ];

        for color in colors {
            for len in 1..=10 {
                let points = (0..len)
                    .map(|i| point(coords[i], coords[(i + 3) % coords.len()]))
                    .collect();
                let stroke = Stroke::new(color, points);
                let decoded = decode(&encode_stroke(&stroke)).unwrap();
                assert_eq!(decoded, WireMessage::Stroke(stroke));
            }
        }
    }

    #[test]
    fn test_roundtrip_with_session() {
        let stroke = sample_stroke().with_session(7);
        let decoded = decode(&encode(&stroke.clone().into())).unwrap();
        assert_eq!(decoded, WireMessage::Stroke(stroke));
    }

    #[test]
    fn test_decode_integer_channels() {
        // Other senders may write whole numbers without a fraction
        let json = br#"{"color":{"r":0,"g":0,"b":0,"a":1},"points":[{"x":0,"y":1}]}"#;
        match decode(json).unwrap() {
            WireMessage::Stroke(stroke) => {
                assert_eq!(stroke.color, Rgba::BLACK);
                assert_eq!(stroke.points, vec![point(0.0, 1.0)]);
                assert_eq!(stroke.session, None);
            }
            other => panic!("expected stroke, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_clear_with_whitespace() {
        let decoded = decode(br#"{"clear": true}"#).unwrap();
        assert_eq!(decoded, WireMessage::Clear(ClearDirective::new()));
    }

    #[test]
    fn test_decode_clear_false_is_rejected() {
        assert!(matches!(
            decode(br#"{"clear":false}"#),
            Err(DecodeError::InvalidClear)
        ));
    }

    #[test]
    fn test_decode_unknown_kind() {
        assert!(matches!(decode(br#"{"color":{"r":0,"g":0,"b":0,"a":1}}"#), Err(DecodeError::UnknownKind)));
        assert!(matches!(decode(b"[1,2,3]"), Err(DecodeError::UnknownKind)));
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = encode_stroke(&sample_stroke());
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(decode(truncated), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(matches!(decode(&[0xff, 0xfe, 0x7b]), Err(DecodeError::InvalidUtf8(_))));
    }

    #[test]
    fn test_decode_empty_stroke() {
        let json = br#"{"color":{"r":0,"g":0,"b":0,"a":1},"points":[]}"#;
        assert!(matches!(decode(json), Err(DecodeError::EmptyStroke)));
    }

    #[test]
    fn test_decode_out_of_range() {
        let json = br#"{"color":{"r":2,"g":0,"b":0,"a":1},"points":[{"x":0.5,"y":0.5}]}"#;
        assert!(matches!(
            decode(json),
            Err(DecodeError::OutOfRange { field: "r", .. })
        ));

        let json = br#"{"color":{"r":0,"g":0,"b":0,"a":1},"points":[{"x":0.5,"y":-0.5}]}"#;
        assert!(matches!(
            decode(json),
            Err(DecodeError::OutOfRange { field: "y", .. })
        ));
    }

    #[test]
    fn test_decode_missing_color() {
        let json = br#"{"points":[{"x":0.5,"y":0.5}]}"#;
        assert!(matches!(decode(json), Err(DecodeError::Json(_))));
    }
}
