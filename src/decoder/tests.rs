//! Behaviour tests for the decoders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::error::{DecodeError, UserError};
use crate::registry::{Namespace, Registry};

fn text_array(elem: Option<&str>) -> CompositeDecoder {
    let decoder = array::ARRAY;
    match elem {
        Some(name) => decoder.with_element(
            Registry::global()
                .get(Namespace::TextSimple, name)
                .expect("registered text decoder"),
        ),
        None => decoder,
    }
}

fn ints(values: &[i64]) -> DecodedValue {
    DecodedValue::Array(values.iter().map(|&v| DecodedValue::Int(v)).collect())
}

fn texts(values: &[&str]) -> DecodedValue {
    DecodedValue::Array(values.iter().map(|&v| DecodedValue::from(v)).collect())
}

// ============================================================================
// Binary Scalar Tests
// ============================================================================

mod binary_scalars {
    use super::*;

    #[test]
    fn test_boolean() {
        assert_eq!(binary::BOOLEAN.decode(&DecodeRequest::binary(&[0])).unwrap(), DecodedValue::Bool(false));
        assert_eq!(binary::BOOLEAN.decode(&DecodeRequest::binary(&[1])).unwrap(), DecodedValue::Bool(true));
        assert_eq!(binary::BOOLEAN.decode(&DecodeRequest::binary(&[0x80])).unwrap(), DecodedValue::Bool(true));
    }

    #[test]
    fn test_empty_boolean_fails() {
        let err = binary::BOOLEAN
            .decode(&DecodeRequest::binary(&[]).at(2, 5))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidLength { tuple: 2, field: 5, length: 0, .. }
        ));
    }

    #[test]
    fn test_float8() {
        let bytes = (-0.125f64).to_be_bytes();
        assert_eq!(
            binary::FLOAT.decode(&DecodeRequest::binary(&bytes)).unwrap(),
            DecodedValue::Float(-0.125)
        );
    }

    #[test]
    fn test_float_rejects_int2_width() {
        let err = binary::FLOAT
            .decode(&DecodeRequest::binary(&[0, 1]).at(0, 1))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "wrong data for binary float decoder in tuple 0 field 1: length 2, expected 4 or 8"
        );
    }

    #[test]
    fn test_bytea_is_verbatim() {
        let data = [0u8, 0xff, b'\\', b'x'];
        assert_eq!(
            binary::BYTEA.decode(&DecodeRequest::binary(&data)).unwrap(),
            DecodedValue::Bytes(data.to_vec())
        );
        assert_eq!(
            binary::BYTEA.decode(&DecodeRequest::binary(&[])).unwrap(),
            DecodedValue::Bytes(Vec::new())
        );
    }
}

// ============================================================================
// Text Scalar Tests
// ============================================================================

mod text_scalars {
    use super::*;

    #[test]
    fn test_boolean_first_character() {
        for (input, expected) in [
            (&b"t"[..], true),
            (&b"true"[..], true),
            (&b"f"[..], false),
            (&b"false"[..], false),
            (&b"T"[..], false),
            (&b"1"[..], false),
        ] {
            assert_eq!(
                text::BOOLEAN.decode(&DecodeRequest::text(input)).unwrap(),
                DecodedValue::Bool(expected),
                "input {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_empty_boolean_fails() {
        let err = text::BOOLEAN
            .decode(&DecodeRequest::text(b"").at(1, 0))
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidLength { tuple: 1, field: 0, .. }));
    }

    #[test]
    fn test_integer() {
        assert_eq!(text::INTEGER.decode(&DecodeRequest::text(b"-42")).unwrap(), DecodedValue::Int(-42));
        assert_eq!(
            text::INTEGER
                .decode(&DecodeRequest::text(b"9223372036854775807"))
                .unwrap(),
            DecodedValue::Int(i64::MAX)
        );
    }

    #[test]
    fn test_integer_rejects_garbage() {
        let err = text::INTEGER
            .decode(&DecodeRequest::text(b"12abc").at(3, 4))
            .unwrap_err();
        match err {
            DecodeError::InvalidInteger { tuple, field, text, .. } => {
                assert_eq!((tuple, field), (3, 4));
                assert_eq!(text, "12abc");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(text::INTEGER.decode(&DecodeRequest::text(b"")).is_err());
    }

    #[test]
    fn test_float_prefix_wins() {
        assert_eq!(text::FLOAT.decode(&DecodeRequest::text(b"3.5")).unwrap(), DecodedValue::Float(3.5));
        assert_eq!(text::FLOAT.decode(&DecodeRequest::text(b"1e2x")).unwrap(), DecodedValue::Float(100.0));
    }

    #[test]
    fn test_text_uses_encoding() {
        let req = DecodeRequest::text(&[0x63, 0x61, 0x66, 0xe9]).with_encoding(TextEncoding::Latin1);
        assert_eq!(text::TEXT.decode(&req).unwrap(), DecodedValue::from("caf\u{e9}"));
        assert_eq!(
            text::TEXT.decode(&DecodeRequest::text("café".as_bytes())).unwrap(),
            DecodedValue::from("café")
        );
    }

    #[test]
    fn test_bytea_unescape() {
        assert_eq!(text::BYTEA.decode(&DecodeRequest::text(b"\\x41")).unwrap(), DecodedValue::Bytes(vec![0x41]));
        assert_eq!(text::BYTEA.decode(&DecodeRequest::text(b"\\101")).unwrap(), DecodedValue::Bytes(vec![0x41]));
        assert_eq!(text::BYTEA.decode(&DecodeRequest::text(b"\\x")).unwrap(), DecodedValue::Bytes(vec![]));

        let large: Vec<u8> = std::iter::once(&b"\\x"[..])
            .chain(std::iter::repeat(&b"ab"[..]).take(4096))
            .flatten()
            .copied()
            .collect();
        let decoded = text::BYTEA.decode(&DecodeRequest::text(&large)).unwrap();
        assert_eq!(decoded.as_bytes().map(<[u8]>::len), Some(4096));
    }
}

// ============================================================================
// Array Literal Tests
// ============================================================================

mod array_literals {
    use super::*;

    #[test]
    fn test_flat_integers() {
        let decoder = text_array(Some("Integer"));
        assert_eq!(decoder.decode(&DecodeRequest::text(b"{1,2,3}")).unwrap(), ints(&[1, 2, 3]));
    }

    #[test]
    fn test_empty() {
        let decoder = text_array(Some("Integer"));
        assert_eq!(decoder.decode(&DecodeRequest::text(b"{}")).unwrap(), ints(&[]));
    }

    #[test]
    fn test_null_elements() {
        let decoder = text_array(Some("Integer"));
        assert_eq!(
            decoder.decode(&DecodeRequest::text(b"{NULL,1,NULL}")).unwrap(),
            DecodedValue::Array(vec![DecodedValue::Null, DecodedValue::Int(1), DecodedValue::Null])
        );
    }

    #[test]
    fn test_quoted_null_is_text() {
        let decoder = text_array(None);
        assert_eq!(decoder.decode(&DecodeRequest::text(b"{\"NULL\",1}")).unwrap(), texts(&["NULL", "1"]));
    }

    #[test]
    fn test_null_is_case_sensitive() {
        let decoder = text_array(None);
        assert_eq!(
            decoder.decode(&DecodeRequest::text(b"{null,Null,NULL}")).unwrap(),
            DecodedValue::Array(vec!["null".into(), "Null".into(), DecodedValue::Null])
        );
    }

    #[test]
    fn test_nested() {
        let decoder = text_array(Some("Integer"));
        assert_eq!(
            decoder.decode(&DecodeRequest::text(b"{{1,2},{3,4}}")).unwrap(),
            DecodedValue::Array(vec![ints(&[1, 2]), ints(&[3, 4])])
        );
    }

    #[test]
    fn test_nested_empty_and_mixed() {
        let decoder = text_array(Some("Integer"));
        assert_eq!(
            decoder.decode(&DecodeRequest::text(b"{{},{{5}},{}}")).unwrap(),
            DecodedValue::Array(vec![ints(&[]), DecodedValue::Array(vec![ints(&[5])]), ints(&[])])
        );
    }

    #[test]
    fn test_recursion_depth_matches_nesting() {
        let req = DecodeRequest::text(b"{{{1}},{2}}");
        let mut parser = array::ArrayParser::new(&req, &text::INTEGER, DecodeConfig::new());
        parser.parse().unwrap();
        assert_eq!(parser.depth_reached(), 3);
    }

    #[test]
    fn test_escaped_quote_inside_quotes() {
        let decoder = text_array(None);
        assert_eq!(
            decoder.decode(&DecodeRequest::text(br#"{"a\"b",c}"#)).unwrap(),
            texts(&["a\"b", "c"])
        );
    }

    #[test]
    fn test_quoted_separators_and_backslash() {
        let decoder = text_array(None);
        assert_eq!(
            decoder
                .decode(&DecodeRequest::text(br#"{"x,y","{z}","back\\slash",""}"#))
                .unwrap(),
            texts(&["x,y", "{z}", "back\\slash", ""])
        );
    }

    #[test]
    fn test_elements_inherit_position() {
        let decoder = text_array(Some("Integer"));
        let err = decoder
            .decode(&DecodeRequest::text(b"{1,two}").at(7, 2))
            .unwrap_err();
        assert_eq!(err.position(), Some((7, 2)));
    }

    #[test]
    fn test_bytea_elements() {
        let decoder = text_array(Some("Bytea"));
        assert_eq!(
            decoder.decode(&DecodeRequest::text(br#"{"\\x41",NULL}"#)).unwrap(),
            DecodedValue::Array(vec![DecodedValue::Bytes(vec![0x41]), DecodedValue::Null])
        );
    }

    #[test]
    fn test_unterminated_strict() {
        let decoder = text_array(Some("Integer"));
        for input in [&b"{1,2"[..], &b"{{1},{2}"[..], &b"{\"abc"[..]] {
            let err = decoder.decode(&DecodeRequest::text(input)).unwrap_err();
            assert!(
                matches!(err, DecodeError::MalformedLiteral { .. }),
                "input {:?}: {:?}",
                String::from_utf8_lossy(input),
                err
            );
        }
        let err = decoder.decode(&DecodeRequest::text(b"1,2}")).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedLiteral { position: 0, .. }));
    }

    #[test]
    fn test_unterminated_lenient() {
        let decoder = text_array(Some("Integer")).with_config(DecodeConfig::lenient());
        // the element in progress is dropped
        assert_eq!(decoder.decode(&DecodeRequest::text(b"{1,2")).unwrap(), ints(&[1]));
        assert_eq!(
            decoder.decode(&DecodeRequest::text(b"{{1},{2")).unwrap(),
            DecodedValue::Array(vec![ints(&[1]), ints(&[])])
        );
        assert_eq!(decoder.decode(&DecodeRequest::text(b"")).unwrap(), ints(&[]));
        // the first byte is taken as the opening brace whatever it is
        assert_eq!(decoder.decode(&DecodeRequest::text(b"x1,2}")).unwrap(), ints(&[1, 2]));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        for config in [DecodeConfig::new(), DecodeConfig::lenient()] {
            let decoder = text_array(Some("Integer")).with_config(config);
            assert_eq!(decoder.decode(&DecodeRequest::text(b"{1}junk")).unwrap(), ints(&[1]));
            assert_eq!(
                decoder.decode(&DecodeRequest::text(b"{{1},{2}},{3}")).unwrap(),
                DecodedValue::Array(vec![ints(&[1]), ints(&[2])])
            );
        }
    }

    #[test]
    fn test_deserialized_zero_depth_accepts_flat_literals() {
        let config: DecodeConfig = serde_json::from_str(r#"{"max_array_depth": 0}"#).unwrap();
        let decoder = text_array(Some("Integer")).with_config(config);
        assert_eq!(decoder.decode(&DecodeRequest::text(b"{}")).unwrap(), ints(&[]));
        assert_eq!(decoder.decode(&DecodeRequest::text(b"{4,5}")).unwrap(), ints(&[4, 5]));
    }

    #[test]
    fn test_depth_limit() {
        let decoder = text_array(None).with_config(DecodeConfig::new().max_array_depth(2));
        assert!(decoder.decode(&DecodeRequest::text(b"{{a}}")).is_ok());
        let err = decoder.decode(&DecodeRequest::text(b"{{{a}}}").at(0, 3)).unwrap_err();
        assert!(matches!(err, DecodeError::NestingTooDeep { field: 3, limit: 2, .. }));
    }

    #[test]
    fn test_nested_composite_element() {
        // an element decoder may itself be composite
        let inner: Arc<Decoder> = Arc::new(text_array(Some("Integer")).into());
        let decoder = array::ARRAY.with_element(inner);
        assert_eq!(
            decoder.decode(&DecodeRequest::text(br#"{"{1,2}","{}"}"#)).unwrap(),
            DecodedValue::Array(vec![ints(&[1, 2]), ints(&[])])
        );
    }
}

// ============================================================================
// Custom Decoder Tests
// ============================================================================

mod custom_bridge {
    use super::*;

    #[derive(Debug)]
    struct Unparseable;

    impl std::fmt::Display for Unparseable {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("unparseable element")
        }
    }

    impl std::error::Error for Unparseable {}

    #[test]
    fn test_called_once_per_non_null_element() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let bridge = CustomDecoderBridge::from_fn(move |text, tuple, field| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(DecodedValue::Text(format!("{}:{}:{}", text.to_uppercase(), tuple, field)))
        });

        let decoder = array::ARRAY.with_custom(bridge);
        let value = decoder
            .decode(&DecodeRequest::text(br#"{a,NULL,"b c",{d}}"#).at(4, 1))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            value,
            DecodedValue::Array(vec![
                "A:4:1".into(),
                DecodedValue::Null,
                "B C:4:1".into(),
                DecodedValue::Array(vec!["D:4:1".into()]),
            ])
        );
    }

    #[test]
    fn test_receives_text_decoded_string() {
        let bridge = CustomDecoderBridge::from_fn(|text, _, _| Ok(DecodedValue::Int(text.chars().count() as i64)));
        let decoder = array::ARRAY.with_custom(bridge);
        let req = DecodeRequest::text(&[b'{', 0xe9, 0xe9, b'}']).with_encoding(TextEncoding::Latin1);
        assert_eq!(decoder.decode(&req).unwrap(), ints(&[2]));
    }

    #[test]
    fn test_element_decoder_takes_precedence() {
        let bridge = CustomDecoderBridge::from_fn(|_, _, _| -> Result<DecodedValue, UserError> {
            panic!("custom routine must not run when an element decoder is set")
        });
        let decoder = text_array(Some("Integer")).with_custom(bridge);
        assert_eq!(decoder.decode(&DecodeRequest::text(b"{1}")).unwrap(), ints(&[1]));
    }

    #[test]
    fn test_user_error_propagates() {
        let bridge = CustomDecoderBridge::from_fn(|_, _, _| Err(Box::new(Unparseable) as UserError));
        let decoder = array::ARRAY.with_custom(bridge);
        let err = decoder.decode(&DecodeRequest::text(b"{x}")).unwrap_err();
        assert!(err.is_user());
        assert_eq!(err.to_string(), "unparseable element");
        match err {
            DecodeError::User(inner) => assert!(inner.is::<Unparseable>()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_fallback() {
        let decoder = array::ARRAY;
        assert!(decoder.element().is_none());
        assert!(decoder.custom().is_none());
        assert_eq!(decoder.decode(&DecodeRequest::text(b"{1,x}")).unwrap(), texts(&["1", "x"]));
    }
}

// ============================================================================
// Cross-Mode Properties
// ============================================================================

mod cross_mode {
    use super::*;
    use proptest::prelude::*;

    fn decode_both(be_bytes: &[u8], literal: &str) -> (DecodedValue, DecodedValue) {
        (
            binary::INTEGER.decode(&DecodeRequest::binary(be_bytes)).unwrap(),
            text::INTEGER.decode(&DecodeRequest::text(literal.as_bytes())).unwrap(),
        )
    }

    proptest! {
        #[test]
        fn int2_agrees(v in any::<i16>()) {
            let (bin, txt) = decode_both(&v.to_be_bytes(), &v.to_string());
            prop_assert_eq!(bin, txt);
        }

        #[test]
        fn int4_agrees(v in any::<i32>()) {
            let (bin, txt) = decode_both(&v.to_be_bytes(), &v.to_string());
            prop_assert_eq!(bin, txt);
        }

        #[test]
        fn int8_agrees(v in any::<i64>()) {
            let (bin, txt) = decode_both(&v.to_be_bytes(), &v.to_string());
            prop_assert_eq!(bin, txt);
        }

        #[test]
        fn integer_rejects_other_widths(data in proptest::collection::vec(any::<u8>(), 0..16)) {
            prop_assume!(!matches!(data.len(), 2 | 4 | 8));
            let err = binary::INTEGER.decode(&DecodeRequest::binary(&data)).unwrap_err();
            let is_length_error = matches!(err, DecodeError::InvalidLength { length, .. } if length == data.len());
            prop_assert!(is_length_error);
        }

        #[test]
        fn float_rejects_other_widths(data in proptest::collection::vec(any::<u8>(), 0..16)) {
            prop_assume!(!matches!(data.len(), 4 | 8));
            let is_length_error = matches!(
                binary::FLOAT.decode(&DecodeRequest::binary(&data)),
                Err(DecodeError::InvalidLength { .. })
            );
            prop_assert!(is_length_error);
        }

        #[test]
        fn integer_arrays_decode_in_order(values in proptest::collection::vec(any::<i64>(), 0..20)) {
            let literal = format!(
                "{{{}}}",
                values.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
            );
            let decoded = text_array(Some("Integer"))
                .decode(&DecodeRequest::text(literal.as_bytes()))
                .unwrap();
            prop_assert_eq!(decoded, ints(&values));
        }
    }
}
