use fixture_messages::{BIG_INT, CATALOG, INNER, LEGACY, OUTER, message};
use prost_reflect::{DynamicMessage, MapKey, Value};
use reasonjson_core::json::{self, JsonCodec, MarshalOptions, UnsetMessage, UnmarshalOptions};
use std::collections::HashMap;

fn text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("codec output is UTF-8")
}

fn inner(inner_string: &str, inner_int: i32, floats: &[f32]) -> DynamicMessage {
    let mut inner = DynamicMessage::new(message(INNER));
    inner.set_field_by_name("inner_string", Value::String(inner_string.to_string()));
    inner.set_field_by_name("inner_int", Value::I32(inner_int));
    inner.set_field_by_name("inner_bool", Value::Bool(false));
    inner.set_field_by_name(
        "inner_repeated_float",
        Value::List(floats.iter().copied().map(Value::F32).collect()),
    );
    inner
}

fn catalog() -> DynamicMessage {
    let mut catalog = DynamicMessage::new(message(CATALOG));

    let counts: HashMap<MapKey, Value> = [("zeta", 26), ("alpha", 1), ("mid", 13)]
        .into_iter()
        .map(|(k, v)| (MapKey::String(k.to_string()), Value::I32(v)))
        .collect();
    catalog.set_field_by_name("counts", Value::Map(counts));

    let labels: HashMap<MapKey, Value> = [(10, "ten"), (-1, "minus one"), (2, "two")]
        .into_iter()
        .map(|(k, v)| (MapKey::I32(k), Value::String(v.to_string())))
        .collect();
    catalog.set_field_by_name("labels", Value::Map(labels));

    catalog.set_field_by_name("detail", Value::Message(inner("chosen", 7, &[])));
    catalog.set_field_by_name("payload", Value::Bytes(b"hi".to_vec().into()));
    catalog.set_field_by_name(
        "items",
        Value::List(vec![
            Value::Message(inner("first", 1, &[0.5])),
            Value::Message(inner("second", 2, &[])),
        ]),
    );
    catalog.set_field_by_name("http_status", Value::I32(404));
    catalog
}

#[test]
fn zero_value_emits_every_field() {
    let outer = DynamicMessage::new(message(OUTER));

    let out = json::marshal_message(&outer).unwrap();

    assert_eq!(text(out), r#"{"outer_string":"","inner":null,"status":0}"#);
}

#[test]
fn populated_message_in_declaration_order() {
    let mut outer = DynamicMessage::new(message(OUTER));
    outer.set_field_by_name("outer_string", Value::String("outer_string".to_string()));
    outer.set_field_by_name("status", Value::EnumNumber(2));

    let out = json::marshal_message(&outer).unwrap();
    assert_eq!(
        text(out),
        r#"{"outer_string":"outer_string","inner":null,"status":2}"#
    );

    outer.set_field_by_name("status", Value::EnumNumber(1));
    outer.set_field_by_name("inner", Value::Message(inner("inner_string", 12, &[1.1, 2.2, 3.3])));

    let out = json::marshal_message(&outer).unwrap();
    assert_eq!(
        text(out),
        r#"{"outer_string":"outer_string","inner":{"inner_string":"inner_string","inner_int":12,"inner_bool":false,"inner_repeated_float":[1.1,2.2,3.3]},"status":1}"#
    );
}

#[test]
fn set_but_empty_nested_message_is_an_object() {
    let mut outer = DynamicMessage::new(message(OUTER));
    outer.set_field_by_name("inner", Value::Message(DynamicMessage::new(message(INNER))));

    let out: serde_json::Value = serde_json::from_slice(&json::marshal_message(&outer).unwrap()).unwrap();

    assert_eq!(
        out["inner"],
        serde_json::json!({
            "inner_string": "",
            "inner_int": 0,
            "inner_bool": false,
            "inner_repeated_float": []
        })
    );
}

#[test]
fn map_keys_are_sorted_and_output_is_stable() {
    let catalog = catalog();

    let first = text(json::marshal_message(&catalog).unwrap());
    let second = text(json::marshal_message(&catalog).unwrap());
    assert_eq!(first, second);

    assert!(first.contains(r#""counts":{"alpha":1,"mid":13,"zeta":26}"#));
    assert!(first.contains(r#""labels":{"-1":"minus one","2":"two","10":"ten"}"#));
}

#[test]
fn oneof_writes_only_the_populated_member() {
    let catalog = catalog();
    let out: serde_json::Value =
        serde_json::from_slice(&json::marshal_message(&catalog).unwrap()).unwrap();

    assert_eq!(out["detail"]["inner_string"], "chosen");
    assert!(out.get("text").is_none());

    let mut texted = catalog.clone();
    texted.set_field_by_name("text", Value::String("plain".to_string()));
    let out: serde_json::Value =
        serde_json::from_slice(&json::marshal_message(&texted).unwrap()).unwrap();

    assert_eq!(out["text"], "plain");
    assert!(out.get("detail").is_none());
}

#[test]
fn unpopulated_oneof_is_skipped() {
    let empty = DynamicMessage::new(message(CATALOG));
    let out: serde_json::Value =
        serde_json::from_slice(&json::marshal_message(&empty).unwrap()).unwrap();

    assert!(out.get("text").is_none());
    assert!(out.get("detail").is_none());
    assert_eq!(out["counts"], serde_json::json!({}));
    assert_eq!(out["items"], serde_json::json!([]));
    assert_eq!(out["payload"], "");
}

#[test]
fn bytes_are_base64() {
    let out: serde_json::Value =
        serde_json::from_slice(&json::marshal_message(&catalog()).unwrap()).unwrap();
    assert_eq!(out["payload"], "aGk=");
}

#[test]
fn round_trip_restores_maps_oneofs_and_lists() {
    let original = catalog();
    let encoded = json::marshal_message(&original).unwrap();

    let mut decoded = DynamicMessage::new(message(CATALOG));
    json::unmarshal_message(&encoded, &mut decoded).unwrap();

    assert!(decoded.has_field_by_name("detail"));
    assert!(!decoded.has_field_by_name("text"));
    assert_eq!(
        decoded.get_field_by_name("payload").unwrap().as_bytes().unwrap().as_ref(),
        b"hi"
    );
    let labels = decoded.get_field_by_name("labels").unwrap();
    assert_eq!(
        labels.as_map().unwrap().get(&MapKey::I32(10)),
        Some(&Value::String("ten".to_string()))
    );
    assert_eq!(json::marshal_message(&decoded).unwrap(), encoded);
}

#[test]
fn round_trip_of_canonical_outer_text() {
    for input in [
        r#"{"outer_string":"","inner":null,"status":0}"#,
        r#"{"outer_string":"outer_string","inner":null,"status":2}"#,
        r#"{"outer_string":"outer_string","inner":{"inner_string":"inner_string","inner_int":12,"inner_bool":true,"inner_repeated_float":[1.1,2.2,3.3]},"status":1}"#,
    ] {
        let mut outer = DynamicMessage::new(message(OUTER));
        json::unmarshal_message(input.as_bytes(), &mut outer).unwrap();

        assert_eq!(text(json::marshal_message(&outer).unwrap()), input);
    }
}

#[test]
fn unknown_keys_are_discarded() {
    let mut outer = DynamicMessage::new(message(OUTER));
    json::unmarshal_message(br#"{"outer_string":"x","not_a_field":[1,2]}"#, &mut outer).unwrap();

    assert_eq!(
        outer.get_field_by_name("outer_string").unwrap().as_str(),
        Some("x")
    );
}

#[test]
fn malformed_json_is_a_parse_error() {
    let mut outer = DynamicMessage::new(message(OUTER));
    let err = json::unmarshal_message(br#"{"outer_string":"#, &mut outer).unwrap_err();

    assert!(err.is_parse());
}

#[test]
fn canonical_mode_quotes_64_bit_integers() {
    let mut big = DynamicMessage::new(message(BIG_INT));
    big.set_field_by_name("bigint_int64", Value::I64(1));
    big.set_field_by_name("bigint_uint64", Value::U64(5));

    assert_eq!(
        text(json::marshal_message(&big).unwrap()),
        r#"{"bigint_int64":"1","bigint_fixed64":"0","bigint_sfixed64":"0","bigint_sint64":"0","bigint_uint64":"5"}"#
    );
}

#[test]
fn legacy_mode_writes_64_bit_integers_as_numbers() {
    let zero = DynamicMessage::new(message(BIG_INT));
    assert_eq!(
        text(json::marshal_message_legacy(&zero).unwrap()),
        r#"{"bigint_fixed64":0,"bigint_int64":0,"bigint_sfixed64":0,"bigint_sint64":0,"bigint_uint64":0}"#
    );

    let mut big = DynamicMessage::new(message(BIG_INT));
    big.set_field_by_name("bigint_int64", Value::I64(1));
    big.set_field_by_name("bigint_fixed64", Value::U64(2));
    big.set_field_by_name("bigint_sfixed64", Value::I64(3));
    big.set_field_by_name("bigint_sint64", Value::I64(4));
    big.set_field_by_name("bigint_uint64", Value::U64(5));

    assert_eq!(
        text(json::marshal_message_legacy(&big).unwrap()),
        r#"{"bigint_fixed64":2,"bigint_int64":1,"bigint_sfixed64":3,"bigint_sint64":4,"bigint_uint64":5}"#
    );
}

#[test]
fn legacy_mode_writes_unset_messages_as_empty_objects() {
    let outer = DynamicMessage::new(message(OUTER));

    assert_eq!(
        text(json::marshal_message_legacy(&outer).unwrap()),
        r#"{"inner":{},"outer_string":"","status":0}"#
    );
}

#[test]
fn legacy_mode_widens_floats_to_double() {
    let inner = inner("f", 1, &[1.1, 0.5]);

    assert_eq!(
        text(json::marshal_message_legacy(&inner).unwrap()),
        r#"{"inner_bool":false,"inner_int":1,"inner_repeated_float":[1.100000023841858,0.5],"inner_string":"f"}"#
    );
}

#[test]
fn well_known_types_use_their_own_mapping_only_in_canonical_mode() {
    let timestamp = prost_types::Timestamp {
        seconds: 1,
        nanos: 0,
    };

    assert_eq!(
        text(json::marshal_message(&timestamp).unwrap()),
        r#""1970-01-01T00:00:01Z""#
    );
    assert_eq!(
        text(json::marshal_message_legacy(&timestamp).unwrap()),
        r#"{"nanos":0,"seconds":1}"#
    );
}

#[test]
fn custom_options_mix_modes() {
    let options = MarshalOptions::canonical()
        .stringify_64_bit_integers(false)
        .unset_message(UnsetMessage::EmptyObject);
    let codec = JsonCodec::new(options, UnmarshalOptions::default());

    let mut big = DynamicMessage::new(message(BIG_INT));
    big.set_field_by_name("bigint_int64", Value::I64(9));
    let out: serde_json::Value = serde_json::from_slice(&codec.marshal_dynamic(&big).unwrap()).unwrap();
    assert_eq!(out["bigint_int64"], 9);

    let outer = DynamicMessage::new(message(OUTER));
    assert_eq!(
        text(codec.marshal_dynamic(&outer).unwrap()),
        r#"{"outer_string":"","inner":{},"status":0}"#
    );
}

#[test]
fn unset_proto2_scalars_are_null() {
    let mut legacy = DynamicMessage::new(message(LEGACY));
    assert_eq!(
        text(json::marshal_message(&legacy).unwrap()),
        r#"{"retries":null,"name":null,"tags":[]}"#
    );

    legacy.set_field_by_name("retries", Value::I32(5));
    assert_eq!(
        text(json::marshal_message(&legacy).unwrap()),
        r#"{"retries":5,"name":null,"tags":[]}"#
    );
}

#[test]
fn non_finite_floats_are_named() {
    let inner = inner("", 0, &[f32::NAN, f32::INFINITY, 1.5]);
    let out: serde_json::Value = serde_json::from_slice(&json::marshal_message(&inner).unwrap()).unwrap();

    assert_eq!(
        out["inner_repeated_float"],
        serde_json::json!(["NaN", "Infinity", 1.5])
    );
}

#[test]
fn schema_less_values_use_plain_json() {
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
    struct Plain {
        name: String,
        count: u64,
    }

    let plain = Plain {
        name: "a".to_string(),
        count: u64::MAX,
    };
    let out = json::marshal(&plain).unwrap();
    assert_eq!(text(out.clone()), r#"{"name":"a","count":18446744073709551615}"#);

    let back: Plain = json::unmarshal(&out).unwrap();
    assert_eq!(back, plain);
}

#[test]
fn generated_types_decode_through_the_schema() {
    let mut outer = fixture_messages::Outer::default();
    json::unmarshal_reflect(
        br#"{"outer_string":"hello","inner":{"inner_int":3},"status":2}"#,
        &mut outer,
    )
    .unwrap();

    assert_eq!(outer.outer_string, "hello");
    assert_eq!(outer.status, 2);
    assert_eq!(outer.inner.as_ref().map(|inner| inner.inner_int), Some(3));

    assert_eq!(
        text(json::marshal_message(&outer).unwrap()),
        r#"{"outer_string":"hello","inner":{"inner_string":"","inner_int":3,"inner_bool":false,"inner_repeated_float":[]},"status":2}"#
    );
}

#[test]
fn empty_slots_are_allocated_before_decoding() {
    let mut slot: Option<fixture_messages::Inner> = None;
    json::unmarshal_slot(br#"{"inner_string":"made","inner_bool":"true"}"#, &mut slot).unwrap();

    let inner = slot.expect("slot is allocated");
    assert_eq!(inner.inner_string, "made");
    assert!(inner.inner_bool);
}
