use super::*;

// =============================================================
// PixelRecord
// =============================================================

#[test]
fn pixel_record_decodes_short_field_names() {
    let record: PixelRecord =
        serde_json::from_str(r#"{"x":3,"y":4,"c":"ff0000","p":"alice","t":"2024-05-01T12:00:00Z"}"#).expect("decode");
    assert_eq!(record.x, 3);
    assert_eq!(record.y, 4);
    assert_eq!(record.color.as_deref(), Some("ff0000"));
    assert_eq!(record.author.as_deref(), Some("alice"));
    assert_eq!(record.timestamp_ms(), Some(1_714_564_800_000));
}

#[test]
fn pixel_record_tolerates_missing_and_null_fields() {
    let record: PixelRecord = serde_json::from_str(r#"{"x":0,"y":0,"p":null}"#).expect("decode");
    assert!(record.color.is_none());
    assert!(record.author.is_none());
    assert!(record.timestamp.is_none());
    assert!(record.timestamp_ms().is_none());
}

#[test]
fn pixel_record_keeps_negative_coordinates() {
    let record: PixelRecord = serde_json::from_str(r#"{"x":-1,"y":7,"c":"000000"}"#).expect("decode");
    assert_eq!(record.x, -1);
}

// =============================================================
// Envelope
// =============================================================

#[test]
fn envelope_decodes_placement() {
    let env = decode_envelope(r#"{"type":"placement","data":{"x":1,"y":2,"c":"00FF00","p":"bob"}}"#).expect("decode");
    let Envelope::Placement(record) = env else {
        panic!("expected placement, got {env:?}");
    };
    assert_eq!((record.x, record.y), (1, 2));
    assert_eq!(record.author.as_deref(), Some("bob"));
}

#[test]
fn envelope_decodes_broadcast_and_user_count() {
    let env = decode_envelope(r#"{"type":"broadcast","data":{"username":"Alice","info":"be nice"}}"#).expect("decode");
    assert_eq!(
        env,
        Envelope::Broadcast {
            username: "Alice".to_owned(),
            info: "be nice".to_owned(),
        }
    );

    let env = decode_envelope(r#"{"type":"user_count","data":12}"#).expect("decode");
    assert_eq!(env, Envelope::UserCount(12));
}

#[test]
fn envelope_rejects_unknown_type() {
    let err = decode_envelope(r#"{"type":"nope","data":{}}"#).expect_err("unknown type");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn envelope_encode_uses_adjacent_tagging() {
    let text = encode_envelope(&Envelope::UserCount(3)).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["type"], "user_count");
    assert_eq!(value["data"], 3);
}

// =============================================================
// Bulk load
// =============================================================

#[test]
fn decode_board_preserves_delivery_order() {
    let body = br#"[{"x":0,"y":0,"c":"111111"},{"x":0,"y":0,"c":"222222"},{"x":1,"y":0,"c":"333333"}]"#;
    let records = decode_board(body).expect("decode");
    let colors: Vec<_> = records.iter().filter_map(|r| r.color.as_deref()).collect();
    assert_eq!(colors, vec!["111111", "222222", "333333"]);
}

#[test]
fn decode_board_rejects_non_array() {
    assert!(decode_board(br#"{"x":0}"#).is_err());
}

// =============================================================
// SubmitResponse
// =============================================================

#[test]
fn submit_response_success_statuses() {
    assert_eq!(SubmitResponse::from_http(200, None, ""), SubmitResponse::Ok);
    assert_eq!(SubmitResponse::from_http(204, None, "ignored"), SubmitResponse::Ok);
}

#[test]
fn submit_response_rate_limit_reads_retry_after() {
    assert_eq!(
        SubmitResponse::from_http(429, Some(" 10 "), ""),
        SubmitResponse::RateLimited { retry_after_secs: 10 }
    );
}

#[test]
fn submit_response_rate_limit_falls_back_to_default() {
    assert_eq!(
        SubmitResponse::from_http(429, Some("Wed, 21 Oct 2015 07:28:00 GMT"), ""),
        SubmitResponse::RateLimited {
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS
        }
    );
    assert_eq!(
        SubmitResponse::from_http(429, None, ""),
        SubmitResponse::RateLimited {
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS
        }
    );
}

#[test]
fn submit_response_error_uses_body_or_status() {
    assert_eq!(
        SubmitResponse::from_http(400, None, "  bad pixel \n"),
        SubmitResponse::Error {
            message: "bad pixel".to_owned()
        }
    );
    assert_eq!(
        SubmitResponse::from_http(503, None, ""),
        SubmitResponse::Error {
            message: "HTTP 503".to_owned()
        }
    );
}

#[test]
fn submit_request_serializes_short_keys() {
    let req = SubmitRequest {
        x: 1,
        y: 2,
        c: "ABCDEF".to_owned(),
        p: "carol".to_owned(),
        t: "2024-01-01T00:00:00Z".to_owned(),
    };
    let value = serde_json::to_value(&req).expect("json");
    assert_eq!(value, serde_json::json!({"x":1,"y":2,"c":"ABCDEF","p":"carol","t":"2024-01-01T00:00:00Z"}));
}

// =============================================================
// Timestamps
// =============================================================

#[test]
fn parse_timestamp_without_offset_is_utc() {
    assert_eq!(parse_timestamp("2024-05-01T12:00:00"), Some(1_714_564_800_000));
}

#[test]
fn parse_timestamp_keeps_milliseconds() {
    assert_eq!(parse_timestamp("1970-01-01T00:00:01.250Z"), Some(1_250));
}

#[test]
fn parse_timestamp_rejects_garbage() {
    assert!(parse_timestamp("").is_none());
    assert!(parse_timestamp("yesterday").is_none());
}

#[test]
fn format_timestamp_is_rfc3339() {
    let text = format_timestamp(1_714_564_800_000).expect("format");
    assert_eq!(parse_timestamp(&text), Some(1_714_564_800_000));
    assert!(text.starts_with("2024-05-01T12:00:00"));
}
