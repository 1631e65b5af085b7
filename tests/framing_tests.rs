//! Round-trip and idempotence properties for the wire format (spec §8).

use streamhub::framing::{codes, decode_event, write_event, ErrorPayload, Event, DELIMITER};

#[tokio::test]
async fn event_encode_then_decode_round_trips() {
    let event = Event::new("a", vec![0x01, 0x02, 0x03]);

    let mut buf = Vec::new();
    write_event(&mut buf, &event).await.unwrap();
    assert_eq!(buf.pop(), Some(DELIMITER));

    let decoded = decode_event(&buf).unwrap();
    assert_eq!(decoded, event);
}

#[tokio::test]
async fn error_payload_round_trips_through_an_event() {
    let payload = ErrorPayload::with_topic(codes::TOPIC_NOT_AVAILABLE, "b");
    let event = Event::error(&payload).unwrap();

    let mut buf = Vec::new();
    write_event(&mut buf, &event).await.unwrap();
    buf.pop();

    let decoded_event = decode_event(&buf).unwrap();
    assert_eq!(decoded_event.topic, "error");

    let decoded_payload: ErrorPayload = serde_json::from_slice(&decoded_event.data).unwrap();
    assert_eq!(decoded_payload.code, codes::TOPIC_NOT_AVAILABLE);
}
