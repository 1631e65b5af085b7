//! Client-side dispatcher scenarios from spec §8.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use streamhub::client::Dispatcher;
use streamhub::framing::{Event, DELIMITER};

fn framed(events: &[Event]) -> Vec<u8> {
    let mut buf = Vec::new();
    for event in events {
        buf.extend(serde_json::to_vec(event).unwrap());
        buf.push(DELIMITER);
    }
    buf
}

#[tokio::test]
async fn scenario_wildcard_subscribe_fires_the_pattern_handler_once() {
    let mut dispatcher = Dispatcher::new(["people.*.firstname"]);
    let fire_count = Arc::new(AtomicUsize::new(0));
    let fire_count_clone = Arc::clone(&fire_count);

    dispatcher.on_pattern(
        "people.*.firstname",
        Arc::new(move |_event: &Event| {
            fire_count_clone.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let stream = framed(&[Event::new("people.1.firstname", vec![0xAB])]);
    dispatcher.run(stream.as_slice()).await.unwrap();

    assert_eq!(fire_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn multiple_records_in_one_stream_are_each_dispatched() {
    let mut dispatcher = Dispatcher::new(["a", "b"]);
    let seen = Arc::new(Mutex::new(Vec::new()));

    for topic in ["a", "b"] {
        let seen = Arc::clone(&seen);
        dispatcher.on_pattern(
            topic,
            Arc::new(move |event: &Event| {
                seen.lock().unwrap().push(event.topic.clone());
            }),
        );
    }

    let stream = framed(&[Event::new("a", vec![1]), Event::new("b", vec![2])]);
    dispatcher.run(stream.as_slice()).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
}
