//! Tests for the server-sent result stream consumer.

#[path = "../common/mod.rs"]
mod common;

use common::{hit, scripted_stream, settle};
use zimreader::services::stream_consumer::{StreamConsumer, MAX_LINE_BYTES};
use zimreader::types::errors::StreamError;

#[tokio::test]
async fn test_results_arrive_in_server_order() {
    let (feeder, source) = scripted_stream();
    let mut handle = StreamConsumer::open(source);

    feeder.result(&hit("wiki", "A"));
    feeder.result(&hit("wiki", "B"));
    feeder.result(&hit("wiki", "A"));
    feeder.end();

    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "A"))));
    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "B"))));
    // duplicates are passed through untouched
    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "A"))));
    assert_eq!(handle.next().await, None);
    assert_eq!(handle.next().await, None);
}

#[tokio::test]
async fn test_done_sentinel_ends_stream() {
    let (feeder, source) = scripted_stream();
    let mut handle = StreamConsumer::open(source);

    feeder.result(&hit("wiki", "A"));
    feeder.raw("data: done\n\n");
    feeder.result(&hit("wiki", "late"));

    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "A"))));
    assert_eq!(handle.next().await, None);
}

#[tokio::test]
async fn test_server_close_without_end_marker_ends_stream() {
    let (feeder, source) = scripted_stream();
    let mut handle = StreamConsumer::open(source);

    feeder.result(&hit("wiki", "A"));
    drop(feeder);

    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "A"))));
    assert_eq!(handle.next().await, None);
}

#[tokio::test]
async fn test_events_split_across_chunks() {
    let (feeder, source) = scripted_stream();
    let mut handle = StreamConsumer::open(source);

    feeder.raw("da");
    feeder.raw("ta: {\"zim_id\":\"wiki\",\"pa");
    feeder.raw("th\":\"Caf\u{e9}\",\"title\":\"Caf\u{e9}\"}\n");
    feeder.raw("\nevent: end\n");
    feeder.raw("data: done\n\n");

    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "Caf\u{e9}"))));
    assert_eq!(handle.next().await, None);
}

#[tokio::test]
async fn test_undecodable_payload_is_skipped() {
    let (feeder, source) = scripted_stream();
    let mut handle = StreamConsumer::open(source);

    feeder.raw("data: {\"unexpected\":true}\n\n");
    feeder.result(&hit("wiki", "A"));
    feeder.end();

    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "A"))));
    assert_eq!(handle.next().await, None);
}

#[tokio::test]
async fn test_transport_error_is_terminal_and_reported_once() {
    let (feeder, source) = scripted_stream();
    let mut handle = StreamConsumer::open(source);

    feeder.result(&hit("wiki", "A"));
    feeder.fail("connection reset");
    feeder.result(&hit("wiki", "B"));

    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "A"))));
    match handle.next().await {
        Some(Err(StreamError::Transport(msg))) => assert!(msg.contains("connection reset")),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert_eq!(handle.next().await, None);
}

#[tokio::test]
async fn test_cancel_discards_buffered_results() {
    let (feeder, source) = scripted_stream();
    let mut handle = StreamConsumer::open(source);

    feeder.result(&hit("wiki", "A"));
    feeder.result(&hit("wiki", "B"));
    feeder.result(&hit("wiki", "C"));

    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "A"))));
    settle().await;

    handle.cancel();
    assert!(handle.is_finished());
    assert_eq!(handle.next().await, None);

    // idempotent
    handle.cancel();
    assert_eq!(handle.next().await, None);
}

#[tokio::test]
async fn test_canceller_from_another_task_unblocks_reader() {
    let (feeder, source) = scripted_stream();
    let mut handle = StreamConsumer::open(source);
    let canceller = handle.canceller();

    let reader = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(Ok(result)) = handle.next().await {
            seen.push(result);
        }
        seen
    });

    feeder.result(&hit("wiki", "A"));
    settle().await;
    canceller.cancel();
    canceller.cancel();
    feeder.result(&hit("wiki", "B"));

    let seen = reader.await.unwrap();
    assert_eq!(seen, vec![hit("wiki", "A")]);
    assert!(canceller.is_cancelled());
}

#[tokio::test]
async fn test_unterminated_line_past_limit_ends_stream() {
    let (feeder, source) = scripted_stream();
    let mut handle = StreamConsumer::open(source);

    feeder.result(&hit("wiki", "A"));
    feeder.raw(&format!("data: {}", "x".repeat(MAX_LINE_BYTES)));
    feeder.result(&hit("wiki", "B"));

    assert_eq!(handle.next().await, Some(Ok(hit("wiki", "A"))));
    assert_eq!(
        handle.next().await,
        Some(Err(StreamError::LineTooLong { limit: MAX_LINE_BYTES }))
    );
    assert_eq!(handle.next().await, None);
}
