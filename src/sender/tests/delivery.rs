use super::*;
use crate::compress::Compressor;
use crate::config::CompressEncoding;

#[tokio::test]
async fn test_accepted_content_is_delivered_once() {
    let transport = Arc::new(MockTransport::accepting());
    let sender = create_test_sender(test_config(), &transport);
    let mut events = sender.subscribe();

    sender.start().await.unwrap();
    sender.send_log("hello world").await.unwrap();

    let event = wait_for_event(&mut events, |e| matches!(e, Event::Delivered { .. })).await;
    assert_eq!(
        event,
        Event::Delivered {
            kind: ContentKind::Log,
            status: 200,
            bytes: 11,
        }
    );
    sender.stop().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body, b"hello world");
    assert_eq!(calls[0].category(), "Shipper");

    let stats = sender.stats();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.total_request_bytes, 11);
    assert_eq!(stats.accepted_responses, 1);
    assert_eq!(stats.total_failures, 0);
}

#[tokio::test]
async fn test_transient_failure_is_redelivered() {
    let transport = Arc::new(MockTransport::accepting().with_script([Step::Fail]));
    let sender = create_test_sender(test_config(), &transport);
    let mut events = sender.subscribe();

    sender.start().await.unwrap();
    sender.send_log("retry me").await.unwrap();

    wait_for_event(&mut events, |e| matches!(e, Event::Delivered { .. })).await;
    sender.stop().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.body == b"retry me"));

    let stats = sender.stats();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.total_failures, 1);
    assert_eq!(stats.accepted_responses, 1);
}

#[tokio::test]
async fn test_bad_request_gets_exactly_one_attempt() {
    let transport = Arc::new(MockTransport::accepting().with_script([Step::Status(400)]));
    let sender = create_test_sender(test_config(), &transport);
    let mut events = sender.subscribe();

    sender.start().await.unwrap();
    sender.send_log("malformed").await.unwrap();

    let dropped = wait_for_event(&mut events, |e| matches!(e, Event::Dropped { .. })).await;
    assert_eq!(
        dropped,
        Event::Dropped {
            kind: ContentKind::Log,
            bytes: 9,
            reason: DropReason::PermanentRejection,
        }
    );
    sender.stop().await.unwrap();

    assert_eq!(transport.call_count(), 1);
    let stats = sender.stats();
    assert_eq!(stats.rejected_responses, 1);
    assert_eq!(stats.accepted_responses, 0);
    assert!(
        !collect_events(&mut events)
            .iter()
            .any(|e| matches!(e, Event::Requeued { .. }))
    );
}

#[tokio::test]
async fn test_service_unavailable_is_requeued_and_redelivered() {
    let transport = Arc::new(MockTransport::accepting().with_script([Step::Status(503)]));
    let sender = create_test_sender(test_config(), &transport);
    let mut events = sender.subscribe();

    sender.start().await.unwrap();
    sender.send_log("busy").await.unwrap();

    let mut seen = Vec::new();
    loop {
        let event = wait_for_event(&mut events, |_| true).await;
        let delivered = matches!(event, Event::Delivered { .. });
        seen.push(event);
        if delivered {
            break;
        }
    }
    sender.stop().await.unwrap();

    assert_eq!(
        seen,
        vec![
            Event::Rejected {
                kind: ContentKind::Log,
                status: 503,
            },
            Event::Requeued {
                kind: ContentKind::Log,
                bytes: 4,
            },
            Event::Delivered {
                kind: ContentKind::Log,
                status: 200,
                bytes: 4,
            },
        ]
    );
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_throttling_statuses_are_retried() {
    let transport = Arc::new(
        MockTransport::accepting().with_script([Step::Status(429), Step::Status(504)]),
    );
    let sender = create_test_sender(test_config(), &transport);
    let mut events = sender.subscribe();

    sender.start().await.unwrap();
    sender.send_log("slow down").await.unwrap();
    wait_for_event(&mut events, |e| matches!(e, Event::Delivered { .. })).await;
    sender.stop().await.unwrap();

    assert_eq!(transport.call_count(), 3);
    assert_eq!(sender.stats().rejected_responses, 2);
}

#[tokio::test]
async fn test_negative_delay_drops_failed_content() {
    let transport = Arc::new(MockTransport::accepting().with_script([Step::Fail]));
    let mut config = test_config();
    config.sleep_before_requeue = -1;
    let sender = create_test_sender(config, &transport);
    let mut events = sender.subscribe();

    sender.start().await.unwrap();
    sender.send_log("gone").await.unwrap();

    let dropped = wait_for_event(&mut events, |e| matches!(e, Event::Dropped { .. })).await;
    assert!(matches!(
        dropped,
        Event::Dropped {
            reason: DropReason::RetryDisabled,
            ..
        }
    ));
    sender.stop().await.unwrap();

    assert_eq!(transport.call_count(), 1);
    assert_eq!(sender.stats().total_failures, 1);
}

#[tokio::test]
async fn test_stats_content_is_dropped_when_stats_disabled() {
    let transport = Arc::new(MockTransport::accepting());
    let sender = create_test_sender(test_config(), &transport);
    let mut events = sender.subscribe();

    sender.send_stats("requests=1").await.unwrap();
    sender.stop().await.unwrap();

    assert_eq!(transport.call_count(), 0);
    assert!(collect_events(&mut events).contains(&Event::Dropped {
        kind: ContentKind::Stats,
        bytes: 10,
        reason: DropReason::StatsDisabled,
    }));
}

#[tokio::test]
async fn test_stats_content_uses_stats_headers() {
    let transport = Arc::new(MockTransport::accepting());
    let mut config = test_config();
    config.stats_enabled = true;
    config.source_category = Some("prod/app".into());
    let sender = create_test_sender(config, &transport);

    sender.send_log("log line").await.unwrap();
    sender.send_stats("metric=1 1").await.unwrap();
    sender.stop().await.unwrap();

    let mut categories: Vec<String> = transport
        .calls()
        .iter()
        .map(|c| c.category().to_string())
        .collect();
    categories.sort();
    assert_eq!(categories, vec!["prod/app", "prod/app.stats"]);
}

#[tokio::test]
async fn test_compressed_body_is_sent_and_counted() {
    let transport = Arc::new(MockTransport::accepting());
    let mut config = test_config();
    config.compress = true;
    config.compress_encoding = CompressEncoding::Gzip;
    let sender = create_test_sender(config, &transport);

    let payload = "the same line again\n".repeat(50);
    sender.send_log(payload.clone()).await.unwrap();
    sender.stop().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].headers.get("content-encoding"), Some("gzip"));

    let decoded = Compressor::new(Some(CompressEncoding::Gzip))
        .decompress(&calls[0].body)
        .unwrap();
    assert_eq!(decoded, payload.as_bytes());

    let stats = sender.stats();
    assert_eq!(stats.total_request_bytes, payload.len() as u64);
    assert_eq!(stats.total_compressed_bytes, calls[0].body.len() as u64);
    assert!(stats.total_compressed_bytes < stats.total_request_bytes);
}
