// tests/notifier_tests.rs
mod common;

use antrian::{DispatchOutcome, EventKind, MemoryLedger, NotifierGateway, NotifyPolicy, OrderEvent, Recipient};
use common::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn completed(order_id: i64) -> OrderEvent {
  OrderEvent::Completed {
    order_id,
    buyer_id: "guest-a".to_string(),
  }
}

#[tokio::test]
async fn first_dispatch_connects_then_sends() {
  setup_tracing();
  let notifier = RecordingNotifier::new();
  let ledger = Arc::new(MemoryLedger::new());
  let gateway = NotifierGateway::new(notifier.clone(), ledger.clone(), fast_policy());

  assert_eq!(gateway.dispatch(&completed(1)).await, DispatchOutcome::Sent);
  assert_eq!(gateway.dispatch(&completed(2)).await, DispatchOutcome::Sent);
  // The connection is reused.
  assert_eq!(notifier.connects.load(Ordering::SeqCst), 1);
  assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn the_same_event_is_sent_at_most_once() {
  setup_tracing();
  let notifier = RecordingNotifier::new();
  let ledger = Arc::new(MemoryLedger::new());
  let gateway = NotifierGateway::new(notifier.clone(), ledger.clone(), fast_policy());

  assert_eq!(gateway.dispatch(&completed(1)).await, DispatchOutcome::Sent);
  assert_eq!(gateway.dispatch(&completed(1)).await, DispatchOutcome::Duplicate);
  assert_eq!(notifier.sent_to(&Recipient::Buyer("guest-a".to_string())).len(), 1);
  assert!(ledger.notification_claimed(1, EventKind::OrderCompleted));
}

#[tokio::test]
async fn dropped_connection_is_reestablished() {
  setup_tracing();
  let notifier = RecordingNotifier::new();
  let ledger = Arc::new(MemoryLedger::new());
  let gateway = NotifierGateway::new(notifier.clone(), ledger, fast_policy());

  gateway.dispatch(&completed(1)).await;
  notifier.fail_next_sends(2);
  assert_eq!(gateway.dispatch(&completed(2)).await, DispatchOutcome::Sent);
  // Initial connect plus one reconnect per failed send.
  assert_eq!(notifier.connects.load(Ordering::SeqCst), 3);
  assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn event_is_dropped_after_the_last_reconnect() {
  setup_tracing();
  let notifier = RecordingNotifier::new();
  let ledger = Arc::new(MemoryLedger::new());
  let policy = NotifyPolicy {
    max_reconnects: 1,
    ..fast_policy()
  };
  let gateway = NotifierGateway::new(notifier.clone(), ledger.clone(), policy);

  notifier.fail_next_sends(5);
  assert_eq!(gateway.dispatch(&completed(1)).await, DispatchOutcome::Dropped);
  assert!(notifier.sent().is_empty());
  // Not retried later either.
  assert_eq!(gateway.dispatch(&completed(1)).await, DispatchOutcome::Duplicate);
}

struct SlowNotifier;

#[async_trait::async_trait]
impl antrian::Notifier for SlowNotifier {
  async fn connect(&self) -> anyhow::Result<()> {
    Ok(())
  }

  fn is_connected(&self) -> bool {
    true
  }

  async fn send(&self, _recipient: &Recipient, _message: &str) -> anyhow::Result<()> {
    tokio::time::sleep(Duration::from_secs(60)).await;
    Ok(())
  }
}

#[tokio::test]
async fn hung_sends_are_cut_off_by_the_timeout() {
  setup_tracing();
  let ledger = Arc::new(MemoryLedger::new());
  let policy = NotifyPolicy {
    timeout: Duration::from_millis(20),
    max_reconnects: 1,
    reconnect_backoff: Duration::from_millis(1),
  };
  let gateway = NotifierGateway::new(Arc::new(SlowNotifier), ledger, policy);

  let started = std::time::Instant::now();
  assert_eq!(gateway.dispatch(&completed(1)).await, DispatchOutcome::Dropped);
  assert!(started.elapsed() < Duration::from_secs(5));
}
