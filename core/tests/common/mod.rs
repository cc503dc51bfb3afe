// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset.

use antrian::{
  CartLine, ContextData, DeliveryInfo, KioskId, ManualClock, MemoryLedger, Notifier, NotifyPolicy, OperatorId, Order,
  OrderId, OrderStatus, PaymentOutcome, PipelineControl, PipelineError, QueueService, QueueSettings, Recipient,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

// --- Tracing Setup (once per test binary) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Pipeline engine fixtures ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Pipeline engine error: {0}")]
  Engine(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(err: PipelineError) -> Self {
    TestError::Engine(format!("{:?}", err))
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> antrian::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = step_name, counter = guard.counter, "executed");
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> antrian::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      tracing::warn!(target: "test_handlers", step = step_name, "failing with: '{}'", error_message);
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

// --- Notifiers ---

/// Records every message; can be told to fail the next N sends, which drops
/// the connection like a broken socket would.
#[derive(Default)]
pub struct RecordingNotifier {
  connected: AtomicBool,
  pub connects: AtomicUsize,
  failures_left: AtomicUsize,
  sent: Mutex<Vec<(Recipient, String)>>,
}

impl RecordingNotifier {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn fail_next_sends(&self, n: usize) {
    self.failures_left.store(n, Ordering::SeqCst);
  }

  pub fn sent(&self) -> Vec<(Recipient, String)> {
    self.sent.lock().clone()
  }

  pub fn sent_to(&self, recipient: &Recipient) -> Vec<String> {
    self
      .sent
      .lock()
      .iter()
      .filter(|(r, _)| r == recipient)
      .map(|(_, m)| m.clone())
      .collect()
  }
}

#[async_trait]
impl Notifier for RecordingNotifier {
  async fn connect(&self) -> anyhow::Result<()> {
    self.connects.fetch_add(1, Ordering::SeqCst);
    self.connected.store(true, Ordering::SeqCst);
    Ok(())
  }

  fn is_connected(&self) -> bool {
    self.connected.load(Ordering::SeqCst)
  }

  async fn send(&self, recipient: &Recipient, message: &str) -> anyhow::Result<()> {
    if !self.is_connected() {
      anyhow::bail!("not connected");
    }
    let failing = self
      .failures_left
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if failing {
      self.connected.store(false, Ordering::SeqCst);
      anyhow::bail!("connection reset by peer");
    }
    self.sent.lock().push((recipient.clone(), message.to_string()));
    Ok(())
  }
}

/// A channel that can never be reached.
#[derive(Default)]
pub struct UnreachableNotifier {
  pub connects: AtomicUsize,
}

#[async_trait]
impl Notifier for UnreachableNotifier {
  async fn connect(&self) -> anyhow::Result<()> {
    self.connects.fetch_add(1, Ordering::SeqCst);
    anyhow::bail!("channel host unreachable")
  }

  fn is_connected(&self) -> bool {
    false
  }

  async fn send(&self, _recipient: &Recipient, _message: &str) -> anyhow::Result<()> {
    anyhow::bail!("not connected")
  }
}

// --- Queue harness ---

pub const KIOSK: KioskId = 1;
pub const OPERATOR: OperatorId = 100;
pub const OTHER_KIOSK: KioskId = 2;
pub const OTHER_OPERATOR: OperatorId = 200;

pub fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn fast_policy() -> NotifyPolicy {
  NotifyPolicy {
    timeout: Duration::from_millis(200),
    max_reconnects: 2,
    reconnect_backoff: Duration::from_millis(1),
  }
}

pub fn cart_line(menu_item_id: i64, kiosk_id: KioskId, price: i64, minutes: i32, quantity: i32) -> CartLine {
  CartLine {
    menu_item_id,
    name: format!("Menu {}", menu_item_id),
    price,
    estimated_minutes: minutes,
    quantity,
    kiosk_id,
  }
}

pub struct Harness {
  pub service: QueueService,
  pub ledger: Arc<MemoryLedger>,
  pub clock: Arc<ManualClock>,
  pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
  harness_with_page_size(20)
}

pub fn harness_with_page_size(page_size: u32) -> Harness {
  setup_tracing();
  let ledger = Arc::new(MemoryLedger::new());
  ledger.add_kiosk(KIOSK, OPERATOR);
  ledger.add_kiosk(OTHER_KIOSK, OTHER_OPERATOR);
  let clock = Arc::new(ManualClock::new(t0()));
  let notifier = RecordingNotifier::new();
  let service = QueueService::new(
    ledger.clone(),
    clock.clone(),
    notifier.clone(),
    QueueSettings {
      page_size,
      notify: fast_policy(),
    },
  );
  Harness {
    service,
    ledger,
    clock,
    notifier,
  }
}

impl Harness {
  /// Places a single-line pickup order taking `minutes`.
  pub async fn place_order(&self, buyer_id: &str, kiosk_id: KioskId, minutes: i32) -> Order {
    self
      .ledger
      .put_cart_item(buyer_id, cart_line(kiosk_id * 1000 + 1, kiosk_id, 15_000, minutes, 1));
    self
      .service
      .create_order(buyer_id, DeliveryInfo::pickup())
      .await
      .expect("checkout should succeed")
  }

  pub async fn paid_order(&self, buyer_id: &str, kiosk_id: KioskId, minutes: i32) -> Order {
    let order = self.place_order(buyer_id, kiosk_id, minutes).await;
    self
      .service
      .confirm_payment(order.id, PaymentOutcome::Paid)
      .await
      .expect("payment should succeed")
      .order
  }

  pub async fn admit(&self, order_id: OrderId, operator_id: OperatorId) -> Order {
    self
      .service
      .update_order_status(order_id, operator_id, OrderStatus::Processing)
      .await
      .expect("admission should succeed")
  }
}
