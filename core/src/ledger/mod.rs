// antrian/core/src/ledger/mod.rs

//! Order Ledger: the durable state of the queue and its only point of
//! coordination. Implementations make every method atomic; the
//! scheduling rules they apply inside their transactions live in
//! [`checkout`](crate::checkout), [`status`](crate::status) and
//! [`scheduler`](crate::scheduler).

pub mod memory;

use crate::checkout::DeliveryInfo;
use crate::error::Result;
use crate::model::{KioskId, OperatorId, Order, OrderId, OrderLine, OrderStatus};
use crate::notify::EventKind;
use crate::status::TransitionRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryLedger;

/// Result of [`OrderLedger::apply_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
  /// The row as committed (or as found, for a no-op).
  pub order: Order,
  /// Status before the call.
  pub previous: OrderStatus,
  /// `false` when the request was an idempotent repeat or a guarded no-op.
  pub changed: bool,
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
  /// Reads the buyer's cart, drafts the order with
  /// [`checkout::draft_order`](crate::checkout::draft_order), inserts the
  /// pending order and its lines and clears the cart. All or nothing.
  async fn checkout(&self, buyer_id: &str, delivery: &DeliveryInfo, now: DateTime<Utc>) -> Result<Order>;

  async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>>;

  /// Lines of the given orders, ordered by order id then line id.
  async fn order_lines(&self, order_ids: &[OrderId]) -> Result<Vec<OrderLine>>;

  async fn kiosk_owner(&self, kiosk_id: KioskId) -> Result<Option<OperatorId>>;

  async fn kiosk_of_operator(&self, operator_id: OperatorId) -> Result<Option<KioskId>>;

  /// Snapshot of the kiosk's orders whose status is in `statuses`.
  async fn kiosk_orders(&self, kiosk_id: KioskId, statuses: &[OrderStatus]) -> Result<Vec<Order>>;

  /// Locks the order, plans the transition with
  /// [`status::plan_transition`](crate::status::plan_transition) and writes it.
  ///
  /// Admissions (`target == Processing`) additionally hold the kiosk's lock
  /// from reading the queue tail until the new slot is committed, and the
  /// kiosk lock is always taken before the order lock.
  async fn apply_transition(
    &self,
    order_id: OrderId,
    request: TransitionRequest,
    now: DateTime<Utc>,
  ) -> Result<TransitionOutcome>;

  /// Records that `kind` was announced for `order_id`. Returns `false` if it
  /// already was.
  async fn claim_notification(&self, order_id: OrderId, kind: EventKind) -> Result<bool>;
}
