// antrian/core/src/service.rs

//! `QueueService`: the operations the queue exposes to its callers. Mutations
//! run as registered pipelines; reads go straight to a ledger snapshot.

use crate::checkout::DeliveryInfo;
use crate::clock::Clock;
use crate::error::{QueueError, Result};
use crate::eta::{self, BuyerOrderStatus, IncomingOrders};
use crate::ledger::{OrderLedger, TransitionOutcome};
use crate::model::{OperatorId, Order, OrderId, OrderStatus};
use crate::notify::{Notifier, NotifierGateway, NotifyPolicy};
use crate::pipeline::ContextData;
use crate::registry::Registry;
use crate::status::{Actor, TransitionRequest};
use crate::workflows::{self, CheckoutCtxData, QueueDeps, TransitionCtxData};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// The part of the application configuration the queue needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
  /// Rows per operator list page.
  pub page_size: u32,
  pub notify: NotifyPolicy,
}

impl Default for QueueSettings {
  fn default() -> Self {
    Self {
      page_size: 20,
      notify: NotifyPolicy::default(),
    }
  }
}

/// Result reported by the payment gateway for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
  Paid,
  Failed,
}

pub struct QueueService {
  deps: QueueDeps,
  registry: Registry<QueueError>,
  settings: QueueSettings,
}

impl QueueService {
  pub fn new(
    ledger: Arc<dyn OrderLedger>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    settings: QueueSettings,
  ) -> Self {
    let gateway = Arc::new(NotifierGateway::new(notifier, ledger.clone(), settings.notify));
    let registry = Registry::new();
    workflows::register_all_pipelines(&registry);
    Self {
      deps: QueueDeps { ledger, clock, gateway },
      registry,
      settings,
    }
  }

  pub fn settings(&self) -> QueueSettings {
    self.settings
  }

  pub fn ledger(&self) -> &Arc<dyn OrderLedger> {
    &self.deps.ledger
  }

  /// Waits for announcements still being delivered in the background.
  pub async fn flush_notifications(&self) {
    self.deps.gateway.flush().await;
  }

  /// Checks out the buyer's cart into a pending order and announces it to the
  /// kiosk.
  #[instrument(skip(self, delivery), fields(delivery_type = %delivery.delivery_type), err(Display))]
  pub async fn create_order(&self, buyer_id: &str, delivery: DeliveryInfo) -> Result<Order> {
    let ctx_data = ContextData::new(CheckoutCtxData::new(self.deps.clone(), buyer_id, delivery));
    self.registry.run(ctx_data.clone()).await?;

    let created = ctx_data.read().created_order.clone();
    created.ok_or_else(|| QueueError::Internal("checkout finished without an order".to_string()))
  }

  /// The buyer's view of one of their orders. Another buyer's order is
  /// reported as missing.
  #[instrument(skip(self), err(Display))]
  pub async fn get_buyer_order_status(&self, order_id: OrderId, buyer_id: &str) -> Result<BuyerOrderStatus> {
    let ledger = &self.deps.ledger;
    let order = ledger
      .find_order(order_id)
      .await?
      .filter(|o| o.buyer_id == buyer_id)
      .ok_or_else(|| QueueError::NotFound(format!("Order {} not found.", order_id)))?;

    let kiosk_orders = if order.status.is_admitted() || order.status.is_terminal() {
      Vec::new()
    } else {
      ledger.kiosk_orders(order.kiosk_id, &OrderStatus::ACTIVE).await?
    };
    Ok(eta::buyer_status(&order, &kiosk_orders, self.deps.clock.now()))
  }

  /// One page (1-based) of the operator's kiosk dashboard.
  #[instrument(skip(self), err(Display))]
  pub async fn list_incoming_orders(&self, operator_id: OperatorId, page: u32) -> Result<IncomingOrders> {
    if page == 0 {
      return Err(QueueError::Validation("Page numbers start at 1.".to_string()));
    }
    let ledger = &self.deps.ledger;
    let kiosk_id = ledger
      .kiosk_of_operator(operator_id)
      .await?
      .ok_or_else(|| QueueError::NotFound(format!("Operator {} has no kiosk.", operator_id)))?;

    let active = ledger.kiosk_orders(kiosk_id, &OrderStatus::ACTIVE).await?;
    let board = eta::operator_board(active, self.deps.clock.now());
    let total = board.len();

    let page_size = self.settings.page_size.max(1);
    let skip = (page as usize - 1).saturating_mul(page_size as usize);
    let mut rows: Vec<_> = board.into_iter().skip(skip).take(page_size as usize).collect();

    let ids: Vec<OrderId> = rows.iter().map(|r| r.order.id).collect();
    let mut lines = ledger.order_lines(&ids).await?;
    for row in rows.iter_mut() {
      let (mine, rest): (Vec<_>, Vec<_>) = lines.into_iter().partition(|l| l.order_id == row.order.id);
      row.lines = mine;
      lines = rest;
    }

    Ok(IncomingOrders {
      kiosk_id,
      page,
      page_size,
      total,
      rows,
    })
  }

  /// Operator-driven status change. Admission into `processing` commits the
  /// order's slot; reaching `done` notifies the buyer.
  #[instrument(skip(self), fields(new_status = %new_status), err(Display))]
  pub async fn update_order_status(
    &self,
    order_id: OrderId,
    operator_id: OperatorId,
    new_status: OrderStatus,
  ) -> Result<Order> {
    let outcome = self
      .run_transition(order_id, Actor::Operator(operator_id), TransitionRequest::to(new_status))
      .await?;
    Ok(outcome.order)
  }

  /// Payment gateway callback. Repeated confirmations are no-ops, and a
  /// failure report only fails an order that is still pending.
  #[instrument(skip(self), err(Display))]
  pub async fn confirm_payment(&self, order_id: OrderId, outcome: PaymentOutcome) -> Result<TransitionOutcome> {
    let request = match outcome {
      PaymentOutcome::Paid => TransitionRequest::settle_payment(),
      PaymentOutcome::Failed => TransitionRequest::guarded(OrderStatus::Pending, OrderStatus::Failed),
    };
    self.run_transition(order_id, Actor::System, request).await
  }

  async fn run_transition(
    &self,
    order_id: OrderId,
    actor: Actor,
    request: TransitionRequest,
  ) -> Result<TransitionOutcome> {
    let ctx_data = ContextData::new(TransitionCtxData::new(self.deps.clone(), order_id, actor, request));
    self.registry.run(ctx_data.clone()).await?;

    let outcome = ctx_data.read().outcome.clone();
    outcome.ok_or_else(|| QueueError::Internal("transition finished without an outcome".to_string()))
  }
}
