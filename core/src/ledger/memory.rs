// antrian/core/src/ledger/memory.rs

use super::{OrderLedger, TransitionOutcome};
use crate::checkout::{self, DeliveryInfo};
use crate::error::{QueueError, Result};
use crate::model::{CartLine, KioskId, OperatorId, Order, OrderId, OrderLine, OrderStatus};
use crate::notify::EventKind;
use crate::scheduler;
use crate::status::{self, TransitionPlan, TransitionRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::instrument;

#[derive(Debug, Default)]
struct Tables {
  last_order_id: OrderId,
  last_line_id: i64,
  /// kiosk -> owning operator
  kiosks: HashMap<KioskId, OperatorId>,
  carts: HashMap<String, Vec<CartLine>>,
  orders: BTreeMap<OrderId, Order>,
  lines: Vec<OrderLine>,
  notifications: HashSet<(OrderId, EventKind)>,
}

/// In-process ledger. One mutex guards every table and each operation runs
/// under a single acquisition, so operations are atomic and admissions are
/// serialized.
#[derive(Debug, Default)]
pub struct MemoryLedger {
  tables: Mutex<Tables>,
}

impl MemoryLedger {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `kiosk_id` as owned by `owner`.
  pub fn add_kiosk(&self, kiosk_id: KioskId, owner: OperatorId) {
    self.tables.lock().kiosks.insert(kiosk_id, owner);
  }

  /// Adds an item to a buyer's cart, merging quantities for the same menu item.
  pub fn put_cart_item(&self, buyer_id: &str, item: CartLine) {
    let mut tables = self.tables.lock();
    let cart = tables.carts.entry(buyer_id.to_string()).or_default();
    match cart.iter_mut().find(|line| line.menu_item_id == item.menu_item_id) {
      Some(existing) => existing.quantity += item.quantity,
      None => cart.push(item),
    }
  }

  pub fn cart(&self, buyer_id: &str) -> Vec<CartLine> {
    self.tables.lock().carts.get(buyer_id).cloned().unwrap_or_default()
  }

  pub fn orders(&self) -> Vec<Order> {
    self.tables.lock().orders.values().cloned().collect()
  }

  pub fn line_count(&self) -> usize {
    self.tables.lock().lines.len()
  }

  pub fn notification_claimed(&self, order_id: OrderId, kind: EventKind) -> bool {
    self.tables.lock().notifications.contains(&(order_id, kind))
  }
}

#[async_trait]
impl OrderLedger for MemoryLedger {
  #[instrument(skip(self, delivery), fields(delivery_type = %delivery.delivery_type))]
  async fn checkout(&self, buyer_id: &str, delivery: &DeliveryInfo, now: DateTime<Utc>) -> Result<Order> {
    let mut tables = self.tables.lock();
    let cart = tables.carts.get(buyer_id).map(Vec::as_slice).unwrap_or_default();
    // Nothing is written until the draft is valid.
    let draft = checkout::draft_order(buyer_id, delivery, cart, now)?;

    tables.last_order_id += 1;
    let order_id = tables.last_order_id;
    let order = Order {
      id: order_id,
      kiosk_id: draft.kiosk_id,
      buyer_id: draft.buyer_id,
      status: OrderStatus::Pending,
      total_price: draft.total_price,
      total_estimated_minutes: draft.total_estimated_minutes,
      delivery_type: draft.delivery_type,
      delivery_address: draft.delivery_address,
      created_at: draft.created_at,
      paid_at: None,
      processing_started_at: None,
      estimated_start_at: None,
      estimated_finish_at: None,
    };

    for line in draft.lines {
      tables.last_line_id += 1;
      let id = tables.last_line_id;
      tables.lines.push(OrderLine {
        id,
        order_id,
        menu_item_id: line.menu_item_id,
        name: line.name,
        price: line.price,
        estimated_minutes: line.estimated_minutes,
        quantity: line.quantity,
        subtotal: line.subtotal,
      });
    }
    tables.orders.insert(order_id, order.clone());
    tables.carts.remove(buyer_id);
    Ok(order)
  }

  async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
    Ok(self.tables.lock().orders.get(&order_id).cloned())
  }

  async fn order_lines(&self, order_ids: &[OrderId]) -> Result<Vec<OrderLine>> {
    let tables = self.tables.lock();
    let mut lines: Vec<OrderLine> = tables
      .lines
      .iter()
      .filter(|line| order_ids.contains(&line.order_id))
      .cloned()
      .collect();
    lines.sort_by_key(|line| (line.order_id, line.id));
    Ok(lines)
  }

  async fn kiosk_owner(&self, kiosk_id: KioskId) -> Result<Option<OperatorId>> {
    Ok(self.tables.lock().kiosks.get(&kiosk_id).copied())
  }

  async fn kiosk_of_operator(&self, operator_id: OperatorId) -> Result<Option<KioskId>> {
    let tables = self.tables.lock();
    // Lowest id wins should seeding ever give one operator two kiosks.
    Ok(
      tables
        .kiosks
        .iter()
        .filter(|(_, owner)| **owner == operator_id)
        .map(|(kiosk_id, _)| *kiosk_id)
        .min(),
    )
  }

  async fn kiosk_orders(&self, kiosk_id: KioskId, statuses: &[OrderStatus]) -> Result<Vec<Order>> {
    Ok(
      self
        .tables
        .lock()
        .orders
        .values()
        .filter(|o| o.kiosk_id == kiosk_id && statuses.contains(&o.status))
        .cloned()
        .collect(),
    )
  }

  #[instrument(skip(self, request), fields(target = %request.target))]
  async fn apply_transition(
    &self,
    order_id: OrderId,
    request: TransitionRequest,
    now: DateTime<Utc>,
  ) -> Result<TransitionOutcome> {
    let mut tables = self.tables.lock();
    let current = tables
      .orders
      .get(&order_id)
      .cloned()
      .ok_or_else(|| QueueError::NotFound(format!("Order {} not found.", order_id)))?;

    let tail = if request.target == OrderStatus::Processing {
      scheduler::queue_tail(tables.orders.values(), current.kiosk_id, order_id)
    } else {
      None
    };

    let previous = current.status;
    match status::plan_transition(&current, request, now, tail)? {
      TransitionPlan::Unchanged => Ok(TransitionOutcome {
        order: current,
        previous,
        changed: false,
      }),
      TransitionPlan::Apply(update) => {
        let row = tables
          .orders
          .get_mut(&order_id)
          .ok_or_else(|| QueueError::Internal(format!("Order {} vanished mid-transition.", order_id)))?;
        update.apply_to(row);
        Ok(TransitionOutcome {
          order: row.clone(),
          previous,
          changed: true,
        })
      }
    }
  }

  async fn claim_notification(&self, order_id: OrderId, kind: EventKind) -> Result<bool> {
    Ok(self.tables.lock().notifications.insert((order_id, kind)))
  }
}
