// antrian/server/src/db/pg_ledger.rs

use crate::models::{CartItemRow, OrderLineRow, OrderRow, ORDER_COLUMNS, ORDER_LINE_COLUMNS};
use anyhow::Context as _;
use antrian::checkout::{self, DeliveryInfo};
use antrian::status::{self, TransitionPlan};
use antrian::{
  CartLine, EventKind, KioskId, OperatorId, Order, OrderId, OrderLedger, OrderLine, OrderStatus, QueueError, Result,
  TransitionOutcome, TransitionRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

/// Order ledger over PostgreSQL. Every method is one transaction.
///
/// Admissions take `pg_advisory_xact_lock(kiosk_id)` before the order's row
/// lock, so the lock order is always kiosk then order and two admissions of
/// one kiosk never read the same queue tail.
#[derive(Clone)]
pub struct PgLedger {
  pool: PgPool,
}

impl PgLedger {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn lock_order(tx: &mut Transaction<'_, Postgres>, order_id: OrderId) -> Result<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&mut **tx)
      .await
      .context("locking order row")?;
    row.map(Order::try_from).transpose()
  }

  /// Latest committed finish among the kiosk's other admitted orders.
  async fn queue_tail(
    tx: &mut Transaction<'_, Postgres>,
    kiosk_id: KioskId,
    exclude: OrderId,
  ) -> Result<Option<DateTime<Utc>>> {
    let tail: Option<DateTime<Utc>> = sqlx::query_scalar(
      "SELECT MAX(estimated_finish_at) FROM orders \
       WHERE kiosk_id = $1 AND id <> $2 AND status = ANY($3)",
    )
    .bind(kiosk_id)
    .bind(exclude)
    .bind(status_names(&OrderStatus::ADMITTED))
    .fetch_one(&mut **tx)
    .await
    .context("reading kiosk queue tail")?;
    Ok(tail)
  }
}

fn status_names(statuses: &[OrderStatus]) -> Vec<String> {
  statuses.iter().map(|s| s.as_str().to_string()).collect()
}

fn order_not_found(order_id: OrderId) -> QueueError {
  QueueError::NotFound(format!("Order {} not found.", order_id))
}

#[async_trait]
impl OrderLedger for PgLedger {
  #[instrument(skip(self, delivery), fields(delivery_type = %delivery.delivery_type))]
  async fn checkout(&self, buyer_id: &str, delivery: &DeliveryInfo, now: DateTime<Utc>) -> Result<Order> {
    let mut tx = self.pool.begin().await.context("starting checkout transaction")?;

    // Locking the cart rows keeps a concurrent checkout of the same cart out.
    let cart: Vec<CartItemRow> = sqlx::query_as(
      "SELECT c.menu_item_id, m.name, m.price, m.estimated_minutes, c.quantity, m.kiosk_id \
       FROM cart_items c JOIN menu_items m ON m.id = c.menu_item_id \
       WHERE c.buyer_id = $1 ORDER BY c.id FOR UPDATE OF c",
    )
    .bind(buyer_id)
    .fetch_all(&mut *tx)
    .await
    .context("reading cart")?;
    let cart: Vec<CartLine> = cart.into_iter().map(CartLine::from).collect();

    let draft = checkout::draft_order(buyer_id, delivery, &cart, now)?;

    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (kiosk_id, buyer_id, status, total_price, total_estimated_minutes, \
       delivery_type, delivery_address, created_at) \
       VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(draft.kiosk_id)
    .bind(&draft.buyer_id)
    .bind(draft.total_price)
    .bind(draft.total_estimated_minutes)
    .bind(draft.delivery_type.as_str())
    .bind(&draft.delivery_address)
    .bind(draft.created_at)
    .fetch_one(&mut *tx)
    .await
    .context("inserting order")?;

    for line in &draft.lines {
      sqlx::query(
        "INSERT INTO order_lines (order_id, menu_item_id, name, price, estimated_minutes, quantity, subtotal) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
      )
      .bind(row.id)
      .bind(line.menu_item_id)
      .bind(&line.name)
      .bind(line.price)
      .bind(line.estimated_minutes)
      .bind(line.quantity)
      .bind(line.subtotal)
      .execute(&mut *tx)
      .await
      .context("inserting order line")?;
    }

    sqlx::query("DELETE FROM cart_items WHERE buyer_id = $1")
      .bind(buyer_id)
      .execute(&mut *tx)
      .await
      .context("clearing cart")?;

    tx.commit().await.context("committing checkout")?;
    debug!(order_id = row.id, lines = draft.lines.len(), "Checkout committed.");
    Order::try_from(row)
  }

  async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .context("loading order")?;
    row.map(Order::try_from).transpose()
  }

  async fn order_lines(&self, order_ids: &[OrderId]) -> Result<Vec<OrderLine>> {
    if order_ids.is_empty() {
      return Ok(Vec::new());
    }
    let rows: Vec<OrderLineRow> = sqlx::query_as(&format!(
      "SELECT {} FROM order_lines WHERE order_id = ANY($1) ORDER BY order_id, id",
      ORDER_LINE_COLUMNS
    ))
    .bind(order_ids.to_vec())
    .fetch_all(&self.pool)
    .await
    .context("loading order lines")?;
    Ok(rows.into_iter().map(OrderLine::from).collect())
  }

  async fn kiosk_owner(&self, kiosk_id: KioskId) -> Result<Option<OperatorId>> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT owner_id FROM kiosks WHERE id = $1")
      .bind(kiosk_id)
      .fetch_optional(&self.pool)
      .await
      .context("loading kiosk owner")?;
    Ok(owner)
  }

  async fn kiosk_of_operator(&self, operator_id: OperatorId) -> Result<Option<KioskId>> {
    let kiosk_id: Option<i64> = sqlx::query_scalar("SELECT MIN(id) FROM kiosks WHERE owner_id = $1")
      .bind(operator_id)
      .fetch_one(&self.pool)
      .await
      .context("resolving operator kiosk")?;
    Ok(kiosk_id)
  }

  async fn kiosk_orders(&self, kiosk_id: KioskId, statuses: &[OrderStatus]) -> Result<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE kiosk_id = $1 AND status = ANY($2)",
      ORDER_COLUMNS
    ))
    .bind(kiosk_id)
    .bind(status_names(statuses))
    .fetch_all(&self.pool)
    .await
    .context("loading kiosk orders")?;
    rows.into_iter().map(Order::try_from).collect()
  }

  #[instrument(skip(self, request), fields(target = %request.target))]
  async fn apply_transition(
    &self,
    order_id: OrderId,
    request: TransitionRequest,
    now: DateTime<Utc>,
  ) -> Result<TransitionOutcome> {
    let mut tx = self.pool.begin().await.context("starting transition transaction")?;
    let admitting = request.target == OrderStatus::Processing;

    if admitting {
      // kiosk_id never changes, so it can be read before any lock is held.
      let kiosk_id: i64 = sqlx::query_scalar("SELECT kiosk_id FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await
        .context("resolving order kiosk")?
        .ok_or_else(|| order_not_found(order_id))?;
      sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(kiosk_id)
        .execute(&mut *tx)
        .await
        .context("taking kiosk admission lock")?;
    }

    let current = Self::lock_order(&mut tx, order_id)
      .await?
      .ok_or_else(|| order_not_found(order_id))?;
    let tail = if admitting {
      Self::queue_tail(&mut tx, current.kiosk_id, order_id).await?
    } else {
      None
    };

    let previous = current.status;
    let outcome = match status::plan_transition(&current, request, now, tail)? {
      TransitionPlan::Unchanged => TransitionOutcome {
        order: current,
        previous,
        changed: false,
      },
      TransitionPlan::Apply(update) => {
        // Timestamps that are already set are never overwritten.
        let row: OrderRow = sqlx::query_as(&format!(
          "UPDATE orders SET status = $2, \
           paid_at = COALESCE(paid_at, $3), \
           processing_started_at = COALESCE(processing_started_at, $4), \
           estimated_start_at = COALESCE(estimated_start_at, $5), \
           estimated_finish_at = COALESCE(estimated_finish_at, $6) \
           WHERE id = $1 RETURNING {}",
          ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(update.status.as_str())
        .bind(update.paid_at)
        .bind(update.processing_started_at)
        .bind(update.estimated_start_at)
        .bind(update.estimated_finish_at)
        .fetch_one(&mut *tx)
        .await
        .context("writing transition")?;
        TransitionOutcome {
          order: Order::try_from(row)?,
          previous,
          changed: true,
        }
      }
    };

    tx.commit().await.context("committing transition")?;
    Ok(outcome)
  }

  async fn claim_notification(&self, order_id: OrderId, kind: EventKind) -> Result<bool> {
    let result = sqlx::query("INSERT INTO order_notifications (order_id, kind) VALUES ($1, $2) ON CONFLICT DO NOTHING")
      .bind(order_id)
      .bind(kind.as_str())
      .execute(&self.pool)
      .await
      .context("claiming notification marker")?;
    Ok(result.rows_affected() == 1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn admitted_statuses_bind_as_text() {
    assert_eq!(
      status_names(&OrderStatus::ADMITTED),
      vec!["processing".to_string(), "ready".to_string(), "delivering".to_string()]
    );
  }
}
