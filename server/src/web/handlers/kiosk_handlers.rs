// antrian/server/src/web/handlers/kiosk_handlers.rs

use actix_web::{web, HttpResponse};
use antrian::OrderStatus;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Operator;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
  pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
  pub status: String,
}

#[instrument(
  name = "handler::list_incoming_orders",
  skip(app_state, operator, query),
  fields(operator_id = operator.operator_id, page = ?query.page)
)]
pub async fn list_incoming_orders_handler(
  app_state: web::Data<AppState>,
  operator: Operator,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let page = query.page.unwrap_or(1);
  let incoming = app_state
    .service
    .list_incoming_orders(operator.operator_id, page)
    .await?;
  Ok(HttpResponse::Ok().json(incoming))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, operator, path, body),
  fields(operator_id = operator.operator_id, order_id = %path.as_ref(), status = %body.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  operator: Operator,
  path: web::Path<i64>,
  body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let new_status: OrderStatus = body.status.parse()?;
  let order = app_state
    .service
    .update_order_status(order_id, operator.operator_id, new_status)
    .await?;
  info!(order_id, status = %order.status, "Order status updated.");
  Ok(HttpResponse::Ok().json(order))
}
