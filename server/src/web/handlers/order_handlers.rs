// antrian/server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use antrian::DeliveryInfo;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Guest;

#[instrument(
  name = "handler::create_order",
  skip(app_state, guest, body),
  fields(buyer_id = %guest.buyer_id, delivery_type = %body.delivery_type)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  guest: Guest,
  body: web::Json<DeliveryInfo>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .service
    .create_order(&guest.buyer_id, body.into_inner())
    .await?;
  info!(order_id = order.id, kiosk_id = order.kiosk_id, "Order created.");
  Ok(HttpResponse::Created().json(order))
}

#[instrument(
  name = "handler::order_status",
  skip(app_state, guest, path),
  fields(buyer_id = %guest.buyer_id, order_id = %path.as_ref())
)]
pub async fn order_status_handler(
  app_state: web::Data<AppState>,
  guest: Guest,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let view = app_state
    .service
    .get_buyer_order_status(order_id, &guest.buyer_id)
    .await?;
  Ok(HttpResponse::Ok().json(view))
}
