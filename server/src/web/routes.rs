// antrian/server/src/web/routes.rs

use actix_web::web;

use crate::errors::AppError;
use crate::web::handlers::{kiosk_handlers, order_handlers, webhook_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  // Malformed bodies, paths and queries answer with the same JSON error shape.
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, _req| AppError::validation(err.to_string()).into()))
    .app_data(web::PathConfig::default().error_handler(|err, _req| AppError::validation(err.to_string()).into()))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| AppError::validation(err.to_string()).into()));

  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      // Buyers
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/{order_id}/status", web::get().to(order_handlers::order_status_handler)),
      )
      // Operators
      .service(
        web::scope("/kiosk")
          .route("/orders", web::get().to(kiosk_handlers::list_incoming_orders_handler))
          .route(
            "/orders/{order_id}/status",
            web::patch().to(kiosk_handlers::update_order_status_handler),
          ),
      )
      .service(
        web::scope("/webhooks").route("/payment", web::post().to(webhook_handlers::payment_callback_handler)),
      ),
  );
}
