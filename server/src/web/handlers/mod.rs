// antrian/server/src/web/handlers/mod.rs

pub mod kiosk_handlers;
pub mod order_handlers;
pub mod webhook_handlers;
