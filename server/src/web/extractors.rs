// antrian/server/src/web/extractors.rs

//! Caller identity. Buyers are anonymous guests identified by `X-Guest-ID`;
//! operators by `X-Operator-ID`. Authentication proper happens upstream.

use crate::errors::AppError;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

pub const GUEST_HEADER: &str = "X-Guest-ID";
pub const OPERATOR_HEADER: &str = "X-Operator-ID";

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req
    .headers()
    .get(name)
    .and_then(|value| value.to_str().ok())
    .map(str::trim)
    .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone)]
pub struct Guest {
  pub buyer_id: String,
}

impl FromRequest for Guest {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(match header_value(req, GUEST_HEADER) {
      Some(buyer_id) => Ok(Guest {
        buyer_id: buyer_id.to_string(),
      }),
      None => {
        warn!("Guest extractor: missing {} header.", GUEST_HEADER);
        Err(AppError::unauthorized(format!("Missing {} header.", GUEST_HEADER)))
      }
    })
  }
}

#[derive(Debug, Clone, Copy)]
pub struct Operator {
  pub operator_id: i64,
}

impl FromRequest for Operator {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let parsed = header_value(req, OPERATOR_HEADER).and_then(|raw| raw.parse::<i64>().ok());
    ready(match parsed {
      Some(operator_id) => Ok(Operator { operator_id }),
      None => {
        warn!("Operator extractor: missing or invalid {} header.", OPERATOR_HEADER);
        Err(AppError::unauthorized(format!("Missing or invalid {} header.", OPERATOR_HEADER)))
      }
    })
  }
}
