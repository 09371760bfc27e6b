//! The backend wraps most payloads as `{ data, message, statusCode }`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::domain::reservation::Reservation;
use crate::error::{BookingError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
}

/// Unwrap `data`, failing when the backend sent an envelope without one.
pub fn unwrap_data<T: DeserializeOwned>(body: &str, operation: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    envelope.data.ok_or_else(|| BookingError::Api {
        status: envelope.status_code.unwrap_or(200),
        message: envelope
            .message
            .unwrap_or_else(|| format!("{operation}: response has no data")),
    })
}

/// The `message` of a response, if it has one.
pub fn message_of(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct MessageOnly {
        message: Option<String>,
    }
    serde_json::from_str::<MessageOnly>(body)
        .ok()?
        .message
        .filter(|m| !m.trim().is_empty())
}

/// Reservations of a property. The list comes either at the top level
/// (`{ bookings }`) or inside the usual envelope (`{ data: { bookings } }`).
///
/// Rows that do not parse are skipped with a warning; the rest are kept.
pub fn reservations(body: &str) -> Result<Vec<Reservation>> {
    let root: Value = serde_json::from_str(body)?;
    let payload = root.get("data").unwrap_or(&root);
    let rows = match payload.get("bookings") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(rows)) => rows,
        Some(other) => {
            return Err(BookingError::Api {
                status: 200,
                message: format!("bookings is not a list: {other}"),
            });
        }
    };

    let mut list = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match Reservation::deserialize(row) {
            Ok(reservation) => list.push(reservation),
            Err(e) => warn!(index, error = %e, "Skipping unreadable booking"),
        }
    }
    Ok(list)
}
