//! Entry row type for database queries.

use crate::error::{ProtocolError, Result};
use crate::model::{Delivery, Entry, LegSignatures, QueueState, Signatures, ToolLine};
use crate::signature::SignatureImage;

/// Raw row data from the `protocol_entries` table, before parsing into
/// domain types.
#[derive(Debug)]
pub struct EntryRow {
    pub date: String,
    pub tools_json: String,
    pub packages: i64,
    pub delivery: Option<String>,
    pub shipping: i64,
    pub comment: String,
    pub return_date: Option<String>,
    pub return_tools_json: Option<String>,
    pub return_packages: Option<i64>,
    pub return_delivery: Option<String>,
    pub return_shipping: i64,
    pub transfer_client_sig: Option<String>,
    pub transfer_staff_sig: Option<String>,
    pub return_client_sig: Option<String>,
    pub return_staff_sig: Option<String>,
    pub courier_pending: i64,
    pub point_pending: i64,
    pub courier_planned_date: Option<String>,
}

fn parse_delivery(raw: Option<&str>) -> Result<Option<Delivery>> {
    match raw {
        None | Some("") => Ok(None),
        Some("odbior") => Ok(Some(Delivery::Pickup)),
        Some("odbior+dowoz") => Ok(Some(Delivery::PickupAndReturn)),
        Some(other) => Err(ProtocolError::Storage(format!(
            "Invalid delivery code: {other:?}"
        ))),
    }
}

fn parse_opt_date(raw: Option<&str>) -> Option<chrono::NaiveDate> {
    raw.and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn parse_tools(json: &str) -> Result<Vec<ToolLine>> {
    serde_json::from_str(json)
        .map_err(|e| ProtocolError::Storage(format!("Invalid tools JSON: {e}")))
}

impl TryFrom<EntryRow> for Entry {
    type Error = ProtocolError;

    fn try_from(row: EntryRow) -> Result<Self> {
        let tools = parse_tools(&row.tools_json)?;
        let return_tools = match row.return_tools_json.as_deref() {
            Some(json) if !json.is_empty() => parse_tools(json)?,
            _ => Vec::new(),
        };

        // Stored payloads were validated on the way in; rewrap as-is.
        let sig = |value: Option<String>| -> Result<Option<SignatureImage>> {
            value
                .map(|s| SignatureImage::from_data_url(&s))
                .transpose()
        };
        let signatures = Signatures {
            transfer: LegSignatures {
                client: sig(row.transfer_client_sig)?,
                staff: sig(row.transfer_staff_sig)?,
            },
            return_leg: LegSignatures {
                client: sig(row.return_client_sig)?,
                staff: sig(row.return_staff_sig)?,
            },
        };

        Ok(Entry {
            date: row.date,
            tools,
            packages: row.packages.max(0) as u32,
            delivery: parse_delivery(row.delivery.as_deref())?,
            shipping: row.shipping != 0,
            comment: row.comment,
            return_date: parse_opt_date(row.return_date.as_deref()),
            return_tools,
            return_packages: row.return_packages.map(|n| n.max(0) as u32),
            return_delivery: parse_delivery(row.return_delivery.as_deref())?,
            return_shipping: row.return_shipping != 0,
            signatures,
            queue: QueueState {
                courier_pending: row.courier_pending != 0,
                point_pending: row.point_pending != 0,
                courier_planned_date: parse_opt_date(row.courier_planned_date.as_deref()),
            },
        })
    }
}

/// Delivery code written back to the database.
pub fn delivery_code(delivery: Option<Delivery>) -> Option<&'static str> {
    delivery.map(|d| match d {
        Delivery::Pickup => "odbior",
        Delivery::PickupAndReturn => "odbior+dowoz",
    })
}
