//! Core data types for the protocol ledger.
//!
//! Field names follow the wire format of the legacy service (`clientId`,
//! `returnDate`, `courierPending`, ...) so that exported JSON stays
//! compatible with data produced by the original system.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signature::SignatureImage;

/// Longest accepted entry comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

/// A client of the sterilization service. Read-only to the core; the
/// directory itself is managed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Stable slug (lowercased, diacritics stripped)
    pub id: String,

    /// Display name
    pub name: String,

    /// Postal address
    #[serde(default)]
    pub address: String,

    /// NIP or PESEL
    #[serde(default)]
    pub tax_id: String,

    /// Default routing for new entries: "kurier" or "punkt"
    #[serde(default)]
    pub logistics: String,
}

/// One tool position on either leg of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolLine {
    pub name: String,
    #[serde(default)]
    pub count: u32,
}

impl ToolLine {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Courier delivery variant, as stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delivery {
    /// Courier picks up only (Kurier x1)
    #[serde(rename = "odbior")]
    Pickup,
    /// Courier picks up and brings back (Kurier x2)
    #[serde(rename = "odbior+dowoz")]
    PickupAndReturn,
}

/// The additional-service choice on an entry leg.
///
/// Shipping and the courier variants are mutually exclusive; the wire
/// format keeps them as a `shipping` flag plus an optional `delivery`
/// code, and [`ServiceType`] is the single-valued view over that pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceType {
    #[default]
    None,
    Shipping,
    CourierSingle,
    CourierDouble,
}

impl ServiceType {
    /// Reassemble from the wire pair. A set `shipping` flag wins; a
    /// dangling `delivery` code alongside it is ignored.
    pub fn from_flags(shipping: bool, delivery: Option<Delivery>) -> Self {
        if shipping {
            return Self::Shipping;
        }
        match delivery {
            Some(Delivery::Pickup) => Self::CourierSingle,
            Some(Delivery::PickupAndReturn) => Self::CourierDouble,
            None => Self::None,
        }
    }

    /// Decompose into the wire pair.
    pub fn to_flags(self) -> (bool, Option<Delivery>) {
        match self {
            Self::None => (false, None),
            Self::Shipping => (true, None),
            Self::CourierSingle => (false, Some(Delivery::Pickup)),
            Self::CourierDouble => (false, Some(Delivery::PickupAndReturn)),
        }
    }

    /// Label shown on screens and printed protocols.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "—",
            Self::Shipping => "Wysyłka",
            Self::CourierSingle => "Kurier x1",
            Self::CourierDouble => "Kurier x2",
        }
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "shipping" => Ok(Self::Shipping),
            "courier-x1" | "courierSingle" => Ok(Self::CourierSingle),
            "courier-x2" | "courierDouble" => Ok(Self::CourierDouble),
            other => Err(format!(
                "unknown service type {other:?} (use none, shipping, courier-x1, courier-x2)"
            )),
        }
    }
}

/// Signature slots for one leg. Each slot is independently present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegSignatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<SignatureImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<SignatureImage>,
}

impl LegSignatures {
    pub fn is_empty(&self) -> bool {
        self.client.is_none() && self.staff.is_none()
    }

    /// Both parties have signed this leg.
    pub fn is_complete(&self) -> bool {
        self.client.is_some() && self.staff.is_some()
    }
}

/// All four signature slots of an entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signatures {
    #[serde(default, skip_serializing_if = "LegSignatures::is_empty")]
    pub transfer: LegSignatures,
    #[serde(default, rename = "return", skip_serializing_if = "LegSignatures::is_empty")]
    pub return_leg: LegSignatures,
}

impl Signatures {
    pub fn is_empty(&self) -> bool {
        self.transfer.is_empty() && self.return_leg.is_empty()
    }

    /// At least one staff slot is filled, on either leg.
    pub fn has_staff_signature(&self) -> bool {
        self.transfer.staff.is_some() || self.return_leg.staff.is_some()
    }

    /// Client and staff have signed both legs.
    pub fn is_fully_signed(&self) -> bool {
        self.transfer.is_complete() && self.return_leg.is_complete()
    }
}

/// Pending-queue assignment of an entry. At most one flag is true.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    #[serde(default)]
    pub courier_pending: bool,
    #[serde(default)]
    pub point_pending: bool,
    /// Planned courier visit; set when the entry enters the courier queue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_planned_date: Option<NaiveDate>,
}

impl QueueState {
    pub fn is_pending(&self, kind: QueueKind) -> bool {
        match kind {
            QueueKind::Courier => self.courier_pending,
            QueueKind::Point => self.point_pending,
        }
    }
}

/// The two delivery queues an entry can wait for signatures in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    Courier,
    Point,
}

impl QueueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Courier => "courier",
            Self::Point => "point",
        }
    }
}

impl std::str::FromStr for QueueKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "courier" | "kurier" => Ok(Self::Courier),
            "point" | "punkt" => Ok(Self::Point),
            other => Err(format!("unknown queue {other:?} (use courier or point)")),
        }
    }
}

/// One transfer-and-return cycle of tools within a monthly protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Transfer date as stored. New entries always carry a valid ISO
    /// date; legacy rows may hold anything, so consumers go through
    /// [`Entry::parsed_date`].
    pub date: String,

    /// Tools handed over
    #[serde(default)]
    pub tools: Vec<ToolLine>,

    /// Package count at transfer
    #[serde(default)]
    pub packages: u32,

    /// Courier variant of the transfer leg (wire pair with `shipping`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Delivery>,

    /// Shipping flag of the transfer leg
    #[serde(default)]
    pub shipping: bool,

    /// Free-text note
    #[serde(default)]
    pub comment: String,

    /// Return date; absent means "next business day after `date`"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,

    /// Tools on the return leg; empty means "same as `tools`"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub return_tools: Vec<ToolLine>,

    /// Package count at return; absent or 0 falls back to `packages`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_packages: Option<u32>,

    /// Courier variant of the return leg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_delivery: Option<Delivery>,

    /// Shipping flag of the return leg
    #[serde(default)]
    pub return_shipping: bool,

    #[serde(default, skip_serializing_if = "Signatures::is_empty")]
    pub signatures: Signatures,

    #[serde(default)]
    pub queue: QueueState,
}

impl Entry {
    /// Additional service on the transfer leg.
    pub fn service(&self) -> ServiceType {
        ServiceType::from_flags(self.shipping, self.delivery)
    }

    /// Additional service on the return leg.
    pub fn return_service(&self) -> ServiceType {
        ServiceType::from_flags(self.return_shipping, self.return_delivery)
    }

    pub fn set_service(&mut self, service: ServiceType) {
        let (shipping, delivery) = service.to_flags();
        self.shipping = shipping;
        self.delivery = delivery;
    }

    pub fn set_return_service(&mut self, service: ServiceType) {
        let (shipping, delivery) = service.to_flags();
        self.return_shipping = shipping;
        self.return_delivery = delivery;
    }

    /// The transfer date, when the stored text is a valid ISO date.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    /// The return date to show: the stored one, or the default next
    /// business day after the transfer. `None` only for legacy rows
    /// whose transfer date does not parse.
    pub fn effective_return_date(&self) -> Option<NaiveDate> {
        self.return_date
            .or_else(|| self.parsed_date().map(crate::calendar::next_business_day))
    }

    /// The return package count to show, falling back to the transfer
    /// count when unset or zero.
    pub fn effective_return_packages(&self) -> u32 {
        match self.return_packages {
            Some(n) if n > 0 => n,
            _ => self.packages,
        }
    }
}

/// A draft entry as collected by the entry form, before validation.
///
/// Only the transfer-leg fields are captured here; signatures, queue
/// state and the return leg are attached to a persisted entry later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub tools: Vec<ToolLine>,
    #[serde(default)]
    pub packages: u32,
    #[serde(default)]
    pub service: ServiceType,
    #[serde(default)]
    pub comment: String,
}

/// Derived month totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_packages: u32,
}

/// A monthly protocol: the ordered entry ledger of one client × month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    /// Client id (the protocol is addressed by client × month)
    pub id: String,
    pub month: String,
    #[serde(default)]
    pub summarized: bool,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub totals: Totals,
}

impl Protocol {
    /// An empty ledger for a client × month that has no stored rows yet.
    pub fn empty(client_id: impl Into<String>, month: impl Into<String>) -> Self {
        Self {
            id: client_id.into(),
            month: month.into(),
            summarized: false,
            entries: Vec::new(),
            totals: Totals::default(),
        }
    }

    /// Recompute `totals` from the entries.
    pub fn recompute_totals(&mut self) {
        self.totals.total_packages = self.entries.iter().map(|e| e.packages).sum();
    }
}

/// One entry inside an export snapshot: the reconciled row view plus the
/// header data a printed protocol line carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    /// Transfer date as stored on the entry
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    pub service: ServiceType,
    pub rows: Vec<crate::reconcile::ReconciledRow>,
}

/// A finalized protocol document, as handed to the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSnapshot {
    /// Stable document id: `<clientId>:<month>`
    pub id: String,
    pub snapshot_id: Uuid,
    pub client_id: String,
    pub client_name: String,
    pub month: String,
    pub entries: Vec<SnapshotEntry>,
    pub total_transfers: usize,
    pub total_packages: u32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_round_trip() {
        for service in [
            ServiceType::None,
            ServiceType::Shipping,
            ServiceType::CourierSingle,
            ServiceType::CourierDouble,
        ] {
            let (shipping, delivery) = service.to_flags();
            assert_eq!(ServiceType::from_flags(shipping, delivery), service);
        }
    }

    #[test]
    fn test_service_type_shipping_wins_over_stale_delivery() {
        assert_eq!(
            ServiceType::from_flags(true, Some(Delivery::Pickup)),
            ServiceType::Shipping
        );
    }

    #[test]
    fn test_entry_wire_field_names() {
        let mut entry = Entry {
            date: "2024-03-05".to_string(),
            tools: vec![ToolLine::new("Nożyczki", 2)],
            packages: 3,
            delivery: None,
            shipping: false,
            comment: String::new(),
            return_date: None,
            return_tools: Vec::new(),
            return_packages: None,
            return_delivery: None,
            return_shipping: false,
            signatures: Signatures::default(),
            queue: QueueState::default(),
        };
        entry.set_service(ServiceType::CourierDouble);
        entry.queue.courier_pending = true;

        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["delivery"], "odbior+dowoz");
        assert_eq!(json["shipping"], false);
        assert_eq!(json["queue"]["courierPending"], true);
        assert_eq!(json["queue"]["pointPending"], false);
        // empty signature legs stay off the wire
        assert!(json.get("signatures").is_none());
    }

    #[test]
    fn test_effective_return_fallbacks() {
        let entry = Entry {
            date: "2024-03-08".to_string(), // Friday
            tools: Vec::new(),
            packages: 4,
            delivery: None,
            shipping: false,
            comment: String::new(),
            return_date: None,
            return_tools: Vec::new(),
            return_packages: Some(0),
            return_delivery: None,
            return_shipping: false,
            signatures: Signatures::default(),
            queue: QueueState::default(),
        };
        assert_eq!(
            entry.effective_return_date(),
            NaiveDate::from_ymd_opt(2024, 3, 11)
        );
        assert_eq!(entry.effective_return_packages(), 4);
    }

    #[test]
    fn test_legacy_date_stays_addressable_but_unparsed() {
        let entry = Entry {
            date: "marzec, jakoś".to_string(),
            tools: Vec::new(),
            packages: 1,
            delivery: None,
            shipping: false,
            comment: String::new(),
            return_date: None,
            return_tools: Vec::new(),
            return_packages: None,
            return_delivery: None,
            return_shipping: false,
            signatures: Signatures::default(),
            queue: QueueState::default(),
        };
        assert!(entry.parsed_date().is_none());
        assert!(entry.effective_return_date().is_none());
    }

    #[test]
    fn test_protocol_totals() {
        let mut protocol = Protocol::empty("gabinet-ewa", "2024-03");
        for packages in [2, 5] {
            protocol.entries.push(Entry {
                date: "2024-03-05".to_string(),
                tools: Vec::new(),
                packages,
                delivery: None,
                shipping: false,
                comment: String::new(),
                return_date: None,
                return_tools: Vec::new(),
                return_packages: None,
                return_delivery: None,
                return_shipping: false,
                signatures: Signatures::default(),
                queue: QueueState::default(),
            });
        }
        protocol.recompute_totals();
        assert_eq!(protocol.totals.total_packages, 7);
    }
}
