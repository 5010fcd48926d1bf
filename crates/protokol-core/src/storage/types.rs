//! Wire types for the store collaborator operations.
//!
//! These mirror the request bodies of the legacy protocol API: partial
//! entry patches, queue flag updates, additive signature writes and
//! return-leg completion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Entry, ServiceType, ToolLine};
use crate::signature::{Leg, SignatureImage};

/// Drop blank tool rows and trim the surviving names.
pub(crate) fn filter_tools(tools: &[ToolLine]) -> Vec<ToolLine> {
    tools
        .iter()
        .filter(|t| !t.name.trim().is_empty())
        .map(|t| ToolLine::new(t.name.trim(), t.count))
        .collect()
}

/// Partial update of an entry. Unset fields leave the stored value
/// untouched; tool lists are filtered of blank rows before persisting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_tools: Option<Vec<ToolLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_packages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_service: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_planned_date: Option<NaiveDate>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .map(|v| v.as_object().map(|o| o.is_empty()).unwrap_or(true))
            .unwrap_or(true)
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolLine>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_packages(mut self, packages: u32) -> Self {
        self.packages = Some(packages);
        self
    }

    pub fn with_service(mut self, service: ServiceType) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Merge this patch into an entry. Unset fields are left alone;
    /// tool lists lose their blank rows; a service choice updates the
    /// shipping/delivery wire pair together.
    pub fn apply_to(&self, entry: &mut Entry) {
        if let Some(date) = self.date {
            entry.date = date.format("%Y-%m-%d").to_string();
        }
        if let Some(tools) = &self.tools {
            entry.tools = filter_tools(tools);
        }
        if let Some(packages) = self.packages {
            entry.packages = packages;
        }
        if let Some(service) = self.service {
            entry.set_service(service);
        }
        if let Some(comment) = &self.comment {
            entry.comment = comment.clone();
        }
        if let Some(date) = self.return_date {
            entry.return_date = Some(date);
        }
        if let Some(tools) = &self.return_tools {
            entry.return_tools = filter_tools(tools);
        }
        if let Some(packages) = self.return_packages {
            entry.return_packages = Some(packages);
        }
        if let Some(service) = self.return_service {
            entry.set_return_service(service);
        }
        if let Some(date) = self.courier_planned_date {
            entry.queue.courier_planned_date = Some(date);
        }
    }
}

/// Additive signature write for one leg. Only the slots that are set
/// are written; omitted slots stay untouched server-side. The staff
/// slot may alternatively be satisfied by the store-held default image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureWrite {
    pub leg: Leg,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<SignatureImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<SignatureImage>,
    #[serde(default)]
    pub use_default_staff: bool,
}

impl SignatureWrite {
    pub fn new(leg: Leg) -> Self {
        Self {
            leg,
            client: None,
            staff: None,
            use_default_staff: false,
        }
    }

    /// True when the write would not touch any slot.
    pub fn is_empty(&self) -> bool {
        self.client.is_none() && self.staff.is_none() && !self.use_default_staff
    }
}

/// Return-leg completion. `match_transfer` mirrors the transfer tool
/// quantities instead of sending an explicit list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_packages: Option<u32>,
    #[serde(default)]
    pub match_transfer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_service: Option<ServiceType>,
}

impl ReturnUpdate {
    /// Apply this return-leg update to an entry.
    ///
    /// `match_transfer` copies the transfer tool list wholesale; the
    /// return package count then defaults to the transfer count unless
    /// given explicitly.
    pub fn apply_to(&self, entry: &mut Entry) {
        if let Some(date) = self.return_date {
            entry.return_date = Some(date);
        }
        if self.match_transfer {
            entry.return_tools = filter_tools(&entry.tools);
            entry.return_packages = Some(self.return_packages.unwrap_or(entry.packages));
        } else if let Some(tools) = &self.tools {
            entry.return_tools = filter_tools(tools);
            if let Some(packages) = self.return_packages {
                entry.return_packages = Some(packages);
            }
        } else if let Some(packages) = self.return_packages {
            entry.return_packages = Some(packages);
        }
        if let Some(service) = self.return_service {
            entry.set_return_service(service);
        }
    }
}

/// One pending entry on the courier or point signing list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignQueueItem {
    pub client_id: String,
    pub client_name: String,
    pub month: String,
    pub index: usize,
    pub date: String,
    pub packages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_planned_date: Option<NaiveDate>,
}

/// Store metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    /// Format version (e.g. "0.1")
    pub format_version: String,
    /// When this store was created
    pub created_at: chrono::DateTime<chrono::Utc>,
}
