use crate::domain::file::FileMetadata;
use crate::domain::payment::ReferenceCode;
use crate::domain::settings::PrintSettings;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a placed order by the order sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What is sent to the order sink once payment has been verified.
///
/// Serializes to `{ txnId, totalCost, files, settings }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub txn_id: ReferenceCode,
    pub total_cost: Decimal,
    pub files: Vec<FileMetadata>,
    pub settings: PrintSettings,
}

/// A placed order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    order_id: OrderId,
    reference: ReferenceCode,
    total_cost: Decimal,
    files: Vec<FileMetadata>,
    settings: PrintSettings,
}

impl OrderRecord {
    pub(crate) fn new(order_id: OrderId, submission: OrderSubmission) -> Self {
        Self {
            order_id,
            reference: submission.txn_id,
            total_cost: submission.total_cost,
            files: submission.files,
            settings: submission.settings,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn reference(&self) -> &ReferenceCode {
        &self.reference
    }

    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }

    pub fn files(&self) -> &[FileMetadata] {
        &self.files
    }

    pub fn settings(&self) -> &PrintSettings {
        &self.settings
    }
}
