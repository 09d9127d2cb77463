use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Reasons a trade or creation request is refused before or during submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    #[error("invalid asset state: {0}")]
    InvalidAssetState(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("minimum purchase is {minimum} shares ({deficit} more needed)")]
    BelowMinimum { minimum: u64, requested: u64, deficit: u64 },

    #[error("only {available} shares available, requested {requested}")]
    InsufficientSupply { requested: u64, available: u64 },

    #[error("purchase limit of {limit} shares already reached")]
    LimitAlreadyReached { limit: u64, held: u64 },

    #[error("exceeds per-user limit of {limit} shares, you can buy {remaining} more")]
    ExceedsPerUserLimit { limit: u64, requested: u64, remaining: u64 },

    #[error("KYC verification required to purchase this asset")]
    KycRequired,

    #[error("transaction failed: {0}")]
    TransactionFailed(LedgerFailure),

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
}

/// Best-effort classification of an opaque ledger error message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    KycRequired,
    InsufficientFunds,
    Rejected,
    Unknown,
}

impl FailureKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::KycRequired => "KYC verification required to purchase this asset.",
            FailureKind::InsufficientFunds => "Insufficient balance to cover the total cost.",
            FailureKind::Rejected => "Transaction was rejected.",
            FailureKind::Unknown => "Transaction failed. Please try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFailure {
    pub kind: FailureKind,
    /// Raw message reported by the ledger.
    pub detail: String,
}

impl fmt::Display for LedgerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.user_message())
    }
}

/// Fields of the asset-creation form that can carry an inline error.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    AssetName,
    AssetDescription,
    AssetImageUrl,
    TotalShares,
    PricePerShare,
    MinPurchaseAmount,
    MaxPurchaseAmount,
    OwnershipConfirmed,
    TermsAccepted,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::AssetName => "asset_name",
            FormField::AssetDescription => "asset_description",
            FormField::AssetImageUrl => "asset_image_url",
            FormField::TotalShares => "total_shares",
            FormField::PricePerShare => "price_per_share",
            FormField::MinPurchaseAmount => "min_purchase_amount",
            FormField::MaxPurchaseAmount => "max_purchase_amount",
            FormField::OwnershipConfirmed => "ownership_confirmed",
            FormField::TermsAccepted => "terms_accepted",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level form errors, one message per field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<FormField, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn remove(&mut self, field: FormField) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<ValidationErrors> for TradeError {
    fn from(errors: ValidationErrors) -> Self {
        TradeError::Validation(errors)
    }
}
