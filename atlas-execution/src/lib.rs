//! Pure share, fee and validation rules for the fractional asset marketplace.
//!
//! Everything here is synchronous and side-effect free; the ledger client
//! calls into these functions before any transaction is submitted.

pub mod classify;
pub mod cost;
pub mod creation;
pub mod error;
pub mod purchase;
pub mod units;

pub use classify::classify_ledger_error;
pub use cost::{
    estimate_creation, quote_purchase, total_value, with_gas_buffer, CostBreakdown, CreationEstimate, FeeSchedule,
    PLATFORM_FEE_BPS,
};
pub use creation::{validate_step, AssetRequestForm, CreateWizard, FormStep};
pub use error::{FailureKind, FormField, LedgerFailure, TradeError, ValidationErrors};
pub use purchase::{max_purchasable, validate_purchase, PurchaseContext, PurchaseIntent};
pub use units::{available_percentage, sold_percentage, to_percentage, to_shares};

#[cfg(test)]
mod tests;
