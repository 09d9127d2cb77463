use crate::address::Address;
use crate::amount::TokenAmount;
use crate::asset::AssetId;
use crate::request::{NewAssetRequest, RequestId};
use serde::{Deserialize, Serialize};

/// Write operations accepted by the fractionalization ledger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum LedgerInstruction {
    // ══════════════════════════════════════════════════════════════
    // Asset Creation & Compliance
    // ══════════════════════════════════════════════════════════════
    CreateRequest(NewAssetRequest),
    ApproveRequest { request_id: RequestId },
    RejectRequest { request_id: RequestId, reason: String },

    // ══════════════════════════════════════════════════════════════
    // Trading
    // ══════════════════════════════════════════════════════════════
    /// Payment equal to the quoted total cost travels as the transaction value.
    PurchaseShares {
        asset_id: AssetId,
        amount: u64,
        max_price_per_share: TokenAmount,
    },
    TransferShares { asset_id: AssetId, to: Address, amount: u64 },
    LockShares { asset_id: AssetId, amount: u64 },
    UnlockShares { asset_id: AssetId, amount: u64 },

    // ══════════════════════════════════════════════════════════════
    // Creator Revenue
    // ══════════════════════════════════════════════════════════════
    WithdrawRevenue { asset_id: AssetId },
}

impl LedgerInstruction {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerInstruction::CreateRequest(_) => "createFractionalizationRequest",
            LedgerInstruction::ApproveRequest { .. } => "approveRequest",
            LedgerInstruction::RejectRequest { .. } => "rejectRequest",
            LedgerInstruction::PurchaseShares { .. } => "purchaseShares",
            LedgerInstruction::TransferShares { .. } => "transferShares",
            LedgerInstruction::LockShares { .. } => "lockShares",
            LedgerInstruction::UnlockShares { .. } => "unlockShares",
            LedgerInstruction::WithdrawRevenue { .. } => "withdrawRevenue",
        }
    }
}
