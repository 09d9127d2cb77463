use async_trait::async_trait;
use atlas_types::{
    Address, AssetId, FractionalizationRequest, FractionalizedAsset, LedgerEvent, RequestId, Transaction,
    UserHolding,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger or the wallet refused the write; the message is passed through verbatim.
    #[error("{0}")]
    Reverted(String),

    #[error("{0} not found")]
    NotFound(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: [u8; 32],
    pub events: Vec<LedgerEvent>,
}

impl Receipt {
    pub fn tx_hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.tx_hash))
    }
}

/// The external fractionalization ledger. Calls are single-shot; nothing
/// here retries.
#[async_trait]
pub trait Ledger: Send + Sync {
    // Reads
    async fn active_asset_ids(&self) -> Result<Vec<AssetId>, LedgerError>;
    async fn asset(&self, id: AssetId) -> Result<FractionalizedAsset, LedgerError>;
    async fn request(&self, id: RequestId) -> Result<FractionalizationRequest, LedgerError>;
    async fn pending_requests(&self) -> Result<Vec<FractionalizationRequest>, LedgerError>;
    async fn user_requests(&self, user: Address) -> Result<Vec<RequestId>, LedgerError>;
    async fn user_tokens(&self, user: Address) -> Result<Vec<AssetId>, LedgerError>;
    async fn share_balance(&self, user: Address, asset: AssetId) -> Result<UserHolding, LedgerError>;
    async fn is_kyc_verified(&self, user: Address) -> Result<bool, LedgerError>;
    async fn is_compliance_officer(&self, user: Address) -> Result<bool, LedgerError>;
    async fn platform_fee_bps(&self) -> Result<u16, LedgerError>;
    async fn alpha_mode(&self) -> Result<bool, LedgerError>;

    // Writes
    async fn submit(&self, tx: Transaction) -> Result<Receipt, LedgerError>;

    // Events
    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent>;
}
