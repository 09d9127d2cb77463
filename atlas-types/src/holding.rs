use crate::address::Address;
use crate::asset::AssetId;
use serde::{Deserialize, Serialize};

/// Share balance of one user in one asset. Derived from ledger reads, never stored locally.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserHolding {
    pub owner: Address,
    pub asset_id: AssetId,
    pub shares: u64,
    pub locked: u64,
}

impl UserHolding {
    pub fn unlocked(&self) -> u64 {
        self.shares.saturating_sub(self.locked)
    }
}
