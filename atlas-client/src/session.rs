use crate::config::NetworkConfig;
use crate::ledger::Ledger;
use atlas_storage::Storage;
use atlas_types::Address;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Verified,
    /// Documents handed in, not yet verified on the ledger.
    Pending,
    Unverified,
}

/// The connected wallet and what the ledger says about it.
#[derive(Debug, Clone)]
pub struct Session {
    address: Address,
    network: NetworkConfig,
    kyc_verified: bool,
    compliance_officer: bool,
    kyc_submitted: bool,
}

impl Session {
    /// A session with no ledger-derived flags set.
    pub fn new(address: Address, network: NetworkConfig) -> Self {
        Self {
            address,
            network,
            kyc_verified: false,
            compliance_officer: false,
            kyc_submitted: false,
        }
    }

    /// Reads KYC and role flags from the ledger. Failed reads count as `false`.
    pub async fn connect<L: Ledger + ?Sized>(
        ledger: &L,
        address: Address,
        network: NetworkConfig,
        store: &Storage,
    ) -> Self {
        let mut session = Self::new(address, network);
        session.refresh(ledger, store).await;
        info!(
            address = %session.address.short(),
            network = %session.network.network,
            kyc = ?session.kyc_status(),
            compliance = session.compliance_officer,
            "session connected"
        );
        session
    }

    pub async fn refresh<L: Ledger + ?Sized>(&mut self, ledger: &L, store: &Storage) {
        self.kyc_verified = match ledger.is_kyc_verified(self.address).await {
            Ok(verified) => verified,
            Err(e) => {
                warn!("Failed to read KYC status for {}: {}", self.address, e);
                false
            }
        };
        self.compliance_officer = match ledger.is_compliance_officer(self.address).await {
            Ok(officer) => officer,
            Err(e) => {
                warn!("Failed to read compliance role for {}: {}", self.address, e);
                false
            }
        };

        self.kyc_submitted = match store.kyc_submitted(&self.address) {
            Ok(submitted) => submitted,
            Err(e) => {
                warn!("Failed to read KYC submission flag: {}", e);
                false
            }
        };
        if self.kyc_verified && self.kyc_submitted {
            if let Err(e) = store.clear_kyc_submitted(self.address) {
                warn!("Failed to clear KYC submission flag: {}", e);
            }
            self.kyc_submitted = false;
        }
    }

    pub fn mark_kyc_submitted(&mut self, store: &Storage) -> anyhow::Result<()> {
        store.mark_kyc_submitted(self.address)?;
        self.kyc_submitted = true;
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn kyc_verified(&self) -> bool {
        self.kyc_verified
    }

    pub fn is_compliance_officer(&self) -> bool {
        self.compliance_officer
    }

    pub fn kyc_pending(&self) -> bool {
        !self.kyc_verified && self.kyc_submitted
    }

    pub fn kyc_status(&self) -> KycStatus {
        if self.kyc_verified {
            KycStatus::Verified
        } else if self.kyc_submitted {
            KycStatus::Pending
        } else {
            KycStatus::Unverified
        }
    }
}
