use atlas_types::address::ParseAddressError;
use atlas_types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const FRACTIONALIZATION_ENV: &str = "ATLAS_FRACTIONALIZATION_CONTRACT";
pub const KYC_REGISTRY_ENV: &str = "ATLAS_KYC_REGISTRY_CONTRACT";

const OPN_FRACTIONALIZATION: Address = Address([
    0xe6, 0x3c, 0x3d, 0x97, 0xe3, 0xca, 0xb0, 0x5f, 0xf7, 0x17, 0x49, 0x1a, 0x75, 0x7e, 0xb3, 0x7b, 0x77, 0xee, 0x08,
    0x6d,
]);
const OPN_KYC_REGISTRY: Address = Address([
    0x7d, 0x6d, 0xe0, 0xab, 0x2b, 0x00, 0x87, 0x5a, 0x6c, 0xef, 0x64, 0xb4, 0x35, 0x0c, 0x86, 0xa6, 0xf1, 0xe7, 0x79,
    0xcc,
]);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read network config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed network config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{name}: {source}")]
    Address {
        name: &'static str,
        #[source]
        source: ParseAddressError,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Polygon,
    Arbitrum,
    Opn,
}

impl Network {
    /// Unknown chains resolve to OPN.
    pub fn from_chain_id(chain_id: u64) -> Self {
        match chain_id {
            1 => Network::Mainnet,
            137 => Network::Polygon,
            42161 => Network::Arbitrum,
            _ => Network::Opn,
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Polygon => 137,
            Network::Arbitrum => 42161,
            Network::Opn => 984,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Polygon => "polygon",
            Network::Arbitrum => "arbitrum",
            Network::Opn => "opn",
        }
    }

    fn accepts_env_overrides(&self) -> bool {
        matches!(self, Network::Mainnet | Network::Opn)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Contract addresses for one network.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network: Network,
    pub chain_id: u64,
    pub fractionalization_contract: Address,
    pub kyc_registry_contract: Address,
}

impl NetworkConfig {
    /// Built-in addresses, before environment overrides.
    pub fn builtin(network: Network) -> Self {
        let (fractionalization_contract, kyc_registry_contract) = match network {
            Network::Opn => (OPN_FRACTIONALIZATION, OPN_KYC_REGISTRY),
            _ => (Address::ZERO, Address::ZERO),
        };
        Self {
            network,
            chain_id: network.chain_id(),
            fractionalization_contract,
            kyc_registry_contract,
        }
    }

    /// Built-in addresses for `chain_id` with `ATLAS_*_CONTRACT` overrides applied.
    pub fn resolve(chain_id: u64) -> Result<Self, ConfigError> {
        let fractionalization = std::env::var(FRACTIONALIZATION_ENV).ok();
        let kyc = std::env::var(KYC_REGISTRY_ENV).ok();
        Self::builtin(Network::from_chain_id(chain_id)).with_overrides(fractionalization.as_deref(), kyc.as_deref())
    }

    /// Overrides only apply to mainnet and OPN; other networks ignore them.
    pub fn with_overrides(mut self, fractionalization: Option<&str>, kyc: Option<&str>) -> Result<Self, ConfigError> {
        if !self.network.accepts_env_overrides() {
            return Ok(self);
        }
        if let Some(raw) = fractionalization.filter(|s| !s.trim().is_empty()) {
            self.fractionalization_contract = parse_address(FRACTIONALIZATION_ENV, raw)?;
        }
        if let Some(raw) = kyc.filter(|s| !s.trim().is_empty()) {
            self.kyc_registry_contract = parse_address(KYC_REGISTRY_ENV, raw)?;
        }
        Ok(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// False while either contract is still the zero placeholder.
    pub fn is_deployed(&self) -> bool {
        self.fractionalization_contract != Address::ZERO && self.kyc_registry_contract != Address::ZERO
    }
}

fn parse_address(name: &'static str, raw: &str) -> Result<Address, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|source| ConfigError::Address { name, source })
}
