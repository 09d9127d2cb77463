use anyhow::{anyhow, Result};
use atlas_types::Address;
use rocksdb::{Env, Options, DB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

const KYC_SUBMITTED_PREFIX: &str = "kyc_submitted_";

/// Client-side flags that survive restarts. Nothing here is authoritative;
/// the ledger remains the source of truth for verification status.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFlags {
    /// Addresses that have handed their documents to the KYC provider but
    /// are not yet verified on the ledger.
    pub kyc_submitted: BTreeSet<Address>,
}

pub struct Storage {
    pub db: DB,
}

fn kyc_key(address: &Address) -> String {
    format!("{}{}", KYC_SUBMITTED_PREFIX, hex::encode(address.as_bytes()))
}

impl Storage {
    /// Opens (or creates) the flag database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(|e| anyhow!("Failed to open DB: {}", e))?;
        info!(path = %path.display(), "local store opened");
        Ok(Self { db })
    }

    /// A store backed by rocksdb's in-memory environment. Nothing touches disk.
    pub fn in_memory() -> Result<Self> {
        let env = Env::mem_env().map_err(|e| anyhow!("Failed to create memory env: {}", e))?;
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_env(&env);
        let db = DB::open(&opts, "/atlas-flags").map_err(|e| anyhow!("Failed to open DB: {}", e))?;
        Ok(Self { db })
    }

    pub fn mark_kyc_submitted(&self, address: Address) -> Result<()> {
        let encoded = bincode::serialize(&true).map_err(|e| anyhow!("Serialization error: {}", e))?;
        self.db
            .put(kyc_key(&address).as_bytes(), encoded)
            .map_err(|e| anyhow!("DB write error: {}", e))?;
        debug!(%address, "kyc submission recorded");
        Ok(())
    }

    /// Forgets a submission, typically once the ledger reports the address verified.
    pub fn clear_kyc_submitted(&self, address: Address) -> Result<()> {
        self.db
            .delete(kyc_key(&address).as_bytes())
            .map_err(|e| anyhow!("DB delete error: {}", e))?;
        Ok(())
    }

    /// `false` when the address was never recorded.
    pub fn kyc_submitted(&self, address: &Address) -> Result<bool> {
        match self.db.get(kyc_key(address).as_bytes()) {
            Ok(Some(value)) => {
                bincode::deserialize(&value).map_err(|e| anyhow!("Deserialization error: {}", e))
            }
            Ok(None) => Ok(false),
            Err(e) => Err(anyhow!("DB read error: {}", e)),
        }
    }

    pub fn snapshot(&self) -> Result<LocalFlags> {
        let mut flags = LocalFlags::default();
        for entry in self.db.prefix_iterator(KYC_SUBMITTED_PREFIX.as_bytes()) {
            let (key, value) = entry.map_err(|e| anyhow!("DB read error: {}", e))?;
            let Some(hex_address) = key.strip_prefix(KYC_SUBMITTED_PREFIX.as_bytes()) else {
                break;
            };
            let submitted: bool =
                bincode::deserialize(&value).map_err(|e| anyhow!("Deserialization error: {}", e))?;
            if !submitted {
                continue;
            }
            let mut bytes = [0u8; 20];
            hex::decode_to_slice(hex_address, &mut bytes)
                .map_err(|e| anyhow!("Corrupt key {}: {}", String::from_utf8_lossy(&key), e))?;
            flags.kyc_submitted.insert(Address(bytes));
        }
        Ok(flags)
    }
}
