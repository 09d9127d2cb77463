use crate::address::Address;
use crate::amount::TokenAmount;
use crate::instruction::LedgerInstruction;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub sender: Address,
    pub instruction: LedgerInstruction,
    /// Native payment attached to the call.
    pub value: TokenAmount,
}

impl Transaction {
    pub fn new(sender: Address, instruction: LedgerInstruction) -> Self {
        Self {
            sender,
            instruction,
            value: TokenAmount::ZERO,
        }
    }

    pub fn with_value(mut self, value: TokenAmount) -> Self {
        self.value = value;
        self
    }

    pub fn signing_bytes(&self, nonce: u64) -> Result<Vec<u8>, bincode::Error> {
        #[derive(Serialize)]
        struct SigningTx<'a> {
            sender: &'a Address,
            nonce: u64,
            instruction: &'a LedgerInstruction,
            value: &'a TokenAmount,
        }

        let signing = SigningTx {
            sender: &self.sender,
            nonce,
            instruction: &self.instruction,
            value: &self.value,
        };

        bincode::serialize(&signing)
    }

    /// Hash identifying this transaction once the ledger has assigned `nonce`.
    pub fn id(&self, nonce: u64) -> Result<[u8; 32], bincode::Error> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.signing_bytes(nonce)?);
        Ok(*hasher.finalize().as_bytes())
    }
}
