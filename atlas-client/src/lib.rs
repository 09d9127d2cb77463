//! Ledger-facing client layer: session state, the marketplace service and
//! an in-memory ledger for tests and simulation.

pub mod config;
pub mod error;
pub mod ledger;
pub mod marketplace;
pub mod memory;
pub mod portfolio;
pub mod session;

pub use config::{ConfigError, Network, NetworkConfig};
pub use error::ClientError;
pub use ledger::{Ledger, LedgerError, Receipt};
pub use marketplace::{CreationOutcome, Marketplace, PurchaseReceipt};
pub use memory::MemoryLedger;
pub use portfolio::{HoldingView, Portfolio};
pub use session::{KycStatus, Session};
