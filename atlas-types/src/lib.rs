pub mod address;
pub mod amount;
pub mod asset;
pub mod event;
pub mod holding;
pub mod instruction;
pub mod request;
pub mod transaction;

pub use address::Address;
pub use amount::{ParseAmountError, Percentage, TokenAmount};
pub use asset::{AssetCategory, AssetId, AssetMetadata, AssetStatus, FractionalizedAsset, ShareType};
pub use event::LedgerEvent;
pub use holding::UserHolding;
pub use instruction::LedgerInstruction;
pub use request::{FractionalizationRequest, NewAssetRequest, RequestId, RequestStatus, ShareStructure};
pub use transaction::Transaction;
