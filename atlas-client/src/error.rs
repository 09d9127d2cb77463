use crate::ledger::LedgerError;
use atlas_execution::TradeError;
use atlas_types::AssetId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error("ledger read failed: {0}")]
    Read(#[from] LedgerError),

    #[error("asset {0} not found")]
    AssetNotFound(AssetId),

    #[error("{0} requires the compliance role")]
    NotAuthorized(&'static str),
}
