use atlas_execution::{to_percentage, total_value, TradeError};
use atlas_types::{AssetCategory, FractionalizedAsset, Percentage, TokenAmount, UserHolding};
use serde::Serialize;
use std::collections::BTreeMap;

/// One asset the user holds, priced at the current listing price.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HoldingView {
    pub asset: FractionalizedAsset,
    pub holding: UserHolding,
    pub percentage_owned: Percentage,
    pub current_value: TokenAmount,
}

impl HoldingView {
    pub fn new(asset: FractionalizedAsset, holding: UserHolding) -> Result<Self, TradeError> {
        let percentage_owned = to_percentage(holding.shares, asset.total_shares)?;
        let current_value = total_value(holding.shares, asset.price_per_share)?;
        Ok(Self {
            asset,
            holding,
            percentage_owned,
            current_value,
        })
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Portfolio {
    pub holdings: Vec<HoldingView>,
    pub pending_requests: usize,
}

impl Portfolio {
    pub fn total_value(&self) -> Result<TokenAmount, TradeError> {
        self.holdings.iter().try_fold(TokenAmount::ZERO, |acc, h| {
            acc.checked_add(h.current_value)
                .ok_or_else(|| TradeError::InvalidAmount("portfolio value overflows".to_string()))
        })
    }

    pub fn total_shares(&self) -> u64 {
        self.holdings.iter().map(|h| h.holding.shares).sum()
    }

    /// Current value per category.
    pub fn allocation(&self) -> Result<BTreeMap<AssetCategory, TokenAmount>, TradeError> {
        let mut by_category: BTreeMap<AssetCategory, TokenAmount> = BTreeMap::new();
        for view in &self.holdings {
            let category = view.asset.metadata.category;
            let entry = by_category.entry(category).or_default();
            *entry = entry
                .checked_add(view.current_value)
                .ok_or_else(|| TradeError::InvalidAmount(format!("{category:?} allocation overflows")))?;
        }
        Ok(by_category)
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}
