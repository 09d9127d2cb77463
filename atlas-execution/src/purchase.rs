use crate::cost::{quote_purchase, CostBreakdown, FeeSchedule};
use crate::error::TradeError;
use crate::units::{to_percentage, to_shares};
use atlas_types::{AssetId, FractionalizedAsset, Percentage, TokenAmount};
use tracing::debug;

/// Everything the purchase validator needs to know about the buyer and the asset.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseContext<'a> {
    pub asset: &'a FractionalizedAsset,
    pub current_user_shares: u64,
    pub kyc_verified: bool,
}

/// Runs the pre-submission checks in their fixed order and stops at the first failure:
/// non-zero amount, minimum, availability, per-user cap, KYC.
pub fn validate_purchase(share_amount: u64, ctx: &PurchaseContext<'_>) -> Result<(), TradeError> {
    let result = check_purchase(share_amount, ctx);
    if let Err(e) = &result {
        debug!(asset = %ctx.asset.id, share_amount, "purchase refused: {}", e);
    }
    result
}

fn check_purchase(share_amount: u64, ctx: &PurchaseContext<'_>) -> Result<(), TradeError> {
    let asset = ctx.asset;

    if share_amount == 0 {
        return Err(TradeError::InvalidAmount(
            "share amount must be greater than 0".to_string(),
        ));
    }

    if share_amount < asset.min_purchase_amount {
        return Err(TradeError::BelowMinimum {
            minimum: asset.min_purchase_amount,
            requested: share_amount,
            deficit: asset.min_purchase_amount - share_amount,
        });
    }

    if share_amount > asset.available_shares {
        return Err(TradeError::InsufficientSupply {
            requested: share_amount,
            available: asset.available_shares,
        });
    }

    if asset.has_purchase_cap() {
        let limit = asset.max_purchase_amount;
        let held = ctx.current_user_shares;
        if held >= limit {
            return Err(TradeError::LimitAlreadyReached { limit, held });
        }
        if held.saturating_add(share_amount) > limit {
            return Err(TradeError::ExceedsPerUserLimit {
                limit,
                requested: share_amount,
                remaining: limit - held,
            });
        }
    }

    if asset.requires_purchaser_kyc && !ctx.kyc_verified {
        return Err(TradeError::KycRequired);
    }

    Ok(())
}

/// Largest share count the buyer could still purchase: availability, further
/// capped by the remaining per-user allowance.
pub fn max_purchasable(ctx: &PurchaseContext<'_>) -> u64 {
    let asset = ctx.asset;
    if asset.has_purchase_cap() {
        let allowance = asset.max_purchase_amount.saturating_sub(ctx.current_user_shares);
        asset.available_shares.min(allowance)
    } else {
        asset.available_shares
    }
}

/// In-progress selection in the buy dialog. Lives only as long as the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseIntent {
    asset_id: AssetId,
    total_shares: u64,
    price_per_share: TokenAmount,
    upper: u64,
    shares: u64,
}

impl PurchaseIntent {
    /// Starts at the asset's minimum purchase (at least one share).
    pub fn new(ctx: &PurchaseContext<'_>) -> Self {
        let upper = max_purchasable(ctx).max(1);
        let mut intent = Self {
            asset_id: ctx.asset.id,
            total_shares: ctx.asset.total_shares,
            price_per_share: ctx.asset.price_per_share,
            upper,
            shares: 1,
        };
        intent.set_shares(ctx.asset.min_purchase_amount);
        intent
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn shares(&self) -> u64 {
        self.shares
    }

    pub fn upper_bound(&self) -> u64 {
        self.upper
    }

    /// Clamps typed input into `[1, upper_bound]` and returns the stored value.
    pub fn set_shares(&mut self, shares: u64) -> u64 {
        self.shares = shares.clamp(1, self.upper);
        self.shares
    }

    pub fn increment(&mut self) -> u64 {
        self.set_shares(self.shares.saturating_add(1))
    }

    pub fn decrement(&mut self) -> u64 {
        self.set_shares(self.shares.saturating_sub(1))
    }

    /// Selects by ownership percentage; the share count is floored, then clamped.
    pub fn set_percentage(&mut self, percentage: Percentage) -> Result<u64, TradeError> {
        let shares = to_shares(percentage, self.total_shares)?;
        Ok(self.set_shares(shares))
    }

    pub fn percentage(&self) -> Result<Percentage, TradeError> {
        to_percentage(self.shares, self.total_shares)
    }

    pub fn quote(&self, fees: &FeeSchedule) -> Result<CostBreakdown, TradeError> {
        quote_purchase(self.shares, self.price_per_share, fees)
    }

    pub fn validate(&self, ctx: &PurchaseContext<'_>) -> Result<(), TradeError> {
        validate_purchase(self.shares, ctx)
    }
}
