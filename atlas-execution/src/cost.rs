use crate::error::TradeError;
use atlas_types::TokenAmount;
use serde::{Deserialize, Serialize};

/// 2.5% platform fee.
pub const PLATFORM_FEE_BPS: u16 = 250;
pub const MAX_FEE_BPS: u16 = 10_000;

/// Gas estimates get a 10% buffer before submission.
const GAS_BUFFER_PERCENT: u128 = 110;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u16", into = "u16")]
pub struct FeeSchedule {
    platform_fee_bps: u16,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_fee_bps: PLATFORM_FEE_BPS,
        }
    }
}

impl TryFrom<u16> for FeeSchedule {
    type Error = TradeError;

    fn try_from(platform_fee_bps: u16) -> Result<Self, Self::Error> {
        Self::new(platform_fee_bps)
    }
}

impl From<FeeSchedule> for u16 {
    fn from(fees: FeeSchedule) -> u16 {
        fees.platform_fee_bps
    }
}

impl FeeSchedule {
    pub fn new(platform_fee_bps: u16) -> Result<Self, TradeError> {
        if platform_fee_bps > MAX_FEE_BPS {
            return Err(TradeError::InvalidAmount(format!(
                "platform fee of {platform_fee_bps} bps exceeds 100%"
            )));
        }
        Ok(Self { platform_fee_bps })
    }

    pub fn platform_fee_bps(&self) -> u16 {
        self.platform_fee_bps
    }

    pub fn fee_on(&self, amount: TokenAmount) -> Result<TokenAmount, TradeError> {
        amount
            .checked_bps(self.platform_fee_bps)
            .ok_or_else(|| overflow("platform fee"))
    }
}

/// What a buyer pays: the listed price plus the platform fee on top.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBreakdown {
    pub shares: u64,
    pub price_per_share: TokenAmount,
    pub base_cost: TokenAmount,
    pub fee: TokenAmount,
    pub total_cost: TokenAmount,
}

/// Seller-side estimate shown while creating an asset. The fee is deducted
/// from proceeds here; it is informational and independent of the fee a
/// buyer attaches at purchase time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationEstimate {
    pub total_value: TokenAmount,
    pub platform_fee: TokenAmount,
    pub net_proceeds: TokenAmount,
}

fn overflow(what: &str) -> TradeError {
    TradeError::InvalidAmount(format!("{what} overflows the token amount range"))
}

pub fn total_value(shares: u64, price_per_share: TokenAmount) -> Result<TokenAmount, TradeError> {
    price_per_share
        .checked_mul_count(shares)
        .ok_or_else(|| overflow("share value"))
}

pub fn quote_purchase(
    shares: u64,
    price_per_share: TokenAmount,
    fees: &FeeSchedule,
) -> Result<CostBreakdown, TradeError> {
    let base_cost = total_value(shares, price_per_share)?;
    let fee = fees.fee_on(base_cost)?;
    let total_cost = base_cost.checked_add(fee).ok_or_else(|| overflow("total cost"))?;

    Ok(CostBreakdown {
        shares,
        price_per_share,
        base_cost,
        fee,
        total_cost,
    })
}

pub fn estimate_creation(
    total_shares: u64,
    price_per_share: TokenAmount,
    fees: &FeeSchedule,
) -> Result<CreationEstimate, TradeError> {
    let total_value = total_value(total_shares, price_per_share)?;
    let platform_fee = fees.fee_on(total_value)?;

    Ok(CreationEstimate {
        total_value,
        platform_fee,
        net_proceeds: total_value.saturating_sub(platform_fee),
    })
}

pub fn with_gas_buffer(estimate: u64) -> u64 {
    let buffered = estimate as u128 * GAS_BUFFER_PERCENT / 100;
    u64::try_from(buffered).unwrap_or(u64::MAX)
}
