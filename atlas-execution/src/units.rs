use crate::error::TradeError;
use atlas_types::amount::THOUSANDTHS_PER_PERCENT;
use atlas_types::Percentage;

const HUNDRED_PERCENT: u128 = 100 * THOUSANDTHS_PER_PERCENT as u128;

fn require_supply(total_shares: u64) -> Result<(), TradeError> {
    if total_shares == 0 {
        return Err(TradeError::InvalidAssetState(
            "asset has zero total shares".to_string(),
        ));
    }
    Ok(())
}

/// `floor(percentage / 100 * total_shares)`.
///
/// Truncation means the result can never exceed what the percentage allows,
/// and never exceeds `total_shares`.
pub fn to_shares(percentage: Percentage, total_shares: u64) -> Result<u64, TradeError> {
    require_supply(total_shares)?;
    if percentage.is_zero() || percentage > Percentage::HUNDRED {
        return Err(TradeError::InvalidAmount(format!(
            "percentage must be greater than 0 and at most 100, got {percentage}"
        )));
    }

    let shares = total_shares as u128 * percentage.thousandths() as u128 / HUNDRED_PERCENT;
    Ok(shares as u64)
}

/// `share_amount / total_shares * 100`, truncated to three decimal places.
pub fn to_percentage(share_amount: u64, total_shares: u64) -> Result<Percentage, TradeError> {
    require_supply(total_shares)?;
    if share_amount > total_shares {
        return Err(TradeError::InvalidAmount(format!(
            "{share_amount} shares exceeds total supply of {total_shares}"
        )));
    }

    let thousandths = share_amount as u128 * HUNDRED_PERCENT / total_shares as u128;
    Ok(Percentage::from_thousandths(thousandths as u32))
}

pub fn sold_percentage(available_shares: u64, total_shares: u64) -> Result<Percentage, TradeError> {
    to_percentage(total_shares.saturating_sub(available_shares), total_shares)
}

pub fn available_percentage(available_shares: u64, total_shares: u64) -> Result<Percentage, TradeError> {
    to_percentage(available_shares.min(total_shares), total_shares)
}
