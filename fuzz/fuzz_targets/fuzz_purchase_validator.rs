#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use atlas_execution::{max_purchasable, validate_purchase, PurchaseContext, TradeError};
use atlas_types::{
    Address, AssetId, AssetMetadata, AssetStatus, FractionalizedAsset, RequestId, ShareType, TokenAmount,
};

#[derive(Arbitrary, Debug)]
struct PurchaseInput {
    share_amount: u64,
    total_shares: u64,
    available_shares: u64,
    min_purchase_amount: u64,
    max_purchase_amount: u64,
    current_user_shares: u64,
    requires_purchaser_kyc: bool,
    kyc_verified: bool,
}

fuzz_target!(|data: PurchaseInput| {
    let total_shares = data.total_shares.max(1);
    let asset = FractionalizedAsset {
        id: AssetId(1),
        request_id: RequestId(1),
        creator: Address::ZERO,
        metadata: AssetMetadata::default(),
        total_shares,
        available_shares: data.available_shares % (total_shares.saturating_add(1)).max(1),
        price_per_share: TokenAmount::from_tokens(1),
        min_purchase_amount: data.min_purchase_amount,
        max_purchase_amount: data.max_purchase_amount,
        requires_purchaser_kyc: data.requires_purchaser_kyc,
        share_type: ShareType::Weighted,
        status: AssetStatus::Active,
        total_revenue: TokenAmount::ZERO,
        created_at: 0,
    };
    let ctx = PurchaseContext {
        asset: &asset,
        current_user_shares: data.current_user_shares,
        kyc_verified: data.kyc_verified,
    };

    match validate_purchase(data.share_amount, &ctx) {
        Ok(()) => {
            assert!(data.share_amount >= 1);
            assert!(data.share_amount <= asset.available_shares);
            assert!(data.share_amount <= max_purchasable(&ctx));
        }
        Err(TradeError::ExceedsPerUserLimit { remaining, requested, .. }) => {
            assert!(remaining < requested);
        }
        Err(_) => {}
    }
});
