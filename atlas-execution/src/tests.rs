use super::*;
use atlas_types::{
    Address, AssetCategory, AssetId, AssetMetadata, AssetStatus, FractionalizedAsset, Percentage, RequestId,
    ShareType, TokenAmount,
};
use proptest::prelude::*;

fn tokens(raw: &str) -> TokenAmount {
    raw.parse().unwrap()
}

fn listed_asset() -> FractionalizedAsset {
    FractionalizedAsset {
        id: AssetId(7),
        request_id: RequestId(3),
        creator: Address([0x11; 20]),
        metadata: AssetMetadata {
            name: "Harbour Loft".to_string(),
            description: "Two-bedroom loft".to_string(),
            image_url: "https://img.example/loft.png".to_string(),
            category: AssetCategory::RealEstate,
        },
        total_shares: 1_000,
        available_shares: 1_000,
        price_per_share: tokens("2.0"),
        min_purchase_amount: 1,
        max_purchase_amount: 0,
        requires_purchaser_kyc: false,
        share_type: ShareType::Weighted,
        status: AssetStatus::Active,
        total_revenue: TokenAmount::ZERO,
        created_at: 1_700_000_000,
    }
}

fn ctx(asset: &FractionalizedAsset, held: u64, kyc: bool) -> PurchaseContext<'_> {
    PurchaseContext {
        asset,
        current_user_shares: held,
        kyc_verified: kyc,
    }
}

fn filled_form() -> AssetRequestForm {
    AssetRequestForm {
        category: AssetCategory::Art,
        name: "  Blue Period Study ".to_string(),
        description: "Oil on canvas".to_string(),
        image_url: "https://img.example/study.png".to_string(),
        total_shares: 1_000,
        price_per_share: "0.1".to_string(),
        min_purchase_amount: 1,
        max_purchase_amount: 0,
        share_type: ShareType::Weighted,
        requires_purchaser_kyc: true,
        ownership_confirmed: true,
        terms_accepted: true,
    }
}

// ════════════════════════════════════════════════════════════════
// Unit conversion
// ════════════════════════════════════════════════════════════════

#[test]
fn test_to_shares_floors() {
    assert_eq!(to_shares(Percentage::from_whole(50), 1_000).unwrap(), 500);
    assert_eq!(to_shares("12.345".parse().unwrap(), 1_000).unwrap(), 123);
    assert_eq!(to_shares("0.001".parse().unwrap(), 1_000).unwrap(), 0);
    assert_eq!(to_shares(Percentage::HUNDRED, 777).unwrap(), 777);
}

#[test]
fn test_to_shares_rejects_bad_input() {
    assert!(matches!(
        to_shares(Percentage::from_whole(10), 0),
        Err(TradeError::InvalidAssetState(_))
    ));
    assert!(matches!(
        to_shares(Percentage::ZERO, 1_000),
        Err(TradeError::InvalidAmount(_))
    ));
    assert!(matches!(
        to_shares(Percentage::from_whole(101), 1_000),
        Err(TradeError::InvalidAmount(_))
    ));
}

#[test]
fn test_to_percentage_truncates_to_thousandths() {
    assert_eq!(to_percentage(123, 1_000).unwrap().to_string(), "12.3");
    assert_eq!(to_percentage(1, 3).unwrap().thousandths(), 33_333);
    assert_eq!(to_percentage(0, 10).unwrap(), Percentage::ZERO);
    assert_eq!(to_percentage(10, 10).unwrap(), Percentage::HUNDRED);
    assert!(matches!(to_percentage(11, 10), Err(TradeError::InvalidAmount(_))));
    assert!(matches!(to_percentage(0, 0), Err(TradeError::InvalidAssetState(_))));
}

#[test]
fn test_sold_and_available_percentages() {
    assert_eq!(sold_percentage(250, 1_000).unwrap(), Percentage::from_whole(75));
    assert_eq!(available_percentage(250, 1_000).unwrap(), Percentage::from_whole(25));
}

proptest! {
    #[test]
    fn prop_to_shares_never_exceeds_supply(p in 1u32..=100_000, total in 1u64..=1_000_000_000_000) {
        let shares = to_shares(Percentage::from_thousandths(p), total).unwrap();
        prop_assert!(shares <= total);
    }

    #[test]
    fn prop_percentage_round_trip_never_grows(p in 1u32..=100_000, total in 1u64..=1_000_000_000) {
        let requested = Percentage::from_thousandths(p);
        let shares = to_shares(requested, total).unwrap();
        let back = to_percentage(shares, total).unwrap();
        prop_assert!(back <= requested);
    }

    #[test]
    fn prop_quote_total_is_base_plus_fee(shares in 0u64..=1_000_000, price_wei in 0u128..=10u128.pow(24)) {
        let quote = quote_purchase(shares, TokenAmount::from_wei(price_wei), &FeeSchedule::default()).unwrap();
        prop_assert_eq!(quote.total_cost.wei(), quote.base_cost.wei() + quote.fee.wei());
        prop_assert!(quote.fee <= quote.base_cost);
    }
}

// ════════════════════════════════════════════════════════════════
// Costs
// ════════════════════════════════════════════════════════════════

#[test]
fn test_quote_adds_platform_fee() {
    let quote = quote_purchase(100, tokens("2.0"), &FeeSchedule::default()).unwrap();
    assert_eq!(quote.base_cost, TokenAmount::from_tokens(200));
    assert_eq!(quote.fee, TokenAmount::from_tokens(5));
    assert_eq!(quote.total_cost, TokenAmount::from_tokens(205));
    assert_eq!(quote.total_cost.to_string(), "205.0");
}

#[test]
fn test_quote_zero_shares_is_free() {
    let quote = quote_purchase(0, tokens("2.0"), &FeeSchedule::default()).unwrap();
    assert!(quote.total_cost.is_zero());
}

#[test]
fn test_quote_overflow_is_reported() {
    let err = quote_purchase(u64::MAX, TokenAmount::from_wei(u128::MAX / 2), &FeeSchedule::default()).unwrap_err();
    assert!(matches!(err, TradeError::InvalidAmount(_)));
}

#[test]
fn test_creation_estimate_deducts_fee() {
    let estimate = estimate_creation(1_000, tokens("0.1"), &FeeSchedule::default()).unwrap();
    assert_eq!(estimate.total_value, TokenAmount::from_tokens(100));
    assert_eq!(estimate.platform_fee, tokens("2.5"));
    assert_eq!(estimate.net_proceeds, tokens("97.5"));
}

#[test]
fn test_fee_schedule_bounds() {
    assert_eq!(FeeSchedule::default().platform_fee_bps(), PLATFORM_FEE_BPS);
    assert!(FeeSchedule::new(10_000).is_ok());
    assert!(FeeSchedule::new(10_001).is_err());

    let zero = FeeSchedule::new(0).unwrap();
    let quote = quote_purchase(10, tokens("1.5"), &zero).unwrap();
    assert_eq!(quote.total_cost, quote.base_cost);
}

#[test]
fn test_fee_schedule_deserialize_enforces_bounds() {
    let fees: FeeSchedule = serde_json::from_str("250").unwrap();
    assert_eq!(fees, FeeSchedule::default());
    assert_eq!(serde_json::to_string(&fees).unwrap(), "250");
    assert!(serde_json::from_str::<FeeSchedule>("10001").is_err());
}

#[test]
fn test_gas_buffer() {
    assert_eq!(with_gas_buffer(100_000), 110_000);
    assert_eq!(with_gas_buffer(21_001), 23_101);
    assert_eq!(with_gas_buffer(0), 0);
    assert_eq!(with_gas_buffer(u64::MAX), u64::MAX);
}

// ════════════════════════════════════════════════════════════════
// Purchase validation
// ════════════════════════════════════════════════════════════════

#[test]
fn test_purchase_zero_amount() {
    let asset = listed_asset();
    assert!(matches!(
        validate_purchase(0, &ctx(&asset, 0, true)),
        Err(TradeError::InvalidAmount(_))
    ));
}

#[test]
fn test_purchase_below_minimum() {
    let mut asset = listed_asset();
    asset.min_purchase_amount = 10;
    assert_eq!(
        validate_purchase(5, &ctx(&asset, 0, true)),
        Err(TradeError::BelowMinimum {
            minimum: 10,
            requested: 5,
            deficit: 5
        })
    );
}

#[test]
fn test_purchase_insufficient_supply() {
    let mut asset = listed_asset();
    asset.available_shares = 30;
    assert_eq!(
        validate_purchase(50, &ctx(&asset, 0, true)),
        Err(TradeError::InsufficientSupply {
            requested: 50,
            available: 30
        })
    );
}

#[test]
fn test_purchase_per_user_cap() {
    let mut asset = listed_asset();
    asset.max_purchase_amount = 100;

    assert_eq!(
        validate_purchase(10, &ctx(&asset, 95, true)),
        Err(TradeError::ExceedsPerUserLimit {
            limit: 100,
            requested: 10,
            remaining: 5
        })
    );
    assert_eq!(
        validate_purchase(1, &ctx(&asset, 100, true)),
        Err(TradeError::LimitAlreadyReached { limit: 100, held: 100 })
    );
    assert!(validate_purchase(5, &ctx(&asset, 95, true)).is_ok());
}

#[test]
fn test_purchase_requires_kyc() {
    let mut asset = listed_asset();
    asset.requires_purchaser_kyc = true;
    assert_eq!(validate_purchase(1, &ctx(&asset, 0, false)), Err(TradeError::KycRequired));
    assert!(validate_purchase(1, &ctx(&asset, 0, true)).is_ok());
}

#[test]
fn test_purchase_checks_run_in_order() {
    let mut asset = listed_asset();
    asset.min_purchase_amount = 10;
    asset.available_shares = 3;
    asset.requires_purchaser_kyc = true;

    // Below minimum wins over supply and KYC.
    assert!(matches!(
        validate_purchase(5, &ctx(&asset, 0, false)),
        Err(TradeError::BelowMinimum { .. })
    ));
    // Supply wins over KYC.
    assert!(matches!(
        validate_purchase(20, &ctx(&asset, 0, false)),
        Err(TradeError::InsufficientSupply { .. })
    ));
}

#[test]
fn test_max_purchasable() {
    let mut asset = listed_asset();
    asset.available_shares = 300;
    assert_eq!(max_purchasable(&ctx(&asset, 0, true)), 300);

    asset.max_purchase_amount = 100;
    assert_eq!(max_purchasable(&ctx(&asset, 40, true)), 60);
    assert_eq!(max_purchasable(&ctx(&asset, 120, true)), 0);
}

#[test]
fn test_purchase_intent_clamps_selection() {
    let mut asset = listed_asset();
    asset.min_purchase_amount = 5;
    asset.available_shares = 20;

    let mut intent = PurchaseIntent::new(&ctx(&asset, 0, true));
    assert_eq!(intent.shares(), 5);
    assert_eq!(intent.upper_bound(), 20);

    assert_eq!(intent.set_shares(500), 20);
    assert_eq!(intent.increment(), 20);
    assert_eq!(intent.set_shares(0), 1);
    assert_eq!(intent.decrement(), 1);

    // 1.5% of 1000 is 15 shares.
    assert_eq!(intent.set_percentage("1.5".parse().unwrap()).unwrap(), 15);
    assert_eq!(intent.percentage().unwrap().to_string(), "1.5");
    assert_eq!(intent.quote(&FeeSchedule::default()).unwrap().base_cost, TokenAmount::from_tokens(30));
}

#[test]
fn test_purchase_intent_on_sold_out_asset() {
    let mut asset = listed_asset();
    asset.available_shares = 0;

    let intent = PurchaseIntent::new(&ctx(&asset, 0, true));
    assert_eq!(intent.upper_bound(), 1);
    assert_eq!(intent.shares(), 1);
    assert!(matches!(
        intent.validate(&ctx(&asset, 0, true)),
        Err(TradeError::InsufficientSupply { .. })
    ));
}

// ════════════════════════════════════════════════════════════════
// Ledger error classification
// ════════════════════════════════════════════════════════════════

#[test]
fn test_classify_ledger_errors() {
    let cases = [
        ("execution reverted: KYC not verified", FailureKind::KycRequired),
        ("insufficient funds for gas * price + value", FailureKind::InsufficientFunds),
        ("User rejected the request.", FailureKind::Rejected),
        ("MetaMask Tx Signature: User denied transaction signature.", FailureKind::Rejected),
        ("nonce too low", FailureKind::Unknown),
    ];
    for (message, expected) in cases {
        let failure = classify_ledger_error(message);
        assert_eq!(failure.kind, expected, "{message}");
        assert_eq!(failure.detail, message);
    }
}

#[test]
fn test_classify_prefers_kyc() {
    let failure = classify_ledger_error("rejected: kyc missing, insufficient funds");
    assert_eq!(failure.kind, FailureKind::KycRequired);
    assert_eq!(failure.to_string(), FailureKind::KycRequired.user_message());
}

// ════════════════════════════════════════════════════════════════
// Asset request form
// ════════════════════════════════════════════════════════════════

#[test]
fn test_details_step_name_length() {
    let mut form = filled_form();
    form.name = "a".repeat(128);
    assert!(validate_step(&form, FormStep::AssetDetails).is_empty());

    form.name = "a".repeat(129);
    let errors = validate_step(&form, FormStep::AssetDetails);
    assert!(errors.contains(FormField::AssetName));
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_details_step_required_fields() {
    let form = AssetRequestForm {
        name: "   ".to_string(),
        ..AssetRequestForm::default()
    };
    let errors = validate_step(&form, FormStep::AssetDetails);
    assert_eq!(errors.get(FormField::AssetName), Some("Asset name is required"));
    assert_eq!(errors.get(FormField::AssetDescription), Some("Description is required"));
    assert_eq!(errors.get(FormField::AssetImageUrl), Some("Image URL is required"));
}

#[test]
fn test_share_step_accepts_valid_structure() {
    let form = filled_form();
    assert!(validate_step(&form, FormStep::ShareStructure).is_empty());
    let estimate = form.estimate(&FeeSchedule::default()).unwrap();
    assert_eq!(estimate.total_value, TokenAmount::from_tokens(100));
}

#[test]
fn test_share_step_rejections() {
    let mut form = filled_form();
    form.total_shares = 0;
    form.price_per_share = "0".to_string();
    let errors = validate_step(&form, FormStep::ShareStructure);
    assert_eq!(errors.get(FormField::TotalShares), Some("Must have at least 1 share"));
    assert_eq!(errors.get(FormField::PricePerShare), Some("Price must be greater than 0"));
    assert_eq!(errors.get(FormField::MinPurchaseAmount), Some("Cannot exceed total shares"));

    let mut form = filled_form();
    form.total_shares = 1_000_000_001;
    form.price_per_share = "1000000.5".to_string();
    form.min_purchase_amount = 0;
    let errors = validate_step(&form, FormStep::ShareStructure);
    assert!(errors.contains(FormField::TotalShares));
    assert!(errors.contains(FormField::PricePerShare));
    assert!(errors.contains(FormField::MinPurchaseAmount));

    let mut form = filled_form();
    form.price_per_share = "abc".to_string();
    form.min_purchase_amount = 10;
    form.max_purchase_amount = 5;
    let errors = validate_step(&form, FormStep::ShareStructure);
    assert!(errors.contains(FormField::PricePerShare));
    assert_eq!(
        errors.get(FormField::MaxPurchaseAmount),
        Some("Must be at least the minimum purchase")
    );
}

#[test]
fn test_review_step_requires_acknowledgements() {
    let mut form = filled_form();
    form.ownership_confirmed = false;
    form.terms_accepted = false;
    let errors = validate_step(&form, FormStep::Review);
    assert!(errors.contains(FormField::OwnershipConfirmed));
    assert!(errors.contains(FormField::TermsAccepted));
}

#[test]
fn test_form_to_request_trims_fields() {
    let request = filled_form().to_request().unwrap();
    assert_eq!(request.metadata.name, "Blue Period Study");
    assert_eq!(request.metadata.category, AssetCategory::Art);
    assert_eq!(request.shares.price_per_share, tokens("0.1"));
    assert!(request.requires_purchaser_kyc);
}

#[test]
fn test_form_deserializes_with_defaults() {
    let form: AssetRequestForm = serde_json::from_str(r#"{"name":"Vault","price_per_share":"3"}"#).unwrap();
    assert_eq!(form.total_shares, 1_000);
    assert_eq!(form.min_purchase_amount, 1);
    assert_eq!(form.parsed_price(), Some(TokenAmount::from_tokens(3)));
}

#[test]
fn test_wizard_blocks_and_clears_errors() {
    let mut wizard = CreateWizard::new();
    assert_eq!(wizard.step(), FormStep::AssetDetails);

    let errors = wizard.next_step().unwrap_err();
    assert!(errors.contains(FormField::AssetName));
    assert_eq!(wizard.step(), FormStep::AssetDetails);

    wizard.edit(FormField::AssetName, |f| f.name = "Gold Bar".to_string());
    assert!(!wizard.errors().contains(FormField::AssetName));
    assert!(wizard.errors().contains(FormField::AssetDescription));

    wizard.edit(FormField::AssetDescription, |f| f.description = "1kg".to_string());
    wizard.edit(FormField::AssetImageUrl, |f| f.image_url = "https://img.example/gold.png".to_string());
    assert_eq!(wizard.next_step(), Ok(FormStep::ShareStructure));
    assert_eq!(wizard.prev_step(), FormStep::AssetDetails);
    assert_eq!(wizard.prev_step(), FormStep::AssetDetails);
}

#[test]
fn test_wizard_submission_returns_to_failing_step() {
    let mut form = filled_form();
    form.price_per_share = String::new();
    let mut wizard = CreateWizard::with_form(form.clone());
    wizard.next_step().unwrap();
    wizard.next_step().unwrap_err();

    let err = wizard.submission().unwrap_err();
    assert!(matches!(err, TradeError::Validation(_)));
    assert_eq!(wizard.step(), FormStep::ShareStructure);
    assert_eq!(wizard.form(), &form);

    wizard.edit(FormField::PricePerShare, |f| f.price_per_share = "0.1".to_string());
    let request = wizard.submission().unwrap();
    assert_eq!(request.shares.total_shares, 1_000);

    wizard.reset();
    assert_eq!(wizard.form(), &AssetRequestForm::default());
    assert_eq!(wizard.step(), FormStep::AssetDetails);
}
