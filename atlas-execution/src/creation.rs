use crate::cost::{estimate_creation, CreationEstimate, FeeSchedule};
use crate::error::{FormField, TradeError, ValidationErrors};
use atlas_types::{AssetCategory, AssetMetadata, NewAssetRequest, ShareStructure, ShareType, TokenAmount};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MAX_NAME_CHARS: usize = 128;
pub const MAX_TOTAL_SHARES: u64 = 1_000_000_000;
pub const MAX_PRICE_PER_SHARE_TOKENS: u64 = 1_000_000;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    AssetDetails,
    ShareStructure,
    Review,
}

impl FormStep {
    pub const ALL: [FormStep; 3] = [FormStep::AssetDetails, FormStep::ShareStructure, FormStep::Review];

    pub fn number(&self) -> u8 {
        match self {
            FormStep::AssetDetails => 1,
            FormStep::ShareStructure => 2,
            FormStep::Review => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormStep::AssetDetails => "Asset Details",
            FormStep::ShareStructure => "Share Structure",
            FormStep::Review => "Review & Submit",
        }
    }

    pub fn next(&self) -> Option<FormStep> {
        match self {
            FormStep::AssetDetails => Some(FormStep::ShareStructure),
            FormStep::ShareStructure => Some(FormStep::Review),
            FormStep::Review => None,
        }
    }

    pub fn prev(&self) -> Option<FormStep> {
        match self {
            FormStep::AssetDetails => None,
            FormStep::ShareStructure => Some(FormStep::AssetDetails),
            FormStep::Review => Some(FormStep::ShareStructure),
        }
    }
}

/// Raw input of the three-step creation form. The price stays a string until
/// validation, matching what the user typed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AssetRequestForm {
    pub category: AssetCategory,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub total_shares: u64,
    pub price_per_share: String,
    pub min_purchase_amount: u64,
    /// Zero means unlimited.
    pub max_purchase_amount: u64,
    pub share_type: ShareType,
    pub requires_purchaser_kyc: bool,
    pub ownership_confirmed: bool,
    pub terms_accepted: bool,
}

impl Default for AssetRequestForm {
    fn default() -> Self {
        Self {
            category: AssetCategory::RealEstate,
            name: String::new(),
            description: String::new(),
            image_url: String::new(),
            total_shares: 1_000,
            price_per_share: String::new(),
            min_purchase_amount: 1,
            max_purchase_amount: 0,
            share_type: ShareType::Weighted,
            requires_purchaser_kyc: false,
            ownership_confirmed: false,
            terms_accepted: false,
        }
    }
}

impl AssetRequestForm {
    /// The typed price, if it parses as a positive decimal.
    pub fn parsed_price(&self) -> Option<TokenAmount> {
        self.price_per_share
            .trim()
            .parse::<TokenAmount>()
            .ok()
            .filter(|p| !p.is_zero())
    }

    pub fn validate_all(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for step in FormStep::ALL {
            errors.merge(validate_step(self, step));
        }
        errors
    }

    /// Total value and seller-side fee estimate shown on the review step.
    pub fn estimate(&self, fees: &FeeSchedule) -> Result<CreationEstimate, TradeError> {
        let price = self
            .parsed_price()
            .ok_or_else(|| TradeError::InvalidAmount("price must be greater than 0".to_string()))?;
        estimate_creation(self.total_shares, price, fees)
    }

    /// Builds the create-request payload once every step validates.
    pub fn to_request(&self) -> Result<NewAssetRequest, TradeError> {
        let errors = self.validate_all();
        if !errors.is_empty() {
            return Err(TradeError::Validation(errors));
        }
        let price_per_share = self
            .parsed_price()
            .ok_or_else(|| TradeError::InvalidAmount("price must be greater than 0".to_string()))?;

        Ok(NewAssetRequest {
            metadata: AssetMetadata {
                name: self.name.trim().to_string(),
                description: self.description.trim().to_string(),
                image_url: self.image_url.trim().to_string(),
                category: self.category,
            },
            shares: ShareStructure {
                total_shares: self.total_shares,
                price_per_share,
                min_purchase_amount: self.min_purchase_amount,
                max_purchase_amount: self.max_purchase_amount,
                share_type: self.share_type,
            },
            requires_purchaser_kyc: self.requires_purchaser_kyc,
        })
    }
}

/// Field errors for one step of the creation form; empty when the step may advance.
pub fn validate_step(form: &AssetRequestForm, step: FormStep) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    match step {
        FormStep::AssetDetails => {
            if form.name.trim().is_empty() {
                errors.insert(FormField::AssetName, "Asset name is required");
            } else if form.name.chars().count() > MAX_NAME_CHARS {
                errors.insert(
                    FormField::AssetName,
                    format!("Asset name must be at most {MAX_NAME_CHARS} characters"),
                );
            }
            if form.description.trim().is_empty() {
                errors.insert(FormField::AssetDescription, "Description is required");
            }
            if form.image_url.trim().is_empty() {
                errors.insert(FormField::AssetImageUrl, "Image URL is required");
            }
        }
        FormStep::ShareStructure => {
            if form.total_shares < 1 {
                errors.insert(FormField::TotalShares, "Must have at least 1 share");
            } else if form.total_shares > MAX_TOTAL_SHARES {
                errors.insert(FormField::TotalShares, "Maximum 1 billion shares allowed");
            }

            match form.parsed_price() {
                None => errors.insert(FormField::PricePerShare, "Price must be greater than 0"),
                Some(price) if price > TokenAmount::from_tokens(MAX_PRICE_PER_SHARE_TOKENS) => errors.insert(
                    FormField::PricePerShare,
                    "Price seems too high (max 1,000,000 per share)",
                ),
                Some(_) => {}
            }

            if form.min_purchase_amount < 1 {
                errors.insert(FormField::MinPurchaseAmount, "Minimum purchase must be at least 1");
            } else if form.min_purchase_amount > form.total_shares {
                errors.insert(FormField::MinPurchaseAmount, "Cannot exceed total shares");
            }

            if form.max_purchase_amount != 0 && form.max_purchase_amount < form.min_purchase_amount {
                errors.insert(
                    FormField::MaxPurchaseAmount,
                    "Must be at least the minimum purchase",
                );
            }
        }
        FormStep::Review => {
            if !form.ownership_confirmed {
                errors.insert(FormField::OwnershipConfirmed, "You must confirm ownership");
            }
            if !form.terms_accepted {
                errors.insert(FormField::TermsAccepted, "You must accept the terms");
            }
        }
    }

    errors
}

/// Step-by-step creation flow. Advancing is blocked while the current step
/// has errors; the form survives failed submissions and is reset only after
/// a successful one.
#[derive(Debug, Clone, Default)]
pub struct CreateWizard {
    form: AssetRequestForm,
    step: Option<FormStep>,
    errors: ValidationErrors,
}

impl CreateWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(form: AssetRequestForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn form(&self) -> &AssetRequestForm {
        &self.form
    }

    pub fn step(&self) -> FormStep {
        self.step.unwrap_or(FormStep::AssetDetails)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Applies an edit and clears any pending error on that field.
    pub fn edit<F>(&mut self, field: FormField, apply: F)
    where
        F: FnOnce(&mut AssetRequestForm),
    {
        apply(&mut self.form);
        self.errors.remove(field);
    }

    pub fn next_step(&mut self) -> Result<FormStep, ValidationErrors> {
        let current = self.step();
        self.errors = validate_step(&self.form, current);
        if !self.errors.is_empty() {
            debug!(step = current.number(), errors = self.errors.len(), "step blocked");
            return Err(self.errors.clone());
        }
        let next = current.next().unwrap_or(current);
        self.step = Some(next);
        Ok(next)
    }

    pub fn prev_step(&mut self) -> FormStep {
        let prev = self.step().prev().unwrap_or(FormStep::AssetDetails);
        self.step = Some(prev);
        prev
    }

    /// Re-validates every step. On failure the wizard moves back to the
    /// earliest step with errors and the form is left untouched.
    pub fn submission(&mut self) -> Result<NewAssetRequest, TradeError> {
        for step in FormStep::ALL {
            let errors = validate_step(&self.form, step);
            if !errors.is_empty() {
                self.step = Some(step);
                self.errors = errors.clone();
                return Err(TradeError::Validation(errors));
            }
        }
        self.errors = ValidationErrors::new();
        self.form.to_request()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
