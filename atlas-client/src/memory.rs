//! In-process ledger with the contract's observable rules. Backs the tests
//! and the simulation.

use crate::ledger::{Ledger, LedgerError, Receipt};
use anyhow::{bail, Result};
use async_trait::async_trait;
use atlas_types::{
    Address, AssetId, AssetStatus, FractionalizationRequest, FractionalizedAsset, LedgerEvent, LedgerInstruction,
    NewAssetRequest, RequestId, RequestStatus, TokenAmount, Transaction, UserHolding,
};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 256;
const DEFAULT_PLATFORM_FEE_BPS: u16 = 250;

#[derive(Debug, Clone, Default)]
struct Account {
    balance: TokenAmount,
    nonce: u64,
    kyc_verified: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Position {
    shares: u64,
    locked: u64,
}

#[derive(Debug, Clone)]
pub struct LedgerState {
    assets: BTreeMap<AssetId, FractionalizedAsset>,
    requests: BTreeMap<RequestId, FractionalizationRequest>,
    accounts: BTreeMap<Address, Account>,
    positions: BTreeMap<(Address, AssetId), Position>,
    /// Creator revenue not yet withdrawn.
    revenue: BTreeMap<AssetId, TokenAmount>,
    officers: BTreeSet<Address>,
    alpha_mode: bool,
    platform_fee_bps: u16,
    collected_fees: TokenAmount,
    next_request_id: u64,
    next_asset_id: u64,
    clock: u64,
    /// Message for the next submission to fail with, as a wallet would.
    fail_next: Option<String>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            assets: BTreeMap::new(),
            requests: BTreeMap::new(),
            accounts: BTreeMap::new(),
            positions: BTreeMap::new(),
            revenue: BTreeMap::new(),
            officers: BTreeSet::new(),
            alpha_mode: false,
            platform_fee_bps: DEFAULT_PLATFORM_FEE_BPS,
            collected_fees: TokenAmount::ZERO,
            next_request_id: 1,
            next_asset_id: 1,
            clock: 1_700_000_000,
            fail_next: None,
        }
    }
}

impl LedgerState {
    fn position(&self, owner: Address, asset_id: AssetId) -> Position {
        self.positions.get(&(owner, asset_id)).copied().unwrap_or_default()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 12;
        self.clock
    }

    fn mint(&mut self, request_id: RequestId) -> Result<AssetId> {
        let asset_id = AssetId(self.next_asset_id);
        let created_at = self.tick();
        let Some(request) = self.requests.get_mut(&request_id) else {
            bail!("Request does not exist");
        };
        request.status = RequestStatus::Approved;
        request.asset_id = Some(asset_id);
        let asset = FractionalizedAsset::from_request(request, asset_id, created_at);
        self.assets.insert(asset_id, asset);
        self.next_asset_id += 1;
        Ok(asset_id)
    }

    fn pending_request(&self, request_id: RequestId) -> Result<&FractionalizationRequest> {
        match self.requests.get(&request_id) {
            Some(r) if r.is_pending() => Ok(r),
            Some(_) => bail!("Request not pending"),
            None => bail!("Request does not exist"),
        }
    }

    fn require_officer(&self, sender: &Address) -> Result<()> {
        if !self.officers.contains(sender) {
            bail!("AccessControl: account {} is missing COMPLIANCE_ROLE", sender);
        }
        Ok(())
    }
}

/// Applies one transaction. Every check runs before the first mutation, so a
/// failed transaction leaves the state untouched.
pub fn execute_transaction(tx: &Transaction, state: &mut LedgerState) -> Result<Vec<LedgerEvent>> {
    let sender = tx.sender;
    let balance = state.accounts.get(&sender).map(|a| a.balance).unwrap_or_default();
    if balance < tx.value {
        bail!("insufficient funds for transfer: balance {}, value {}", balance, tx.value);
    }

    match &tx.instruction {
        LedgerInstruction::CreateRequest(new) => create_request(new, sender, state),

        LedgerInstruction::ApproveRequest { request_id } => {
            state.require_officer(&sender)?;
            state.pending_request(*request_id)?;
            let asset_id = state.mint(*request_id)?;
            Ok(vec![LedgerEvent::RequestApproved {
                request_id: *request_id,
                asset_id,
                approver: sender,
            }])
        }

        LedgerInstruction::RejectRequest { request_id, reason } => {
            state.require_officer(&sender)?;
            state.pending_request(*request_id)?;
            if let Some(request) = state.requests.get_mut(request_id) {
                request.status = RequestStatus::Rejected;
                request.rejection_reason = Some(reason.clone());
            }
            Ok(vec![LedgerEvent::RequestRejected {
                request_id: *request_id,
                rejector: sender,
                reason: reason.clone(),
            }])
        }

        LedgerInstruction::PurchaseShares {
            asset_id,
            amount,
            max_price_per_share,
        } => purchase(tx, *asset_id, *amount, *max_price_per_share, state),

        LedgerInstruction::TransferShares { asset_id, to, amount } => {
            let from = state.position(sender, *asset_id);
            if *amount == 0 {
                bail!("Invalid amount");
            }
            if from.shares.saturating_sub(from.locked) < *amount {
                bail!("Insufficient unlocked shares");
            }
            if let Some(p) = state.positions.get_mut(&(sender, *asset_id)) {
                p.shares -= amount;
            }
            state.positions.entry((*to, *asset_id)).or_default().shares += amount;
            Ok(vec![LedgerEvent::SharesTransferred {
                asset_id: *asset_id,
                from: sender,
                to: *to,
                amount: *amount,
            }])
        }

        LedgerInstruction::LockShares { asset_id, amount } => {
            let position = state.position(sender, *asset_id);
            if position.shares.saturating_sub(position.locked) < *amount {
                bail!("Insufficient unlocked shares");
            }
            if let Some(p) = state.positions.get_mut(&(sender, *asset_id)) {
                p.locked += amount;
            }
            Ok(Vec::new())
        }

        LedgerInstruction::UnlockShares { asset_id, amount } => {
            if state.position(sender, *asset_id).locked < *amount {
                bail!("Insufficient locked shares");
            }
            if let Some(p) = state.positions.get_mut(&(sender, *asset_id)) {
                p.locked -= amount;
            }
            Ok(Vec::new())
        }

        LedgerInstruction::WithdrawRevenue { asset_id } => {
            let Some(asset) = state.assets.get(asset_id) else {
                bail!("Asset does not exist");
            };
            if asset.creator != sender {
                bail!("Only the creator can withdraw revenue");
            }
            let amount = state.revenue.get(asset_id).copied().unwrap_or_default();
            if amount.is_zero() {
                bail!("No revenue to withdraw");
            }
            let balance = state.accounts.get(&sender).map(|a| a.balance).unwrap_or_default();
            let Some(balance) = balance.checked_add(amount) else {
                bail!("Arithmetic overflow");
            };
            state.revenue.remove(asset_id);
            state.accounts.entry(sender).or_default().balance = balance;
            Ok(vec![LedgerEvent::RevenueWithdrawn {
                asset_id: *asset_id,
                creator: sender,
                amount,
            }])
        }
    }
}

fn create_request(new: &NewAssetRequest, sender: Address, state: &mut LedgerState) -> Result<Vec<LedgerEvent>> {
    if new.metadata.name.trim().is_empty() {
        bail!("Asset name required");
    }
    if new.shares.total_shares == 0 {
        bail!("Total fractions must be greater than 0");
    }
    if new.shares.price_per_share.is_zero() {
        bail!("Price must be greater than 0");
    }

    let request_id = RequestId(state.next_request_id);
    state.next_request_id += 1;
    let submitted_at = state.tick();
    let request = FractionalizationRequest::from_new(request_id, sender, new.clone(), submitted_at);
    state.requests.insert(request_id, request);

    let mut events = vec![LedgerEvent::RequestCreated {
        request_id,
        proposer: sender,
        asset_name: new.metadata.name.clone(),
        total_shares: new.shares.total_shares,
        price_per_share: new.shares.price_per_share,
    }];

    if state.alpha_mode {
        let asset_id = state.mint(request_id)?;
        events.push(LedgerEvent::RequestApproved {
            request_id,
            asset_id,
            approver: sender,
        });
    }
    Ok(events)
}

fn purchase(
    tx: &Transaction,
    asset_id: AssetId,
    amount: u64,
    max_price_per_share: TokenAmount,
    state: &mut LedgerState,
) -> Result<Vec<LedgerEvent>> {
    let buyer = tx.sender;
    let Some(asset) = state.assets.get(&asset_id) else {
        bail!("Asset does not exist");
    };
    if !asset.is_active() {
        bail!("Asset is not active");
    }
    if amount == 0 {
        bail!("Invalid amount");
    }
    if amount < asset.min_purchase_amount {
        bail!("Below minimum purchase amount");
    }
    if amount > asset.available_shares {
        bail!("Insufficient fractions available");
    }
    let held = state.position(buyer, asset_id).shares;
    if asset.has_purchase_cap() && held.saturating_add(amount) > asset.max_purchase_amount {
        bail!("Exceeds maximum purchase amount");
    }
    if asset.requires_purchaser_kyc && !state.accounts.get(&buyer).is_some_and(|a| a.kyc_verified) {
        bail!("Purchaser KYC verification required");
    }
    if asset.price_per_share > max_price_per_share {
        bail!("Price per share changed");
    }

    let Some(cost) = asset.price_per_share.checked_mul_count(amount) else {
        bail!("Arithmetic overflow");
    };
    let Some(fee) = cost.checked_bps(state.platform_fee_bps) else {
        bail!("Arithmetic overflow");
    };
    let Some(total_cost) = cost.checked_add(fee) else {
        bail!("Arithmetic overflow");
    };
    if tx.value < total_cost {
        bail!("Insufficient payment: sent {}, required {}", tx.value, total_cost);
    }

    let pending_revenue = state.revenue.get(&asset_id).copied().unwrap_or_default();
    let (Some(revenue), Some(collected_fees), Some(total_revenue)) = (
        pending_revenue.checked_add(cost),
        state.collected_fees.checked_add(fee),
        asset.total_revenue.checked_add(cost),
    ) else {
        bail!("Arithmetic overflow");
    };

    // Excess payment stays with the buyer.
    let account = state.accounts.entry(buyer).or_default();
    account.balance = account.balance.saturating_sub(total_cost);
    state.positions.entry((buyer, asset_id)).or_default().shares += amount;
    state.revenue.insert(asset_id, revenue);
    state.collected_fees = collected_fees;
    if let Some(asset) = state.assets.get_mut(&asset_id) {
        asset.available_shares -= amount;
        asset.total_revenue = total_revenue;
    }

    Ok(vec![LedgerEvent::SharesPurchased {
        asset_id,
        buyer,
        amount,
        total_cost,
    }])
}

pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    events: broadcast::Sender<LedgerEvent>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(LedgerState::default()),
            events,
        }
    }

    // ════════════════════════════════════════════════════════════════
    // Seeding
    // ════════════════════════════════════════════════════════════════

    pub async fn fund(&self, address: Address, amount: TokenAmount) -> Result<()> {
        let mut state = self.state.write().await;
        let account = state.accounts.entry(address).or_default();
        let Some(balance) = account.balance.checked_add(amount) else {
            bail!("Balance overflow funding {}", address);
        };
        account.balance = balance;
        Ok(())
    }

    pub async fn verify_kyc(&self, address: Address) {
        self.state.write().await.accounts.entry(address).or_default().kyc_verified = true;
    }

    pub async fn grant_compliance_role(&self, address: Address) {
        self.state.write().await.officers.insert(address);
    }

    pub async fn set_alpha_mode(&self, enabled: bool) {
        self.state.write().await.alpha_mode = enabled;
    }

    pub async fn set_platform_fee_bps(&self, bps: u16) {
        self.state.write().await.platform_fee_bps = bps;
    }

    /// Makes the next submission fail with `message`, without touching state.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.state.write().await.fail_next = Some(message.into());
    }

    /// Creates and immediately approves a request, returning the listed asset.
    pub async fn list_asset(&self, creator: Address, new: NewAssetRequest) -> Result<AssetId> {
        let mut state = self.state.write().await;
        create_request(&new, creator, &mut state)?;
        let request_id = RequestId(state.next_request_id - 1);
        match state.requests.get(&request_id).and_then(|r| r.asset_id) {
            Some(asset_id) => Ok(asset_id),
            None => state.mint(request_id),
        }
    }

    pub async fn deactivate(&self, asset_id: AssetId) {
        if let Some(asset) = self.state.write().await.assets.get_mut(&asset_id) {
            asset.status = AssetStatus::Cancelled;
        }
    }

    // ════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════

    pub async fn balance_of(&self, address: Address) -> TokenAmount {
        self.state
            .read()
            .await
            .accounts
            .get(&address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    pub async fn collected_fees(&self) -> TokenAmount {
        self.state.read().await.collected_fees
    }

    pub async fn assets(&self) -> Vec<FractionalizedAsset> {
        self.state.read().await.assets.values().cloned().collect()
    }

    /// Sum of every position in `asset_id`.
    pub async fn shares_outstanding(&self, asset_id: AssetId) -> u64 {
        self.state
            .read()
            .await
            .positions
            .iter()
            .filter(|((_, id), _)| *id == asset_id)
            .map(|(_, p)| p.shares)
            .sum()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn active_asset_ids(&self) -> Result<Vec<AssetId>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.assets.values().filter(|a| a.is_active()).map(|a| a.id).collect())
    }

    async fn asset(&self, id: AssetId) -> Result<FractionalizedAsset, LedgerError> {
        self.state
            .read()
            .await
            .assets
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("asset {id}")))
    }

    async fn request(&self, id: RequestId) -> Result<FractionalizationRequest, LedgerError> {
        self.state
            .read()
            .await
            .requests
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("request {id}")))
    }

    async fn pending_requests(&self) -> Result<Vec<FractionalizationRequest>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.requests.values().filter(|r| r.is_pending()).cloned().collect())
    }

    async fn user_requests(&self, user: Address) -> Result<Vec<RequestId>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .requests
            .values()
            .filter(|r| r.proposer == user)
            .map(|r| r.id)
            .collect())
    }

    async fn user_tokens(&self, user: Address) -> Result<Vec<AssetId>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .positions
            .iter()
            .filter(|((owner, _), p)| *owner == user && p.shares > 0)
            .map(|((_, asset_id), _)| *asset_id)
            .collect())
    }

    async fn share_balance(&self, user: Address, asset: AssetId) -> Result<UserHolding, LedgerError> {
        let position = self.state.read().await.position(user, asset);
        Ok(UserHolding {
            owner: user,
            asset_id: asset,
            shares: position.shares,
            locked: position.locked,
        })
    }

    async fn is_kyc_verified(&self, user: Address) -> Result<bool, LedgerError> {
        let state = self.state.read().await;
        Ok(state.accounts.get(&user).is_some_and(|a| a.kyc_verified))
    }

    async fn is_compliance_officer(&self, user: Address) -> Result<bool, LedgerError> {
        Ok(self.state.read().await.officers.contains(&user))
    }

    async fn platform_fee_bps(&self) -> Result<u16, LedgerError> {
        Ok(self.state.read().await.platform_fee_bps)
    }

    async fn alpha_mode(&self) -> Result<bool, LedgerError> {
        Ok(self.state.read().await.alpha_mode)
    }

    async fn submit(&self, tx: Transaction) -> Result<Receipt, LedgerError> {
        let mut state = self.state.write().await;
        if let Some(message) = state.fail_next.take() {
            warn!(instruction = tx.instruction.name(), "submission failed: {}", message);
            return Err(LedgerError::Reverted(message));
        }

        let nonce = state.accounts.get(&tx.sender).map(|a| a.nonce).unwrap_or_default();
        let tx_hash = tx
            .id(nonce)
            .map_err(|e| LedgerError::Unavailable(format!("failed to encode transaction: {e}")))?;
        let events = execute_transaction(&tx, &mut state).map_err(|e| {
            debug!(instruction = tx.instruction.name(), "reverted: {}", e);
            LedgerError::Reverted(format!("execution reverted: {e}"))
        })?;
        state.accounts.entry(tx.sender).or_default().nonce += 1;
        drop(state);

        for event in &events {
            // No subscribers is fine.
            let _ = self.events.send(event.clone());
        }
        Ok(Receipt { tx_hash, events })
    }

    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }
}
