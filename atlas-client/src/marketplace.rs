use crate::error::ClientError;
use crate::ledger::{Ledger, LedgerError, Receipt};
use crate::portfolio::{HoldingView, Portfolio};
use crate::session::Session;
use atlas_execution::{
    classify_ledger_error, quote_purchase, validate_purchase, CostBreakdown, CreateWizard, FeeSchedule,
    PurchaseContext, PurchaseIntent, TradeError,
};
use atlas_types::{
    Address, AssetId, FractionalizationRequest, FractionalizedAsset, LedgerEvent, LedgerInstruction, RequestId,
    Transaction,
};
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type ListingCache = Arc<RwLock<Option<Vec<FractionalizedAsset>>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub quote: CostBreakdown,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationOutcome {
    pub request_id: Option<RequestId>,
    /// Set when the ledger approved the request in the same transaction (alpha mode).
    pub asset_id: Option<AssetId>,
    pub receipt: Receipt,
}

impl CreationOutcome {
    pub fn auto_approved(&self) -> bool {
        self.asset_id.is_some()
    }
}

/// Read cache and write flows over a [`Ledger`] for one session.
///
/// The listing cache is only ever dropped and refetched, never patched:
/// after every successful write, and on every ledger event once
/// [`Marketplace::watch_events`] is running.
pub struct Marketplace<L: Ledger> {
    ledger: Arc<L>,
    session: Session,
    cache: ListingCache,
}

impl<L: Ledger + 'static> Marketplace<L> {
    pub fn new(ledger: Arc<L>, session: Session) -> Self {
        Self {
            ledger,
            session,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    // ════════════════════════════════════════════════════════════════
    // Listings
    // ════════════════════════════════════════════════════════════════

    /// Active listings, served from cache when present.
    pub async fn listings(&self) -> Result<Vec<FractionalizedAsset>, ClientError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Ok(cached.clone());
        }
        self.refresh().await
    }

    pub async fn refresh(&self) -> Result<Vec<FractionalizedAsset>, ClientError> {
        let ids = self.ledger.active_asset_ids().await?;
        let assets = try_join_all(ids.iter().map(|id| self.ledger.asset(*id))).await?;
        let active: Vec<FractionalizedAsset> = assets.into_iter().filter(|a| a.is_active()).collect();
        debug!(count = active.len(), "listings refreshed");
        *self.cache.write().await = Some(active.clone());
        Ok(active)
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    pub async fn is_cached(&self) -> bool {
        self.cache.read().await.is_some()
    }

    pub async fn asset(&self, asset_id: AssetId) -> Result<FractionalizedAsset, ClientError> {
        match self.ledger.asset(asset_id).await {
            Ok(asset) => Ok(asset),
            Err(LedgerError::NotFound(_)) => Err(ClientError::AssetNotFound(asset_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Platform fee as reported by the ledger, falling back to the default rate.
    pub async fn fee_schedule(&self) -> FeeSchedule {
        match self.ledger.platform_fee_bps().await {
            Ok(bps) => FeeSchedule::new(bps).unwrap_or_else(|e| {
                warn!("Ignoring ledger platform fee: {}", e);
                FeeSchedule::default()
            }),
            Err(e) => {
                warn!("Failed to read platform fee, using default: {}", e);
                FeeSchedule::default()
            }
        }
    }

    /// Whether the ledger approves new requests in the same transaction.
    /// An unreadable flag counts as `false`.
    pub async fn alpha_mode(&self) -> bool {
        match self.ledger.alpha_mode().await {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!("Failed to read alpha mode: {}", e);
                false
            }
        }
    }

    // ════════════════════════════════════════════════════════════════
    // Purchasing
    // ════════════════════════════════════════════════════════════════

    async fn held_shares(&self, asset_id: AssetId) -> Result<u64, ClientError> {
        Ok(self.ledger.share_balance(self.session.address(), asset_id).await?.shares)
    }

    /// Opens a buy dialog selection for `asset_id`, bounded by what this user may buy.
    pub async fn purchase_intent(&self, asset_id: AssetId) -> Result<PurchaseIntent, ClientError> {
        let asset = self.asset(asset_id).await?;
        let ctx = PurchaseContext {
            asset: &asset,
            current_user_shares: self.held_shares(asset_id).await?,
            kyc_verified: self.session.kyc_verified(),
        };
        Ok(PurchaseIntent::new(&ctx))
    }

    pub async fn quote(&self, asset_id: AssetId, share_amount: u64) -> Result<CostBreakdown, ClientError> {
        let asset = self.asset(asset_id).await?;
        let fees = self.fee_schedule().await;
        Ok(quote_purchase(share_amount, asset.price_per_share, &fees)?)
    }

    /// Validates against a fresh read of the asset, then submits with the
    /// quoted total cost attached as payment.
    pub async fn purchase(&self, asset_id: AssetId, share_amount: u64) -> Result<PurchaseReceipt, ClientError> {
        let asset = self.asset(asset_id).await?;
        if !asset.is_active() {
            return Err(TradeError::InvalidAssetState(format!("asset {asset_id} is not active")).into());
        }

        let ctx = PurchaseContext {
            asset: &asset,
            current_user_shares: self.held_shares(asset_id).await?,
            kyc_verified: self.session.kyc_verified(),
        };
        validate_purchase(share_amount, &ctx)?;

        let fees = self.fee_schedule().await;
        let quote = quote_purchase(share_amount, asset.price_per_share, &fees)?;
        let tx = Transaction::new(
            self.session.address(),
            LedgerInstruction::PurchaseShares {
                asset_id,
                amount: share_amount,
                max_price_per_share: asset.price_per_share,
            },
        )
        .with_value(quote.total_cost);

        let receipt = self.submit(tx).await?;
        info!(asset = %asset_id, shares = share_amount, total = %quote.total_cost, "shares purchased");
        self.after_write().await;
        Ok(PurchaseReceipt { quote, receipt })
    }

    pub async fn transfer_shares(&self, asset_id: AssetId, to: Address, amount: u64) -> Result<Receipt, ClientError> {
        self.require_unlocked(asset_id, amount).await?;
        let receipt = self
            .submit(Transaction::new(
                self.session.address(),
                LedgerInstruction::TransferShares { asset_id, to, amount },
            ))
            .await?;
        self.after_write().await;
        Ok(receipt)
    }

    pub async fn lock_shares(&self, asset_id: AssetId, amount: u64) -> Result<Receipt, ClientError> {
        self.require_unlocked(asset_id, amount).await?;
        self.submit(Transaction::new(
            self.session.address(),
            LedgerInstruction::LockShares { asset_id, amount },
        ))
        .await
    }

    pub async fn unlock_shares(&self, asset_id: AssetId, amount: u64) -> Result<Receipt, ClientError> {
        let holding = self.ledger.share_balance(self.session.address(), asset_id).await?;
        if amount == 0 || amount > holding.locked {
            return Err(TradeError::InvalidAmount(format!(
                "cannot unlock {amount} shares, {} locked",
                holding.locked
            ))
            .into());
        }
        self.submit(Transaction::new(
            self.session.address(),
            LedgerInstruction::UnlockShares { asset_id, amount },
        ))
        .await
    }

    async fn require_unlocked(&self, asset_id: AssetId, amount: u64) -> Result<(), ClientError> {
        let holding = self.ledger.share_balance(self.session.address(), asset_id).await?;
        if amount == 0 || amount > holding.unlocked() {
            return Err(TradeError::InvalidAmount(format!(
                "cannot move {amount} shares, {} unlocked",
                holding.unlocked()
            ))
            .into());
        }
        Ok(())
    }

    pub async fn withdraw_revenue(&self, asset_id: AssetId) -> Result<Receipt, ClientError> {
        let receipt = self
            .submit(Transaction::new(
                self.session.address(),
                LedgerInstruction::WithdrawRevenue { asset_id },
            ))
            .await?;
        self.after_write().await;
        Ok(receipt)
    }

    // ════════════════════════════════════════════════════════════════
    // Creation & Compliance
    // ════════════════════════════════════════════════════════════════

    /// Submits the wizard's request. The wizard is reset only on success so
    /// the user can fix and resubmit after a failure.
    pub async fn create_asset(&self, wizard: &mut CreateWizard) -> Result<CreationOutcome, ClientError> {
        let request = wizard.submission()?;
        let name = request.metadata.name.clone();
        if self.alpha_mode().await {
            info!(%name, "alpha mode active, request will be auto-approved");
        }
        let receipt = self
            .submit(Transaction::new(
                self.session.address(),
                LedgerInstruction::CreateRequest(request),
            ))
            .await?;

        let request_id = receipt.events.iter().find_map(|e| match e {
            LedgerEvent::RequestCreated { request_id, .. } => Some(*request_id),
            _ => None,
        });
        let asset_id = receipt.events.iter().find_map(|e| match e {
            LedgerEvent::RequestApproved { asset_id, .. } => Some(*asset_id),
            _ => None,
        });

        wizard.reset();
        if asset_id.is_some() {
            info!(%name, "asset request auto-approved");
            self.after_write().await;
        } else {
            info!(%name, "asset request submitted for review");
        }

        Ok(CreationOutcome {
            request_id,
            asset_id,
            receipt,
        })
    }

    pub async fn pending_requests(&self) -> Result<Vec<FractionalizationRequest>, ClientError> {
        Ok(self.ledger.pending_requests().await?)
    }

    /// Requests proposed by the session's address, newest first.
    pub async fn my_requests(&self) -> Result<Vec<FractionalizationRequest>, ClientError> {
        let ids = self.ledger.user_requests(self.session.address()).await?;
        let mut requests = try_join_all(ids.iter().map(|id| self.ledger.request(*id))).await?;
        requests.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(requests)
    }

    pub async fn approve_request(&self, request_id: RequestId) -> Result<Receipt, ClientError> {
        self.require_compliance("approving a request")?;
        let receipt = self
            .submit(Transaction::new(
                self.session.address(),
                LedgerInstruction::ApproveRequest { request_id },
            ))
            .await?;
        self.after_write().await;
        Ok(receipt)
    }

    pub async fn reject_request(&self, request_id: RequestId, reason: &str) -> Result<Receipt, ClientError> {
        self.require_compliance("rejecting a request")?;
        self.submit(Transaction::new(
            self.session.address(),
            LedgerInstruction::RejectRequest {
                request_id,
                reason: reason.to_string(),
            },
        ))
        .await
    }

    fn require_compliance(&self, action: &'static str) -> Result<(), ClientError> {
        if !self.session.is_compliance_officer() {
            return Err(ClientError::NotAuthorized(action));
        }
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════
    // Portfolio
    // ════════════════════════════════════════════════════════════════

    pub async fn portfolio(&self) -> Result<Portfolio, ClientError> {
        let owner = self.session.address();
        let asset_ids = self.ledger.user_tokens(owner).await?;

        let views = try_join_all(asset_ids.iter().map(|id| async move {
            let asset = self.ledger.asset(*id).await?;
            let holding = self.ledger.share_balance(owner, *id).await?;
            Ok::<_, LedgerError>((asset, holding))
        }))
        .await?;

        let mut holdings = Vec::with_capacity(views.len());
        for (asset, holding) in views {
            if holding.shares == 0 {
                continue;
            }
            holdings.push(HoldingView::new(asset, holding)?);
        }

        let pending_requests = self.my_requests().await?.iter().filter(|r| r.is_pending()).count();
        Ok(Portfolio {
            holdings,
            pending_requests,
        })
    }

    // ════════════════════════════════════════════════════════════════
    // Ledger plumbing
    // ════════════════════════════════════════════════════════════════

    async fn submit(&self, tx: Transaction) -> Result<Receipt, ClientError> {
        let instruction = tx.instruction.name();
        match self.ledger.submit(tx).await {
            Ok(receipt) => {
                debug!(instruction, tx = %receipt.tx_hash_hex(), "transaction confirmed");
                Ok(receipt)
            }
            Err(e) => {
                let failure = classify_ledger_error(&e.to_string());
                warn!(instruction, kind = ?failure.kind, "transaction failed: {}", failure.detail);
                Err(TradeError::TransactionFailed(failure).into())
            }
        }
    }

    async fn after_write(&self) {
        self.invalidate().await;
        if let Err(e) = self.refresh().await {
            warn!("Failed to refresh listings after write: {}", e);
        }
    }

    /// Spawns a task that drops the listing cache on every ledger event.
    /// The task ends when the ledger closes its event stream.
    pub fn watch_events(&self) -> JoinHandle<()> {
        let mut events = self.ledger.subscribe();
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        debug!(asset = ?event.asset_id(), "ledger event, invalidating listings");
                        *cache.write().await = None;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event watcher lagged, invalidating listings");
                        *cache.write().await = None;
                    }
                    Err(RecvError::Closed) => {
                        info!("ledger event stream closed");
                        break;
                    }
                }
            }
        })
    }
}
