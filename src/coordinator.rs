//! Rating flow coordination.
//!
//! [`RatingCoordinator`] runs the full "rate this item" flow for one client:
//!
//! ```text
//! begin ─► load snapshot ─► InsertionSession ─► answers ... ─► commit
//!                                                                │
//!                              derive_score ◄────────────────────┘
//!                                   │
//!                              RankingWrite ─► RankingStore::apply
//! ```
//!
//! Only one [`RatingSession`] may be active per coordinator. Dropping a
//! session cancels it; nothing reaches the store before `commit`.

use std::sync::Arc;
use parking_lot::Mutex;

use crate::config::{ConfigError, RankingConfig};
use crate::ranking::{derive_score, InsertionSession, ScoreError, SessionError, SessionStep};
use crate::store::RankingStore;
use crate::tier::{Tier, TierClassifier, TierError, TierProgress};
use crate::types::{
    AlbumId, CategoryId, ComparisonOutcome, ItemId, ItemKind, PartitionScope, RankedItem,
    RankingWrite, SessionId,
};

/// Error type for coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Another session is still active.
    #[error("Rating session {0} is still active")]
    SessionActive(SessionId),
    /// The session was already committed or replaced.
    #[error("Rating session {0} is not active")]
    SessionNotActive(SessionId),
    /// Commit requested before the session converged.
    #[error("Rating session {0} has not finished its comparisons")]
    Incomplete(SessionId),
    /// Item already ranked; use `recategorize` to move it.
    #[error("Item {item_id} is already ranked in category {category_id}")]
    AlreadyRanked {
        /// Item.
        item_id: ItemId,
        /// Its current category.
        category_id: CategoryId,
    },
    /// Item is not ranked anywhere.
    #[error("Item {0} is not ranked")]
    NotRanked(ItemId),
    /// Recategorize target equals the current category.
    #[error("Item {item_id} is already in category {category_id}")]
    SameCategory {
        /// Item.
        item_id: ItemId,
        /// Its current category.
        category_id: CategoryId,
    },
    /// Track is not part of the album.
    #[error("Item {item_id} is not a ranked track of album {album_id}")]
    NotAlbumTrack {
        /// Item.
        item_id: ItemId,
        /// Album requested.
        album_id: AlbumId,
    },
    /// Insertion session error.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Score derivation error.
    #[error(transparent)]
    Score(#[from] ScoreError),
    /// Tier classification error.
    #[error(transparent)]
    Tier(#[from] TierError),
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Store error.
    #[error("Store error: {0}")]
    Store(String),
}

impl CoordinatorError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

/// Request to rate an item that is not ranked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    /// Item to rate.
    pub item_id: ItemId,
    /// Its kind.
    pub item_kind: ItemKind,
    /// Category the user placed it in.
    pub category_id: CategoryId,
    /// Parent album, tracks only.
    pub album_id: Option<AlbumId>,
}

impl RateRequest {
    /// Request without album information.
    pub fn new(item_id: ItemId, item_kind: ItemKind, category_id: CategoryId) -> Self {
        Self {
            item_id,
            item_kind,
            category_id,
            album_id: None,
        }
    }

    /// Attach the parent album of a track.
    pub fn with_album(mut self, album_id: AlbumId) -> Self {
        self.album_id = Some(album_id);
        self
    }
}

type ActiveSlot = Arc<Mutex<Option<SessionId>>>;

/// An insertion session bound to a coordinator's active slot.
///
/// Releases the slot when dropped, which is how a rating is cancelled.
#[derive(Debug)]
pub struct RatingSession {
    session: InsertionSession,
    item_kind: ItemKind,
    album_id: Option<AlbumId>,
    previous_category: Option<CategoryId>,
    slot: ActiveSlot,
}

impl RatingSession {
    /// Underlying insertion session.
    pub fn session(&self) -> &InsertionSession {
        &self.session
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.session.id()
    }

    /// What the caller has to do next.
    pub fn step(&self) -> SessionStep {
        self.session.step()
    }

    /// Apply an answer.
    pub fn answer(&mut self, outcome: ComparisonOutcome) -> Result<SessionStep, SessionError> {
        self.session.answer(outcome)
    }

    /// Apply an answer given as the winner's id.
    pub fn answer_winner(&mut self, winner: &ItemId) -> Result<SessionStep, SessionError> {
        self.session.answer_winner(winner)
    }

    /// Skip the current comparison.
    pub fn skip(&mut self) -> Result<SessionStep, SessionError> {
        self.session.skip()
    }

    /// Category the item leaves on commit, for recategorizations.
    pub fn previous_category(&self) -> Option<&CategoryId> {
        self.previous_category.as_ref()
    }

    /// Abandon the rating without persisting anything.
    pub fn cancel(self) {
        tracing::info!(
            session_id = %self.session.id(),
            item_id = %self.session.new_item_id(),
            comparisons = self.session.history().len(),
            "Rating session cancelled"
        );
    }
}

impl Drop for RatingSession {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if *slot == Some(self.session.id()) {
            *slot = None;
        }
    }
}

/// Runs rating flows against a [`RankingStore`].
///
/// Explicitly constructed per client; holds no global state.
pub struct RatingCoordinator<S: RankingStore> {
    store: Arc<S>,
    config: RankingConfig,
    classifier: TierClassifier,
    active: ActiveSlot,
}

impl<S: RankingStore> RatingCoordinator<S> {
    /// Create a coordinator; fails if `config` is invalid.
    pub fn new(store: Arc<S>, config: RankingConfig) -> Result<Self, CoordinatorError> {
        config.validate()?;
        let classifier = TierClassifier::new(config.tiers.clone());
        Ok(Self {
            store,
            config,
            classifier,
            active: Arc::new(Mutex::new(None)),
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Store in use.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Id of the active session, if any.
    pub fn active_session(&self) -> Option<SessionId> {
        *self.active.lock()
    }

    /// Start rating an item that is not ranked yet.
    pub async fn begin(&self, request: RateRequest) -> Result<RatingSession, CoordinatorError> {
        self.ensure_idle()?;

        if let Some(existing) = self.find(&request.item_id, request.item_kind).await? {
            return Err(CoordinatorError::AlreadyRanked {
                item_id: request.item_id,
                category_id: existing.category_id,
            });
        }

        let scope = PartitionScope::category(request.category_id, request.item_kind);
        self.start(request.item_id, request.item_kind, request.album_id, scope, None)
            .await
    }

    /// Start ranking a track among the already-ranked tracks of its album.
    pub async fn begin_album(&self, item_id: ItemId, album_id: AlbumId) -> Result<RatingSession, CoordinatorError> {
        self.ensure_idle()?;

        let track = self
            .find(&item_id, ItemKind::Track)
            .await?
            .filter(|track| track.album_id.as_ref() == Some(&album_id))
            .ok_or_else(|| CoordinatorError::NotAlbumTrack {
                item_id: item_id.clone(),
                album_id: album_id.clone(),
            })?;

        let scope = PartitionScope::album(album_id.clone());
        self.start(track.item_id, ItemKind::Track, Some(album_id), scope, None)
            .await
    }

    /// Start moving a ranked item into another category.
    ///
    /// The item keeps its old place until the new session commits.
    pub async fn recategorize(
        &self,
        item_id: ItemId,
        item_kind: ItemKind,
        new_category: CategoryId,
    ) -> Result<RatingSession, CoordinatorError> {
        self.ensure_idle()?;

        let existing = self
            .find(&item_id, item_kind)
            .await?
            .ok_or_else(|| CoordinatorError::NotRanked(item_id.clone()))?;
        if existing.category_id == new_category {
            return Err(CoordinatorError::SameCategory {
                item_id,
                category_id: new_category,
            });
        }

        let scope = PartitionScope::category(new_category, item_kind);
        self.start(item_id, item_kind, existing.album_id, scope, Some(existing.category_id))
            .await
    }

    /// Persist a completed session and release the active slot.
    pub async fn commit(&self, rating: &RatingSession) -> Result<RankingWrite, CoordinatorError> {
        let session = &rating.session;
        if self.active_session() != Some(session.id()) {
            return Err(CoordinatorError::SessionNotActive(session.id()));
        }
        let final_position = session
            .final_position()
            .ok_or(CoordinatorError::Incomplete(session.id()))?;

        let snapshot = session.snapshot();
        let result = self.write_for(rating, final_position).await;
        // A failed write cannot be retried from the same snapshot.
        self.release(session.id());
        let write = result?;

        tracing::info!(
            session_id = %session.id(),
            item_id = %write.item_id,
            scope = %snapshot.scope(),
            position = write.position,
            personal_score = ?write.personal_score,
            comparisons = write.comparisons_asked(),
            "Rating committed"
        );
        Ok(write)
    }

    /// Remove a ranked item from its category.
    pub async fn remove(&self, item_id: &ItemId, item_kind: ItemKind) -> Result<RankedItem, CoordinatorError> {
        self.store
            .remove(item_id, item_kind)
            .await
            .map_err(CoordinatorError::from_store)
    }

    /// Comparison audit trail of `item_id`, oldest first.
    pub async fn comparisons_for(&self, item_id: &ItemId) -> Result<Vec<crate::types::ComparisonResult>, CoordinatorError> {
        self.store
            .comparisons_for(item_id)
            .await
            .map_err(CoordinatorError::from_store)
    }

    /// Tier for accumulated listening minutes under the configured variant.
    pub fn classify_tier(&self, total_minutes: u32, item_kind: ItemKind) -> Result<Tier, CoordinatorError> {
        Ok(self
            .classifier
            .classify(total_minutes, item_kind, self.config.threshold_variant)?)
    }

    /// Tier progress under the configured variant.
    pub fn tier_progress(&self, total_minutes: u32, item_kind: ItemKind) -> Result<TierProgress, CoordinatorError> {
        Ok(self
            .classifier
            .progress(total_minutes, item_kind, self.config.threshold_variant)?)
    }

    async fn write_for(&self, rating: &RatingSession, final_position: usize) -> Result<RankingWrite, CoordinatorError> {
        let session = &rating.session;
        let snapshot = session.snapshot();

        let personal_score = if snapshot.scope().is_scored() {
            Some(derive_score(final_position, snapshot.items(), &self.config.score)?)
        } else {
            None
        };

        let write = RankingWrite {
            session_id: session.id(),
            item_id: session.new_item_id().clone(),
            item_kind: rating.item_kind,
            album_id: rating.album_id.clone(),
            scope: snapshot.scope().clone(),
            position: final_position,
            personal_score,
            comparison_history: session.history().to_vec(),
            base_fingerprint: snapshot.fingerprint().to_string(),
            previous_category: rating.previous_category.clone(),
        };

        self.store
            .apply(&write)
            .await
            .map_err(CoordinatorError::from_store)?;
        Ok(write)
    }

    async fn start(
        &self,
        item_id: ItemId,
        item_kind: ItemKind,
        album_id: Option<AlbumId>,
        scope: PartitionScope,
        previous_category: Option<CategoryId>,
    ) -> Result<RatingSession, CoordinatorError> {
        let snapshot = self
            .store
            .load_partition(&scope)
            .await
            .map_err(CoordinatorError::from_store)?;
        let session = InsertionSession::begin(item_id, snapshot)?;

        {
            let mut slot = self.active.lock();
            if let Some(active) = *slot {
                return Err(CoordinatorError::SessionActive(active));
            }
            *slot = Some(session.id());
        }

        Ok(RatingSession {
            session,
            item_kind,
            album_id,
            previous_category,
            slot: Arc::clone(&self.active),
        })
    }

    async fn find(&self, item_id: &ItemId, item_kind: ItemKind) -> Result<Option<RankedItem>, CoordinatorError> {
        self.store
            .find_item(item_id, item_kind)
            .await
            .map_err(CoordinatorError::from_store)
    }

    fn ensure_idle(&self) -> Result<(), CoordinatorError> {
        match self.active_session() {
            Some(active) => Err(CoordinatorError::SessionActive(active)),
            None => Ok(()),
        }
    }

    fn release(&self, id: SessionId) {
        let mut slot = self.active.lock();
        if *slot == Some(id) {
            *slot = None;
        }
    }
}
