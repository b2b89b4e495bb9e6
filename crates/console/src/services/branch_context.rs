//! Branch context: the tenant's branches plus the currently selected one.
//!
//! A context lives for one dashboard session. Every refresh takes a ticket
//! from a monotonic counter and only applies its result if no newer refresh
//! has been applied already, so a slow response can never overwrite a fresher
//! one. The selected branch is always one of the loaded branches, or none.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::instrument;

use comanda_core::{BranchId, TenantId};

use crate::db::BranchStore;
use crate::error::{AppError, StoreContext};
use crate::models::{BranchSummary, StaffUser};

/// Where the selected branch survives between page loads.
pub trait SelectionPersistence: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<Option<BranchId>, AppError>> + Send;

    fn save(&self, id: BranchId) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Selection kept in process memory.
#[derive(Debug, Default)]
pub struct InMemorySelection {
    selected: Mutex<Option<BranchId>>,
    saves: AtomicUsize,
}

impl InMemorySelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_selected(id: BranchId) -> Self {
        Self {
            selected: Mutex::new(Some(id)),
            saves: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<BranchId> {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of times `save` was called.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SelectionPersistence for InMemorySelection {
    async fn load(&self) -> Result<Option<BranchId>, AppError> {
        Ok(self.selected())
    }

    async fn save(&self, id: BranchId) -> Result<(), AppError> {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Body of the branch-context endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSnapshot {
    pub branches: Vec<BranchSummary>,
    pub current_branch: Option<BranchSummary>,
}

#[derive(Debug, Default)]
struct State {
    branches: Vec<BranchSummary>,
    current: Option<BranchId>,
    applied_ticket: u64,
}

impl State {
    fn contains(&self, id: BranchId) -> bool {
        self.branches.iter().any(|b| b.id == id)
    }

    fn snapshot(&self) -> BranchSnapshot {
        BranchSnapshot {
            branches: self.branches.clone(),
            current_branch: self
                .current
                .and_then(|id| self.branches.iter().find(|b| b.id == id).cloned()),
        }
    }
}

pub struct BranchContext<P> {
    persistence: P,
    state: Mutex<State>,
    tickets: AtomicU64,
}

impl<P: SelectionPersistence> BranchContext<P> {
    #[must_use]
    pub fn new(persistence: P) -> Self {
        Self {
            persistence,
            state: Mutex::new(State::default()),
            tickets: AtomicU64::new(0),
        }
    }

    pub const fn persistence(&self) -> &P {
        &self.persistence
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn snapshot(&self) -> BranchSnapshot {
        self.state().snapshot()
    }

    #[must_use]
    pub fn current_branch(&self) -> Option<BranchSummary> {
        self.snapshot().current_branch
    }

    /// Load the branches visible to `user`. A user without a tenant gets an
    /// empty context.
    ///
    /// # Errors
    ///
    /// Store or persistence failures.
    pub async fn initialize<S: BranchStore>(
        &self,
        store: &S,
        user: &StaffUser,
    ) -> Result<BranchSnapshot, AppError> {
        match user.tenant_id {
            Some(tenant_id) => self.refresh_branches(store, tenant_id).await,
            None => {
                let ticket = self.next_ticket();
                let mut state = self.state();
                if ticket > state.applied_ticket {
                    *state = State {
                        applied_ticket: ticket,
                        ..State::default()
                    };
                }
                Ok(state.snapshot())
            }
        }
    }

    /// Re-fetch the tenant's branches.
    ///
    /// The current selection is kept while it still exists; otherwise the
    /// persisted selection, then the first branch, is chosen.
    ///
    /// # Errors
    ///
    /// Store or persistence failures. State is untouched on error.
    #[instrument(skip(self, store))]
    pub async fn refresh_branches<S: BranchStore>(
        &self,
        store: &S,
        tenant_id: TenantId,
    ) -> Result<BranchSnapshot, AppError> {
        let ticket = self.next_ticket();

        let branches = store
            .list_branches(tenant_id)
            .await
            .store_context("list_branches", Some(tenant_id))?;
        let persisted = self.persistence.load().await?;

        let mut state = self.state();
        if ticket < state.applied_ticket {
            tracing::debug!(ticket, applied = state.applied_ticket, "Discarding stale branch refresh");
            return Ok(state.snapshot());
        }

        let fresh = State {
            branches: branches.iter().map(BranchSummary::from).collect(),
            current: None,
            applied_ticket: ticket,
        };
        let current = state
            .current
            .filter(|id| fresh.contains(*id))
            .or_else(|| persisted.filter(|id| fresh.contains(*id)))
            .or_else(|| fresh.branches.first().map(|b| b.id));

        *state = State { current, ..fresh };
        Ok(state.snapshot())
    }

    /// Select a loaded branch and persist the choice. Unknown ids are ignored
    /// and leave both the selection and the persisted value untouched.
    ///
    /// # Errors
    ///
    /// Persistence failures.
    pub async fn switch_branch(&self, id: BranchId) -> Result<bool, AppError> {
        let switched = {
            let mut state = self.state();
            if state.contains(id) {
                state.current = Some(id);
                true
            } else {
                false
            }
        };

        if switched {
            self.persistence.save(id).await?;
        }
        Ok(switched)
    }

    /// `Some` behaves like [`switch_branch`](Self::switch_branch); `None`
    /// clears the in-memory selection and leaves persistence alone.
    ///
    /// # Errors
    ///
    /// Persistence failures.
    pub async fn set_current_branch(&self, id: Option<BranchId>) -> Result<bool, AppError> {
        match id {
            Some(id) => self.switch_branch(id).await,
            None => {
                self.state().current = None;
                Ok(true)
            }
        }
    }
}
