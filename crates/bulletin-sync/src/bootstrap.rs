//! Post-login bootstrap sync
//!
//! Seeds the local store right after a user logs in and, for staff
//! accounts, hands over to the periodic scheduler.
//!
//! 1. Pull all accounts (the login flow validates against them).
//! 2. Administrative and bootstrap roles stop here.
//! 3. Resolve the user's institution from the freshly pulled accounts.
//! 4. Pull every institution-scoped entity, filtered to that institution.
//! 5. Start the scheduler for the institution.

use std::sync::Arc;

use tracing::{info, warn};

use bulletin_core::domain::entity::INSTITUTION_COLUMN;
use bulletin_core::domain::{EntityKind, Institution, LoginSession};
use bulletin_core::ports::RowFilter;

use crate::engine::ReconciliationEngine;
use crate::scheduler::SyncScheduler;
use crate::{Direction, ReconciliationError};

/// `User` column holding the login
const LOGIN_COLUMN: &str = "identifiant";

/// `User` column holding the role
const ROLE_COLUMN: &str = "titre";

/// How the bootstrap ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The role does not load institution data; only accounts were pulled
    Skipped,
    /// No account row matched the login and role
    NoInstitution,
    /// Institution data was pulled and the scheduler is running
    Started { institution: Institution },
}

/// Runs the first sync after a login
pub struct BootstrapSync {
    engine: Arc<ReconciliationEngine>,
    scheduler: Arc<SyncScheduler>,
}

impl BootstrapSync {
    pub fn new(engine: Arc<ReconciliationEngine>, scheduler: Arc<SyncScheduler>) -> Self {
        Self { engine, scheduler }
    }

    /// Executes the bootstrap for `session`
    ///
    /// # Errors
    ///
    /// Any pull failure is returned as-is and the scheduler is not started.
    #[tracing::instrument(skip(self, session), fields(login = %session.login, role = %session.role))]
    pub async fn run(&self, session: &LoginSession) -> Result<BootstrapOutcome, ReconciliationError> {
        self.engine.pull_table(EntityKind::Account, None).await?;

        if !session.role.loads_institution_data() {
            info!("Role does not load institution data; bootstrap done");
            return Ok(BootstrapOutcome::Skipped);
        }

        let Some(institution) = self.resolve_institution(session).await? else {
            warn!("No institution found for this login; scheduler not started");
            return Ok(BootstrapOutcome::NoInstitution);
        };

        for entity in EntityKind::all() {
            if let Some(filter) = ReconciliationEngine::scope_filter(entity, Some(&institution)) {
                self.engine.pull_table(entity, Some(&filter)).await?;
            }
        }

        self.scheduler.start(Some(institution.clone()));

        info!(institution = %institution, "Bootstrap complete");
        Ok(BootstrapOutcome::Started { institution })
    }

    /// Looks up `User.etablissement` for the session's login and role
    async fn resolve_institution(
        &self,
        session: &LoginSession,
    ) -> Result<Option<Institution>, ReconciliationError> {
        let spec = EntityKind::Account.spec();
        let filter = RowFilter::new(LOGIN_COLUMN, session.login.as_str());

        let accounts = self
            .engine
            .store()
            .query(EntityKind::Account, Some(&filter))
            .await
            .map_err(|source| ReconciliationError::Storage {
                table: spec.table,
                direction: Direction::Pull,
                source,
            })?;

        Ok(accounts
            .iter()
            .filter(|account| account.get_str(ROLE_COLUMN) == Some(session.role.as_str()))
            .find_map(|account| account.get_str(INSTITUTION_COLUMN))
            .and_then(|name| Institution::new(name).ok()))
    }
}
