//! Account projections and buyer preferences.

use tracing::instrument;

use velora_core::AccountId;

use super::{AuthContext, BackendClient};
use crate::error::BackendError;
use crate::models::{Account, Preferences, PreferencesUpsert};

impl BackendClient {
    /// All account projections (admin reporting).
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self))]
    pub async fn list_accounts(&self, auth: &AuthContext) -> Result<Vec<Account>, BackendError> {
        self.fetch_rows(
            auth,
            "accounts",
            &[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    /// The preference record for an account, if one exists.
    ///
    /// Absence is a valid state ("no preference"), not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn preferences(
        &self,
        auth: &AuthContext,
        account_id: AccountId,
    ) -> Result<Option<Preferences>, BackendError> {
        self.fetch_optional(
            auth,
            "preferences",
            &[
                ("select", "*".to_string()),
                ("account_id", format!("eq.{account_id}")),
            ],
        )
        .await
    }

    /// Create or replace the preference record for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert is rejected.
    #[instrument(skip(self, upsert), fields(account_id = %upsert.account_id))]
    pub async fn upsert_preferences(
        &self,
        auth: &AuthContext,
        upsert: &PreferencesUpsert,
    ) -> Result<Preferences, BackendError> {
        self.insert_one(auth, "preferences", upsert, Some("account_id"))
            .await
    }
}
