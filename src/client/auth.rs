//! Account and session operations

use serde_json::json;

use super::DatasetClient;
use crate::error::Result;
use crate::transport::RequestDescriptor;
use crate::types::{LoginResponse, RegisterOutcome, RegisterResponse, SetupStatus};

impl DatasetClient {
    /// Exchange email and password for a credential set.
    ///
    /// On success all three credential fields (email, refresh token,
    /// access token) are persisted through the session store and
    /// [`is_logged_in`](DatasetClient::is_logged_in) becomes true. A
    /// rejected login surfaces the server's form message as a validation
    /// error.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let descriptor = RequestDescriptor::post("/login").with_body(json!({
            "email": email,
            "password": password,
        }));
        let response = self.transport().send(&descriptor, None).await?;
        let parsed: LoginResponse = response.parse()?;

        self.session()
            .store_login(email, &parsed.refresh_token, &parsed.access_token)?;
        tracing::info!(email, "logged in");
        Ok(())
    }

    /// Destroy the session.
    ///
    /// Clears all three persisted credential fields as a unit, then asks
    /// the navigator to reload client state so no stale in-memory session
    /// data survives anywhere in the embedding application.
    pub fn logout(&self) -> Result<()> {
        self.session().clear()?;
        tracing::info!("logged out");
        self.navigator().reload();
        Ok(())
    }

    /// True if an account has already been created on the server.
    ///
    /// Unauthenticated; used by embedders to choose between the setup
    /// and login flows on first load.
    pub async fn is_initialized(&self) -> Result<bool> {
        let descriptor = RequestDescriptor::get("/setup");
        let response = self.transport().send(&descriptor, None).await?;
        let status: SetupStatus = response.parse()?;
        Ok(status.initialized)
    }

    /// Create the server's one account.
    ///
    /// Only succeeds while no account exists yet; afterwards the server
    /// rejects with a form message, surfaced as a validation error.
    pub async fn create_account(&self, email: &str, password: &str) -> Result<()> {
        let descriptor = RequestDescriptor::post("/setup").with_body(json!({
            "email": email,
            "password": password,
        }));
        self.transport().send(&descriptor, None).await?;
        tracing::info!(email, "account created");
        Ok(())
    }

    /// Start registration jobs for the named datasets.
    ///
    /// Goes through the authenticated pipeline. Returns one outcome per
    /// dataset in request order; a failed outcome carries the server's
    /// reason in its `message`.
    pub async fn register_datasets(
        &self,
        email: &str,
        password: &str,
        datasets: &[String],
    ) -> Result<Vec<RegisterOutcome>> {
        let descriptor = RequestDescriptor::post("/register").with_body(json!({
            "email": email,
            "password": password,
            "datasets": datasets,
        }));
        let response = self.pipeline().execute(&descriptor).await?;
        let parsed: RegisterResponse = response.parse()?;
        Ok(parsed.datasets)
    }
}
