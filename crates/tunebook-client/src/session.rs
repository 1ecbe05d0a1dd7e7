use tracing::info;

use tunebook_types::api::ProfileUpdate;
use tunebook_types::models::Profile;
use tunebook_types::Principal;

use crate::catalog::Method;
use crate::client::TunebookClient;
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Who the client is calling as.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl Identity {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(principal) => Some(principal),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

/// Signed-in state owned by the application's composition root.
///
/// Holds an anonymous base client and the currently bound one. Logging in
/// re-binds the shared transport to a principal; logging out drops back to
/// the anonymous client. Consumers borrow [`client`](Self::client) rather
/// than reaching for a global.
pub struct AppSession {
    anonymous: TunebookClient,
    current: TunebookClient,
    profile: Option<Profile>,
}

impl AppSession {
    pub fn new(client: TunebookClient) -> Self {
        let anonymous = client.with_identity(Identity::Anonymous);
        Self {
            current: anonymous.clone(),
            anonymous,
            profile: None,
        }
    }

    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(TunebookClient::connect(config)?))
    }

    pub fn client(&self) -> &TunebookClient {
        &self.current
    }

    pub fn current_principal(&self) -> Option<&Principal> {
        self.current.identity().principal()
    }

    pub fn is_signed_in(&self) -> bool {
        !self.current.identity().is_anonymous()
    }

    /// Last profile fetched for the signed-in principal.
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Bind `principal` and look up its profile. A principal without a
    /// profile is still signed in; it just has to create one.
    ///
    /// If the lookup fails the previous binding is kept.
    pub async fn login(&mut self, principal: Principal) -> Result<Option<&Profile>, ClientError> {
        let client = self
            .anonymous
            .with_identity(Identity::Authenticated(principal.clone()));
        let profile = client.authentication(&principal).await?;

        info!(%principal, has_profile = profile.is_some(), "signed in");
        self.current = client;
        self.profile = profile;
        Ok(self.profile.as_ref())
    }

    pub fn logout(&mut self) {
        if let Some(principal) = self.current_principal() {
            info!(%principal, "signed out");
        }
        self.current = self.anonymous.clone();
        self.profile = None;
    }

    pub async fn refresh_profile(&mut self) -> Result<Option<&Profile>, ClientError> {
        let Some(principal) = self.current_principal().cloned() else {
            return Ok(None);
        };
        self.profile = self.current.authentication(&principal).await?;
        Ok(self.profile.as_ref())
    }

    /// Save the signed-in user's profile and keep the returned copy.
    pub async fn save_profile(&mut self, update: &ProfileUpdate) -> Result<&Profile, ClientError> {
        let principal = self
            .current_principal()
            .cloned()
            .ok_or(ClientError::SignedOut(Method::UpdateProfile))?;
        let profile = self.current.update_profile(&principal, update).await?;
        Ok(self.profile.insert(profile))
    }
}
