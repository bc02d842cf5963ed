//! Registration, credential checks and session lifecycle.

use std::sync::Arc;

use crate::models::{Channel, EventKind, Identity, IdentitySummary, ProfileSeed, Role};
use crate::services::directory::summarize_one;
use crate::services::policy::Principal;
use crate::services::session::{IssuedSession, SessionClaims, SessionService};
use crate::services::{
    IdentityStore, NotificationDispatcher, ProfileDirectory, ServiceError, SessionRevocationList,
};
use crate::utils::{hash_password, verify_against_decoy, verify_password, Password, PasswordHashString};

/// Input to `AccessGate::register`, already shape-validated.
#[derive(Debug, Clone)]
pub struct Registration {
    pub identifier: String,
    pub secret: Password,
    pub profile: ProfileSeed,
}

/// Result of a successful `authenticate`.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub session: IssuedSession,
    pub identity: IdentitySummary,
}

/// What a live bearer token resolves to.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub principal: Principal,
    pub identity: Identity,
    pub claims: SessionClaims,
}

#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn IdentityStore>,
    directory: Arc<dyn ProfileDirectory>,
    sessions: SessionService,
    revocations: Arc<dyn SessionRevocationList>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl AccessGate {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        directory: Arc<dyn ProfileDirectory>,
        sessions: SessionService,
        revocations: Arc<dyn SessionRevocationList>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            directory,
            sessions,
            revocations,
            dispatcher,
        }
    }

    /// Create a pending member account and tell reviewers about it.
    pub async fn register(&self, registration: Registration) -> Result<IdentitySummary, ServiceError> {
        let (_, summary) = self.enroll(registration, Role::Member).await?;
        Ok(summary)
    }

    /// Same path as `register` with an explicit role. The account still
    /// starts pending; activation only happens through the approval service.
    pub async fn enroll(
        &self,
        registration: Registration,
        role: Role,
    ) -> Result<(Identity, IdentitySummary), ServiceError> {
        let Registration {
            identifier,
            secret,
            profile,
        } = registration;

        if self.store.find_by_identifier(&identifier).await?.is_some() {
            return Err(ServiceError::DuplicateIdentity);
        }

        let hash = tokio::task::spawn_blocking(move || hash_password(&secret))
            .await
            .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))??;

        let identity = Identity::new(&identifier, hash.into_string(), role);
        // A concurrent registration can still win between the lookup and here.
        self.store.insert(&identity).await?;

        if let Err(e) = self.directory.create_profile(identity.id, profile).await {
            tracing::error!(
                identity_id = %identity.id,
                error = %e,
                "Failed to create profile for new identity"
            );
        }

        let summary = summarize_one(self.directory.as_ref(), &identity).await;

        tracing::info!(
            identity_id = %identity.id,
            role = %identity.role(),
            "Identity registered"
        );

        self.dispatcher.publish(
            Channel::ReviewerBroadcast,
            EventKind::IdentityRegistered,
            serde_json::json!({
                "identity": &summary,
                "message": "New registration pending approval",
            }),
        );

        Ok((identity, summary))
    }

    /// Exchange credentials for a new session. Unknown identifier and wrong
    /// secret fail identically; a correct secret on a pending account fails
    /// with `AccountNotActive`.
    pub async fn authenticate(
        &self,
        identifier: &str,
        secret: Password,
    ) -> Result<AuthenticatedSession, ServiceError> {
        let identity = match self.store.find_by_identifier(identifier).await? {
            Some(identity) => {
                let hash = PasswordHashString::new(identity.credential_hash.clone());
                let matches =
                    tokio::task::spawn_blocking(move || verify_password(&secret, &hash).is_ok())
                        .await
                        .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))?;
                matches.then_some(identity)
            }
            None => {
                tokio::task::spawn_blocking(move || verify_against_decoy(&secret))
                    .await
                    .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))?;
                None
            }
        };

        let Some(identity) = identity else {
            tracing::warn!("Login failed: invalid credentials");
            metrics::counter!("login_attempts_total", "outcome" => "invalid_credential")
                .increment(1);
            return Err(ServiceError::InvalidCredential);
        };

        if !identity.is_active() {
            tracing::info!(identity_id = %identity.id, "Login refused: account not active");
            metrics::counter!("login_attempts_total", "outcome" => "not_active").increment(1);
            return Err(ServiceError::AccountNotActive);
        }

        let session = self.sessions.issue(identity.id)?;
        let summary = summarize_one(self.directory.as_ref(), &identity).await;

        tracing::info!(identity_id = %identity.id, "Session issued");
        metrics::counter!("login_attempts_total", "outcome" => "success").increment(1);

        Ok(AuthenticatedSession {
            session,
            identity: summary,
        })
    }

    /// Resolve a bearer token to its caller. The identity is re-read on every
    /// call, so a suspension takes effect on sessions already issued.
    pub async fn resolve(&self, token: &str) -> Result<SessionContext, ServiceError> {
        let claims = self
            .sessions
            .decode(token)
            .map_err(|_| ServiceError::InvalidSession)?;

        if self.revocations.is_revoked(&claims.jti).await? {
            return Err(ServiceError::InvalidSession);
        }

        let identity = self
            .store
            .find_by_id(claims.sub)
            .await?
            .ok_or(ServiceError::InvalidSession)?;

        if !identity.is_active() {
            return Err(ServiceError::AccountNotActive);
        }

        Ok(SessionContext {
            principal: Principal {
                identity_id: identity.id,
                role: identity.role(),
            },
            identity,
            claims,
        })
    }

    /// Invalidate a session. Revoking an already revoked session succeeds.
    pub async fn revoke(&self, claims: &SessionClaims) -> Result<(), ServiceError> {
        self.revocations
            .revoke(&claims.jti, claims.remaining_seconds())
            .await?;
        tracing::info!(identity_id = %claims.sub, "Session revoked");
        Ok(())
    }

    /// Identity behind a resolved session, as shown to clients.
    pub async fn describe(&self, identity: &Identity) -> IdentitySummary {
        summarize_one(self.directory.as_ref(), identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::models::IdentityStatus;
    use crate::services::{
        ApprovalService, InMemoryIdentityStore, InMemoryProfileDirectory, InMemoryRevocationList,
    };
    use secrecy::SecretString;

    struct Fixture {
        gate: AccessGate,
        approvals: ApprovalService,
        dispatcher: Arc<NotificationDispatcher>,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn IdentityStore> = Arc::new(InMemoryIdentityStore::new());
        let directory: Arc<dyn ProfileDirectory> = Arc::new(InMemoryProfileDirectory::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(16));
        let sessions = SessionService::new(&SessionConfig {
            secret: SecretString::new("access-gate-test-secret-0123456789".to_string()),
            expiry_minutes: 60,
        });
        Fixture {
            gate: AccessGate::new(
                store.clone(),
                directory.clone(),
                sessions,
                Arc::new(InMemoryRevocationList::new()),
                dispatcher.clone(),
            ),
            approvals: ApprovalService::new(store, directory, dispatcher.clone()),
            dispatcher,
        }
    }

    fn registration(identifier: &str) -> Registration {
        Registration {
            identifier: identifier.to_string(),
            secret: Password::new("Password123".to_string()),
            profile: ProfileSeed {
                first_name: "Maria".to_string(),
                middle_name: None,
                last_name: "Santos".to_string(),
            },
        }
    }

    fn reviewer() -> Principal {
        Principal {
            identity_id: uuid::Uuid::new_v4(),
            role: Role::Reviewer,
        }
    }

    #[tokio::test]
    async fn test_register_creates_pending_member_and_notifies_reviewers() {
        let fixture = fixture();
        let mut reviewers = fixture
            .dispatcher
            .subscribe(&reviewer(), Channel::ReviewerBroadcast)
            .unwrap();

        let summary = fixture.gate.register(registration("Maria@Example.com")).await.unwrap();

        assert_eq!(summary.identifier, "maria@example.com");
        assert_eq!(summary.status, IdentityStatus::Pending);
        assert_eq!(summary.role, Role::Member);
        assert_eq!(summary.name.as_deref(), Some("Santos, Maria"));

        let event = reviewers.try_recv().unwrap();
        assert_eq!(event.event, "identity.registered");
        assert_eq!(event.payload["identity"]["identifier"], "maria@example.com");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_identifier() {
        let fixture = fixture();
        fixture.gate.register(registration("dup@example.com")).await.unwrap();

        let result = fixture.gate.register(registration("DUP@example.com")).await;
        assert!(matches!(result, Err(ServiceError::DuplicateIdentity)));
    }

    #[tokio::test]
    async fn test_unknown_identifier_and_wrong_secret_fail_identically() {
        let fixture = fixture();
        fixture.gate.register(registration("known@example.com")).await.unwrap();

        let unknown = fixture
            .gate
            .authenticate("nobody@example.com", Password::new("Password123".to_string()))
            .await;
        let wrong = fixture
            .gate
            .authenticate("known@example.com", Password::new("WrongPass999".to_string()))
            .await;

        assert!(matches!(unknown, Err(ServiceError::InvalidCredential)));
        assert!(matches!(wrong, Err(ServiceError::InvalidCredential)));
    }

    #[tokio::test]
    async fn test_pending_account_with_correct_secret_is_not_active() {
        let fixture = fixture();
        fixture.gate.register(registration("pending@example.com")).await.unwrap();

        let result = fixture
            .gate
            .authenticate("pending@example.com", Password::new("Password123".to_string()))
            .await;
        assert!(matches!(result, Err(ServiceError::AccountNotActive)));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let fixture = fixture();
        let summary = fixture.gate.register(registration("live@example.com")).await.unwrap();
        fixture.approvals.approve(summary.id, Role::Reviewer).await.unwrap();

        let authenticated = fixture
            .gate
            .authenticate("LIVE@example.com", Password::new("Password123".to_string()))
            .await
            .unwrap();
        let token = authenticated.session.token;

        let context = fixture.gate.resolve(&token).await.unwrap();
        assert_eq!(context.principal.identity_id, summary.id);
        assert_eq!(context.principal.role, Role::Member);

        fixture.gate.revoke(&context.claims).await.unwrap();
        fixture.gate.revoke(&context.claims).await.unwrap();
        assert!(matches!(
            fixture.gate.resolve(&token).await,
            Err(ServiceError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_suspension_cuts_off_existing_sessions() {
        let fixture = fixture();
        let summary = fixture.gate.register(registration("cut@example.com")).await.unwrap();
        fixture.approvals.approve(summary.id, Role::Reviewer).await.unwrap();
        let token = fixture
            .gate
            .authenticate("cut@example.com", Password::new("Password123".to_string()))
            .await
            .unwrap()
            .session
            .token;

        fixture.approvals.suspend(summary.id, Role::Reviewer).await.unwrap();

        assert!(matches!(
            fixture.gate.resolve(&token).await,
            Err(ServiceError::AccountNotActive)
        ));
    }

    #[tokio::test]
    async fn test_undecodable_token_is_an_invalid_session() {
        let fixture = fixture();
        assert!(matches!(
            fixture.gate.resolve("not.a.token").await,
            Err(ServiceError::InvalidSession)
        ));
    }
}
