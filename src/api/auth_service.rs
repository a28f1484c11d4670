use std::sync::Arc;
use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use sha2::{ Digest, Sha256 };
use tokio::sync::RwLock;
use crate::api::models::{ AuthStatus, AuthenticationState, CocktailError, SignInChallenge, User };

pub const NONCE_LENGTH: usize = 32;
const NONCE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-._";

pub fn random_nonce(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| NONCE_CHARSET[rng.gen_range(0..NONCE_CHARSET.len())] as char)
        .collect()
}

pub fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// Exchanges an identity token for a user, checking it answers the challenge
/// issued for `raw_nonce`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, identity_token: &str, raw_nonce: &str) -> Result<User, CocktailError>;

    /// Ends the user's session with the provider. Local state is cleared
    /// whatever this returns.
    async fn sign_out(&self, _user: &User) -> Result<(), CocktailError> {
        Ok(())
    }
}

#[derive(Deserialize)]
struct IdentityClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    nonce: String
}

/// Accepts JSON claims tokens `{"sub": .., "email": .., "nonce": ..}` whose
/// nonce is the hashed challenge.
pub struct ClaimsIdentityProvider {}

#[async_trait]
impl IdentityProvider for ClaimsIdentityProvider {
    async fn verify(&self, identity_token: &str, raw_nonce: &str) -> Result<User, CocktailError> {
        let claims: IdentityClaims = serde_json::from_str(identity_token).map_err(|error| {
            log::debug!("Unreadable identity token: {}", error);
            CocktailError::SignInFailure
        })?;
        if claims.sub.trim().is_empty() || claims.nonce != sha256_hex(raw_nonce) {
            return Err(CocktailError::SignInFailure);
        }
        Ok(User { id: claims.sub, email: claims.email })
    }
}

struct Session {
    state: AuthenticationState,
    user: Option<User>,
    nonce: Option<String>
}

pub struct AuthService {
    identity_provider: Arc<dyn IdentityProvider>,
    session: RwLock<Session>
}

impl AuthService {
    pub fn new(identity_provider: Arc<dyn IdentityProvider>) -> AuthService {
        AuthService {
            identity_provider,
            session: RwLock::new(Session {
                state: AuthenticationState::Unauthenticated,
                user: None,
                nonce: None
            })
        }
    }

    pub async fn status(&self) -> AuthStatus {
        let session = self.session.read().await;
        AuthStatus { state: session.state, user: session.user.clone() }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session.read().await.user.clone()
    }

    /// Starts a sign-in. The raw nonce stays here; only its hash goes out.
    /// A signed-in user stays signed in until the challenge is answered.
    pub async fn begin_sign_in(&self) -> SignInChallenge {
        let nonce = random_nonce(NONCE_LENGTH);
        let challenge = SignInChallenge { nonce: sha256_hex(&nonce) };
        let mut session = self.session.write().await;
        session.nonce = Some(nonce);
        if session.user.is_none() {
            session.state = AuthenticationState::Authenticating;
        }
        challenge
    }

    /// Answers the pending challenge. Without one nothing changes; a failed
    /// verification falls back to whoever was signed in before.
    pub async fn complete_sign_in(&self, identity_token: &str) -> Result<User, CocktailError> {
        let Some(nonce) = self.session.write().await.nonce.take() else {
            log::warn!("Sign-in attempted without a pending challenge");
            return Err(CocktailError::SignInFailure);
        };
        let verified = self.identity_provider.verify(identity_token, &nonce).await;
        let mut session = self.session.write().await;
        match verified {
            Ok(user) => {
                log::info!("Signed in user {}", user.id);
                session.state = AuthenticationState::Authenticated;
                session.user = Some(user.clone());
                Ok(user)
            },
            Err(error) => {
                log::warn!("Sign-in failed: {}", error);
                session.state = match session.user {
                    Some(_) => AuthenticationState::Authenticated,
                    None => AuthenticationState::Unauthenticated
                };
                Err(CocktailError::SignInFailure)
            }
        }
    }

    /// Always leaves the session signed out, pending challenge included. The
    /// error only reports that the provider couldn't be told.
    pub async fn sign_out(&self) -> Result<(), CocktailError> {
        let user = {
            let mut session = self.session.write().await;
            session.nonce = None;
            session.state = AuthenticationState::Unauthenticated;
            session.user.take()
        };
        let Some(user) = user else {
            return Ok(());
        };
        log::info!("Signed out user {}", user.id);
        self.identity_provider.sign_out(&user).await.map_err(|error| {
            log::warn!("Provider sign-out for {} failed: {}", user.id, error);
            CocktailError::SignOutFailure
        })
    }
}
