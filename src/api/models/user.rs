use serde::{ Deserialize, Serialize };

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationState {
    Unauthenticated,
    Authenticating,
    Authenticated
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: Option<String>
}

#[derive(Serialize, Clone, Debug)]
pub struct AuthStatus {
    pub state: AuthenticationState,
    pub user: Option<User>
}

/// Sent to the identity provider; `nonce` is the SHA-256 hex digest of the
/// raw nonce kept by the auth service.
#[derive(Serialize, Clone, Debug)]
pub struct SignInChallenge {
    pub nonce: String
}

#[derive(Deserialize, Clone, Debug)]
pub struct SignInRequest {
    #[serde(rename = "identityToken")]
    pub identity_token: String
}
