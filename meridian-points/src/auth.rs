//! Bearer-token lifecycle: challenge-response refresh with an expiry-aware
//! cache
//!
//! The cache slot is an explicit tagged state. `Ready` holds a token that may
//! or may not still be valid; `Refreshing` holds a shared future so that
//! overlapping callers awaiting an expired slot all resolve against the same
//! in-flight challenge/solve round-trip instead of starting their own.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::api::{ChallengeRequest, PointsApi, SolveRequest};
use crate::error::{Error, Result};
use crate::signer::OperatorKey;

/// Server-side validity window of an issued bearer token
const TOKEN_VALIDITY_SECS: u64 = 60 * 60;

/// Tokens are treated as expired this many seconds before the server-side
/// expiry to prevent mid-request token expiration.
const EXPIRY_SAFETY_MARGIN_SECS: u64 = 60;

/// A bearer token with its client-side expiry
///
/// Replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone)]
pub struct BearerToken {
    /// Opaque token attached to authenticated requests
    pub token: String,
    /// UNIX timestamp (seconds) past which the token is treated as expired
    pub expires_at: u64,
}

impl BearerToken {
    fn issued_now(token: String) -> Self {
        Self {
            token,
            expires_at: unix_timestamp_secs() + TOKEN_VALIDITY_SECS - EXPIRY_SAFETY_MARGIN_SECS,
        }
    }

    fn is_expired(&self) -> bool {
        unix_timestamp_secs() > self.expires_at
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Result<BearerToken>>>;

/// State of the token cache slot
enum TokenState {
    /// No token cached; the next caller starts a refresh
    Empty,
    /// A cached token (valid until its expiry passes)
    Ready(BearerToken),
    /// A refresh is in flight; late callers await the same future
    Refreshing(SharedRefresh),
}

/// Manages the cached bearer token for one operator-key/contract pairing
pub struct TokenManager {
    api: Arc<dyn PointsApi>,
    key: OperatorKey,
    contract_address: String,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(api: Arc<dyn PointsApi>, key: OperatorKey, contract_address: String) -> Self {
        Self {
            api,
            key,
            contract_address,
            state: Mutex::new(TokenState::Empty),
        }
    }

    /// Return a bearer token guaranteed valid at call time
    ///
    /// Returns the cached token when it has not expired; otherwise joins the
    /// in-flight refresh, or starts one if none is running. At most one
    /// challenge/solve round-trip pair is in flight at a time.
    pub async fn bearer_token(&self) -> Result<String> {
        // The lock is never held across an await.
        let refresh = {
            let mut state = self.lock_state();
            match &*state {
                TokenState::Ready(token) if !token.is_expired() => {
                    debug!("reusing cached bearer token");
                    return Ok(token.token.clone());
                }
                TokenState::Refreshing(refresh) => refresh.clone(),
                _ => {
                    debug!("bearer token missing or expired, starting refresh");
                    let refresh = Self::refresh(
                        self.api.clone(),
                        self.key.clone(),
                        self.contract_address.clone(),
                    )
                    .boxed()
                    .shared();
                    *state = TokenState::Refreshing(refresh.clone());
                    refresh
                }
            }
        };

        let outcome = refresh.clone().await;

        // Write the outcome back, unless a newer refresh already replaced
        // this one. A failure leaves the slot empty so the next operation
        // retries from scratch.
        {
            let mut state = self.lock_state();
            if matches!(&*state, TokenState::Refreshing(current) if current.ptr_eq(&refresh)) {
                *state = match &outcome {
                    Ok(token) => TokenState::Ready(token.clone()),
                    Err(_) => TokenState::Empty,
                };
            }
        }

        outcome.map(|token| token.token)
    }

    /// Full challenge/solve exchange producing a fresh token
    async fn refresh(
        api: Arc<dyn PointsApi>,
        key: OperatorKey,
        contract_address: String,
    ) -> Result<BearerToken> {
        // Step 1: request a challenge for the operator address
        let challenge = api
            .request_challenge(&ChallengeRequest {
                contract_address,
                operator_address: key.address(),
            })
            .await?;
        if !challenge.success {
            return Err(Error::Auth(
                "points service rejected the auth challenge request".to_string(),
            ));
        }
        let challenge_data = challenge.challenge_data.ok_or_else(|| {
            Error::Auth("auth challenge response is missing challengeData".to_string())
        })?;
        let message = challenge.message.ok_or_else(|| {
            Error::Auth("auth challenge response is missing the message to sign".to_string())
        })?;

        // Step 2: prove key ownership by signing the challenge message
        let signature = key.sign_message(&message).await?;
        let solved = api
            .solve_challenge(&SolveRequest {
                challenge_data,
                signature,
            })
            .await?;
        if !solved.success {
            return Err(Error::Auth(
                "points service rejected the challenge signature".to_string(),
            ));
        }
        let token = solved.bearer_token.ok_or_else(|| {
            Error::Auth("auth solve response is missing bearerToken".to_string())
        })?;

        let token = BearerToken::issued_now(token);
        debug!(expires_at = token.expires_at, "bearer token refreshed");
        Ok(token)
    }

    fn lock_state(&self) -> MutexGuard<'_, TokenState> {
        // The slot state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Rewind the cached token's expiry so the next call refreshes.
    #[cfg(test)]
    fn expire_cached_token(&self) {
        let mut state = self.lock_state();
        if let TokenState::Ready(token) = &*state {
            *state = TokenState::Ready(BearerToken {
                token: token.token.clone(),
                expires_at: 0,
            });
        }
    }
}

/// Returns the current UNIX timestamp in seconds.
fn unix_timestamp_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}
