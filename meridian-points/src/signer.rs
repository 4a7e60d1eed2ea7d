//! Operator key handling: address derivation and challenge signing

use std::fmt;

use ethers::signers::{LocalWallet, Signer};
use ethers::utils::to_checksum;

use crate::error::{Error, Result};

/// The operator's signing identity
///
/// Wraps the operator's ECDSA private key. The operator address sent in the
/// auth challenge is derived deterministically from this key, and challenge
/// messages are signed with it under the ERC-191 personal-message scheme.
#[derive(Clone)]
pub struct OperatorKey {
    wallet: LocalWallet,
}

impl OperatorKey {
    /// Parse an operator key from hex (`0x` prefix optional)
    pub fn from_hex(key: &str) -> Result<Self> {
        let wallet = key
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| Error::Config(format!("Invalid operator private key: {}", e)))?;

        Ok(Self { wallet })
    }

    /// Checksummed operator address derived from the key
    pub fn address(&self) -> String {
        to_checksum(&self.wallet.address(), None)
    }

    /// Sign a challenge message under ERC-191 personal-message signing
    ///
    /// Returns the recoverable signature as `0x`-prefixed hex.
    pub async fn sign_message(&self, message: &str) -> Result<String> {
        let signature = self
            .wallet
            .sign_message(message)
            .await
            .map_err(|e| Error::Auth(format!("Failed to sign auth challenge: {}", e)))?;

        Ok(format!("0x{}", signature))
    }
}

// The key must never leak through Debug output.
impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorKey")
            .field("address", &self.address())
            .finish()
    }
}
