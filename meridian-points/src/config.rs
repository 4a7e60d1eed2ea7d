//! Session configuration and service endpoints

use std::fmt;

/// Base URL of the points service on mainnet
pub const MAINNET_BASE_URL: &str = "https://points-api.meridian.xyz";

/// Base URL of the points service on testnet
pub const TESTNET_BASE_URL: &str = "https://points-api.testnet.meridian.xyz";

/// Network the points service is queried for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Mainnet
    Mainnet,
    /// Testnet
    Testnet,
}

impl Network {
    /// Base URL of the points service for this network
    pub fn base_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_BASE_URL,
            Network::Testnet => TESTNET_BASE_URL,
        }
    }
}

/// Configuration for a [`Session`](crate::session::Session)
///
/// The operator private key and the contract address are required; everything
/// else has a default. The key is an ECDSA private key as hex, with or without
/// a `0x` prefix.
#[derive(Clone)]
pub struct SessionConfig {
    pub(crate) operator_key: Option<String>,
    pub(crate) contract_address: Option<String>,
    pub(crate) network: Network,
    pub(crate) base_url: Option<String>,
    pub(crate) seconds_to_finalize: Option<u64>,
}

impl SessionConfig {
    /// Create a configuration with mainnet defaults
    pub fn new() -> Self {
        Self {
            operator_key: None,
            contract_address: None,
            network: Network::Mainnet,
            base_url: None,
            seconds_to_finalize: None,
        }
    }

    /// Set the operator private key (hex, `0x` prefix optional)
    pub fn operator_key(mut self, key: impl Into<String>) -> Self {
        self.operator_key = Some(key.into());
        self
    }

    /// Set the contract address the session operates on
    pub fn contract_address(mut self, address: impl Into<String>) -> Self {
        self.contract_address = Some(address.into());
        self
    }

    /// Select the network preset
    pub fn network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Override the service base URL (takes precedence over the network preset)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Finalize delay applied to subsequent transfer submissions
    pub fn seconds_to_finalize(mut self, seconds: u64) -> Self {
        self.seconds_to_finalize = Some(seconds);
        self
    }

    /// Resolve the effective base URL: explicit override, else network preset
    pub(crate) fn resolved_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None => self.network.base_url().to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Manual Debug so the operator key never reaches logs or error output.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field(
                "operator_key",
                &self.operator_key.as_ref().map(|_| "<redacted>"),
            )
            .field("contract_address", &self.contract_address)
            .field("network", &self.network)
            .field("base_url", &self.base_url)
            .field("seconds_to_finalize", &self.seconds_to_finalize)
            .finish()
    }
}
