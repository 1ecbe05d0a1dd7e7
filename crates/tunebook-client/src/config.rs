use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::catalog::Method;
use crate::error::ClientError;

/// Canister id dfx assigns to the first canister of a fresh local replica.
pub const DEFAULT_CANISTER_ID: &str = "bkyz2-fmaaa-aaaaa-qaaaq-cai";
/// Where a gateway runs beside a local replica (the replica itself is on
/// 4943 and does not serve the gateway routes).
pub const LOCAL_GATEWAY_HOST: &str = "http://127.0.0.1:4944";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Deployment the client talks to.
///
/// `Ic` has no defaults: mainnet boundary nodes speak the replica protocol,
/// not the gateway routes, so both the gateway host and the canister id
/// have to be configured explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Local,
    Ic,
}

impl Network {
    pub fn default_host(self) -> Option<&'static str> {
        match self {
            Network::Local => Some(LOCAL_GATEWAY_HOST),
            Network::Ic => None,
        }
    }

    pub fn default_canister_id(self) -> Option<&'static str> {
        match self {
            Network::Local => Some(DEFAULT_CANISTER_ID),
            Network::Ic => None,
        }
    }
}

impl FromStr for Network {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Network::Local),
            "ic" | "mainnet" => Ok(Network::Ic),
            other => Err(ClientError::Config(format!("unknown network '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub network: Network,
    /// Gateway base URL, no trailing slash. Empty until configured for
    /// networks without a default.
    pub host: String,
    pub canister_id: String,
    /// Upper bound on a single round trip. The contract has no timeout of
    /// its own.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_network(Network::Local)
    }
}

impl ClientConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            host: network.default_host().unwrap_or_default().to_string(),
            canister_id: network.default_canister_id().unwrap_or_default().to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read configuration from the process environment, honouring a `.env`
    /// file if present.
    ///
    /// - `TUNEBOOK_NETWORK`: `local` (default) or `ic`
    /// - `TUNEBOOK_HOST`: gateway URL, required for `ic`
    /// - `CANISTER_ID_TUNEBOOK`: target service id, required for `ic`
    /// - `TUNEBOOK_TIMEOUT_SECS`: per-call timeout
    pub fn from_env() -> Result<Self, ClientError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = match lookup("TUNEBOOK_NETWORK") {
            Some(value) => value.parse()?,
            None => Network::default(),
        };

        let mut config = Self::for_network(network);

        if let Some(host) = lookup("TUNEBOOK_HOST") {
            config.host = host;
        }
        if config.host.trim().is_empty() {
            return Err(ClientError::Config(format!(
                "TUNEBOOK_HOST must name a gateway for network {network:?}"
            )));
        }
        config.host = sanitize_host(config.host)?;

        if let Some(id) = lookup("CANISTER_ID_TUNEBOOK") {
            let id = id.trim();
            if id.is_empty() {
                return Err(ClientError::Config("CANISTER_ID_TUNEBOOK is empty".into()));
            }
            config.canister_id = id.to_string();
        }
        if config.canister_id.is_empty() {
            return Err(ClientError::Config(format!(
                "CANISTER_ID_TUNEBOOK is required for network {network:?}"
            )));
        }

        if let Some(secs) = lookup("TUNEBOOK_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("invalid TUNEBOOK_TIMEOUT_SECS '{secs}'")))?;
            if secs == 0 {
                return Err(ClientError::Config("TUNEBOOK_TIMEOUT_SECS must be positive".into()));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Result<Self, ClientError> {
        self.host = sanitize_host(host.into())?;
        Ok(self)
    }

    /// Fails on the gaps `for_network` leaves for networks without
    /// defaults.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.host.is_empty() {
            return Err(ClientError::Config("no gateway host configured".into()));
        }
        if self.canister_id.is_empty() {
            return Err(ClientError::Config("no canister id configured".into()));
        }
        Ok(())
    }

    /// Full URL of a method on the gateway.
    pub fn endpoint(&self, method: Method) -> String {
        format!(
            "{}/api/canister/{}/{}/{}",
            self.host,
            self.canister_id,
            method.class().path_segment(),
            method.name()
        )
    }
}

fn sanitize_host(mut host: String) -> Result<String, ClientError> {
    host = host.trim().to_string();
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("http://{host}");
    }
    while host.ends_with('/') {
        host.pop();
    }
    Url::parse(&host).map_err(|e| ClientError::Config(format!("invalid host '{host}': {e}")))?;
    Ok(host)
}
