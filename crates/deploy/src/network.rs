//! Target network resolution.

use std::fmt;

/// Environment variable selecting the target network.
pub const NETWORK_ENV_VAR: &str = "HARDHAT_NETWORK";

/// The network a deployment targets.
///
/// `localhost` and `hardhat` are local development chains. Every other label is treated as a
/// public network, which is the only kind that gets explorer verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    #[default]
    Localhost,
    Hardhat,
    #[strum(default)]
    Public(String),
}

impl Network {
    /// Resolve a network from an optional label.
    ///
    /// A missing or blank label is not an error: it selects `localhost`.
    pub fn resolve(label: Option<&str>) -> Self {
        match label.map(str::trim).filter(|label| !label.is_empty()) {
            None => Self::Localhost,
            Some(label) => label
                .parse()
                .unwrap_or_else(|_| Self::Public(label.to_string())),
        }
    }

    /// Resolve the network from [`NETWORK_ENV_VAR`].
    pub fn from_env() -> Self {
        Self::resolve(std::env::var(NETWORK_ENV_VAR).ok().as_deref())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Localhost => "localhost",
            Self::Hardhat => "hardhat",
            Self::Public(name) => name,
        }
    }

    /// Whether this is one of the local development networks.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Localhost | Self::Hardhat)
    }

    /// Whether deployments on this network should be verified on a block explorer.
    pub fn requires_verification(&self) -> bool {
        !self.is_local()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
