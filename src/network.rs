//! Network descriptor passed through to the dispatcher.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chain a provider is expected to talk to.
///
/// The provider never inspects it; it is handed unmodified to the dispatcher
/// through [`ProviderContext`](crate::ProviderContext).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Human-readable network name.
    pub name: String,
    /// EIP-155 chain identifier.
    pub chain_id: u64,
}

impl Network {
    /// Creates a network descriptor.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            chain_id,
        }
    }

    /// Creates a descriptor known only by chain id.
    #[inline]
    #[must_use]
    pub fn from_chain_id(chain_id: u64) -> Self {
        Self::new("unknown", chain_id)
    }
}

impl From<u64> for Network {
    fn from(chain_id: u64) -> Self {
        Self::from_chain_id(chain_id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (chain {})", self.name, self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_chain_id() {
        let network = Network::from(11_155_111);
        assert_eq!(network.name, "unknown");
        assert_eq!(network.chain_id, 11_155_111);
    }

    #[test]
    fn test_display() {
        assert_eq!(Network::new("mainnet", 1).to_string(), "mainnet (chain 1)");
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&Network::new("mainnet", 1)).expect("serialize");
        assert_eq!(json, r#"{"name":"mainnet","chainId":1}"#);

        let parsed: Network = serde_json::from_str(r#"{"name":"sepolia","chainId":11155111}"#)
            .expect("deserialize");
        assert_eq!(parsed, Network::new("sepolia", 11_155_111));
    }
}
