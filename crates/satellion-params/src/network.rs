//! Bitcoin network definitions

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Network type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Mainnet
    #[default]
    Mainnet,
    /// Testnet
    Testnet,
    /// Signet
    Signet,
    /// Regtest (local development)
    Regtest,
}

impl FromStr for NetworkType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "main" => Ok(Self::Mainnet),
            "testnet" | "testnet3" | "test" => Ok(Self::Testnet),
            "signet" => Ok(Self::Signet),
            "regtest" => Ok(Self::Regtest),
            other => Err(crate::Error::InvalidNetwork(other.to_string())),
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    /// Network type
    pub network_type: NetworkType,
    /// Human-readable name
    pub name: &'static str,
    /// Coin type (BIP-44)
    pub coin_type: u32,
    /// Bech32 human-readable part for segwit addresses
    pub bech32_hrp: &'static str,
}

impl Network {
    /// Get mainnet parameters
    pub const fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            name: "mainnet",
            coin_type: 0,
            bech32_hrp: "bc",
        }
    }

    /// Get testnet parameters
    pub const fn testnet() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            name: "testnet",
            coin_type: 1,
            bech32_hrp: "tb",
        }
    }

    /// Get signet parameters
    pub const fn signet() -> Self {
        Self {
            network_type: NetworkType::Signet,
            name: "signet",
            coin_type: 1,
            bech32_hrp: "tb",
        }
    }

    /// Get regtest parameters
    pub const fn regtest() -> Self {
        Self {
            network_type: NetworkType::Regtest,
            name: "regtest",
            coin_type: 1,
            bech32_hrp: "bcrt",
        }
    }

    /// Get network by type
    pub const fn from_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::testnet(),
            NetworkType::Signet => Self::signet(),
            NetworkType::Regtest => Self::regtest(),
        }
    }

    /// Resolve a network from its bech32 human-readable part.
    ///
    /// `tb` is shared by testnet and signet and resolves to testnet.
    pub fn from_hrp(hrp: &str) -> Option<Self> {
        match hrp.to_ascii_lowercase().as_str() {
            "bc" => Some(Self::mainnet()),
            "tb" => Some(Self::testnet()),
            "bcrt" => Some(Self::regtest()),
            _ => None,
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_params() {
        let net = Network::mainnet();
        assert_eq!(net.network_type, NetworkType::Mainnet);
        assert_eq!(net.coin_type, 0);
        assert_eq!(net.bech32_hrp, "bc");
    }

    #[test]
    fn test_network_from_type() {
        let net = Network::from_type(NetworkType::Regtest);
        assert_eq!(net.bech32_hrp, "bcrt");
        assert_eq!(net.coin_type, 1);
    }

    #[test]
    fn test_testnet_and_signet_share_hrp() {
        assert_eq!(Network::testnet().bech32_hrp, Network::signet().bech32_hrp);
        assert_eq!(Network::from_hrp("tb"), Some(Network::testnet()));
    }

    #[test]
    fn test_network_type_parsing() {
        assert_eq!("Bitcoin".parse::<NetworkType>().unwrap(), NetworkType::Mainnet);
        assert_eq!("signet".parse::<NetworkType>().unwrap(), NetworkType::Signet);
        assert!("litecoin".parse::<NetworkType>().is_err());
    }

    #[test]
    fn test_network_type_serde() {
        let json = serde_json::to_string(&NetworkType::Testnet).unwrap();
        assert_eq!(json, "\"testnet\"");
    }

    #[test]
    fn test_from_hrp() {
        assert_eq!(Network::from_hrp("BC"), Some(Network::mainnet()));
        assert_eq!(Network::from_hrp("ltc"), None);
    }
}
