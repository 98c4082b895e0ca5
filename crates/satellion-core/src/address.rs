//! Pay-to-taproot addresses
//!
//! Addresses are a derived view of the key tree and are never persisted.

use crate::keys::{taproot_output_key, AddressKind, KeyPair};
use crate::{Error, Result};
use bech32::Hrp;
use satellion_params::Network;
use std::fmt;

/// `OP_1`, segwit version 1
const OP_1: u8 = 0x51;
/// Push of the 32-byte witness program
const PUSH_32: u8 = 0x20;

/// Length of a P2TR scriptPubKey
pub const TAPROOT_SCRIPT_LEN: usize = 34;

/// Derived P2TR address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaprootAddress {
    /// Derivation index
    pub index: u32,
    /// Receive or change branch
    pub kind: AddressKind,
    /// Untweaked x-only internal key
    pub internal_key: [u8; 32],
    /// Tweaked x-only output key
    pub output_key: [u8; 32],
    /// Bech32m encoding (bc1p...)
    pub address: String,
}

impl TaprootAddress {
    /// Build the address for a derived key pair
    pub fn from_key_pair(
        network: &Network,
        kind: AddressKind,
        index: u32,
        pair: &KeyPair,
    ) -> Result<Self> {
        let internal = pair.internal_key();
        let output_key = taproot_output_key(&internal)?;
        let address = encode_taproot(network, &output_key)?;

        Ok(Self {
            index,
            kind,
            internal_key: internal.serialize(),
            output_key,
            address,
        })
    }

    /// True when derived on the change branch
    pub fn is_change(&self) -> bool {
        self.kind.is_change()
    }

    /// `OP_1 0x20 <output key>`
    pub fn script_pubkey(&self) -> Vec<u8> {
        taproot_script(&self.output_key)
    }
}

impl fmt::Display for TaprootAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// P2TR scriptPubKey for an output key
pub fn taproot_script(output_key: &[u8; 32]) -> Vec<u8> {
    let mut script = Vec::with_capacity(TAPROOT_SCRIPT_LEN);
    script.push(OP_1);
    script.push(PUSH_32);
    script.extend_from_slice(output_key);
    script
}

/// Bech32m-encode a witness v1 program for the network
pub fn encode_taproot(network: &Network, output_key: &[u8; 32]) -> Result<String> {
    let hrp = Hrp::parse(network.bech32_hrp)
        .map_err(|e| Error::InvalidAddress(format!("bad hrp {}: {}", network.bech32_hrp, e)))?;
    bech32::segwit::encode_v1(hrp, output_key).map_err(|e| Error::InvalidAddress(e.to_string()))
}

/// Decode a taproot address into its network and output key
pub fn parse_taproot_address(address: &str) -> Result<(Network, [u8; 32])> {
    let (hrp, version, program) =
        bech32::segwit::decode(address).map_err(|e| Error::InvalidAddress(e.to_string()))?;

    if version.to_u8() != 1 {
        return Err(Error::InvalidAddress(format!(
            "expected witness version 1, got {}",
            version.to_u8()
        )));
    }

    let network = Network::from_hrp(&hrp.to_lowercase())
        .ok_or_else(|| Error::InvalidAddress(format!("unknown network prefix {}", hrp)))?;

    let output_key: [u8; 32] = program.as_slice().try_into().map_err(|_| {
        Error::InvalidAddress(format!("taproot program must be 32 bytes, got {}", program.len()))
    })?;

    Ok((network, output_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR_ADDRESS: &str = "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";
    const VECTOR_OUTPUT_KEY: &str = "a60869f0dbcf1dc659c9cecbaf8050135ea9e8cdc487053f1dc6880949dc684c";

    fn vector_key() -> [u8; 32] {
        hex::decode(VECTOR_OUTPUT_KEY).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_encode_bip86_vector() {
        let address = encode_taproot(&Network::mainnet(), &vector_key()).unwrap();
        assert_eq!(address, VECTOR_ADDRESS);
    }

    #[test]
    fn test_script_layout() {
        let script = taproot_script(&vector_key());
        assert_eq!(script.len(), TAPROOT_SCRIPT_LEN);
        assert_eq!(
            hex::encode(&script),
            format!("5120{}", VECTOR_OUTPUT_KEY)
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let (network, key) = parse_taproot_address(VECTOR_ADDRESS).unwrap();
        assert_eq!(network, Network::mainnet());
        assert_eq!(key, vector_key());
    }

    #[test]
    fn test_regtest_prefix() {
        let address = encode_taproot(&Network::regtest(), &vector_key()).unwrap();
        assert!(address.starts_with("bcrt1p"));
    }

    #[test]
    fn test_rejects_segwit_v0() {
        // BIP173 P2WPKH example
        let err = parse_taproot_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }
}
