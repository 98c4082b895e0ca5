//! Key derivation and management
//!
//! BIP32 master key from the wallet seed, BIP86 child derivation along
//! `m/86'/coin'/0'/change/index`, and the BIP341 taproot output-key tweak.

use crate::{Error, Result};
use bip32::{ChildNumber, XPrv};
use once_cell::sync::Lazy;
use satellion_params::{BIP86_PURPOSE, DEFAULT_ACCOUNT};
use secp256k1::{All, PublicKey, Secp256k1, SecretKey, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

const TAP_TWEAK_TAG: &[u8] = b"TapTweak";

/// Branch of the derivation path (the `change` level)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// External chain, `change = 0`
    Receive,
    /// Internal chain, `change = 1`
    Change,
}

impl AddressKind {
    /// Value of the `change` path component
    pub const fn branch(self) -> u32 {
        match self {
            AddressKind::Receive => 0,
            AddressKind::Change => 1,
        }
    }

    /// True for the internal chain
    pub const fn is_change(self) -> bool {
        matches!(self, AddressKind::Change)
    }
}

/// BIP32 master extended private key
#[derive(Clone)]
pub struct RootKey {
    xprv: XPrv,
}

impl RootKey {
    /// Derive the master key from seed bytes (16 to 64 bytes)
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let xprv = XPrv::new(seed)?;
        Ok(Self { xprv })
    }

    /// Walk `m/86'/coin'/0'/branch/index` and return the leaf key pair.
    pub fn derive_bip86(&self, coin_type: u32, kind: AddressKind, index: u32) -> Result<KeyPair> {
        let path = [
            ChildNumber::new(BIP86_PURPOSE, true)?,
            ChildNumber::new(coin_type, true)?,
            ChildNumber::new(DEFAULT_ACCOUNT, true)?,
            ChildNumber::new(kind.branch(), false)?,
            ChildNumber::new(index, false)?,
        ];

        let mut xprv = self.xprv.clone();
        for child in path {
            xprv = xprv.derive_child(child)?;
        }

        let secret_bytes = Zeroizing::new(xprv.to_bytes());
        let secret = SecretKey::from_slice(secret_bytes.as_ref())?;
        let public = PublicKey::from_secret_key(&*SECP, &secret);

        Ok(KeyPair { secret, public })
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootKey([REDACTED])")
    }
}

/// Leaf key pair on a BIP86 path
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Compressed public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Secret key bytes
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret.secret_bytes())
    }

    /// Internal key in x-only form (even-y normalized)
    pub fn internal_key(&self) -> XOnlyPublicKey {
        self.public.x_only_public_key().0
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// BIP340 tagged hash: `sha256(sha256(tag) || sha256(tag) || msg)`
pub fn tagged_hash(tag: &[u8], msg: &[u8]) -> [u8; 32] {
    let tag_hash = Sha256::digest(tag);
    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    hasher.update(msg);
    hasher.finalize().into()
}

/// Taproot output key `Q = P + hash_TapTweak(P)·G` for a key-path-only output.
///
/// `P` is lifted to the point with even y before the addition. Returns the
/// x-only serialization of `Q`.
pub fn taproot_output_key(internal: &XOnlyPublicKey) -> Result<[u8; 32]> {
    let internal_bytes = internal.serialize();
    let tweak = tagged_hash(TAP_TWEAK_TAG, &internal_bytes);

    // t >= n has negligible probability but is a hard failure per BIP341
    let tweak_scalar = SecretKey::from_slice(&tweak)
        .map_err(|_| Error::KeyDerivation("tap tweak exceeds curve order".to_string()))?;
    let tweak_point = PublicKey::from_secret_key(&*SECP, &tweak_scalar);

    let mut even = [0u8; 33];
    even[0] = 0x02;
    even[1..].copy_from_slice(&internal_bytes);
    let internal_point = PublicKey::from_slice(&even)?;

    let output = internal_point.combine(&tweak_point)?;
    Ok(output.x_only_public_key().0.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mnemonic;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn root() -> RootKey {
        let mnemonic = Mnemonic::parse(ABANDON).unwrap();
        RootKey::from_seed(mnemonic.seed("").as_ref()).unwrap()
    }

    #[test]
    fn test_bip86_internal_and_output_key() {
        let pair = root().derive_bip86(0, AddressKind::Receive, 0).unwrap();
        let internal = pair.internal_key();
        assert_eq!(
            hex::encode(internal.serialize()),
            "cc8a4bc64d897bddc5fbc2f670f7a8ba0b386779106cf1223c6fc5d7cd6fc115"
        );
        assert_eq!(
            hex::encode(taproot_output_key(&internal).unwrap()),
            "a60869f0dbcf1dc659c9cecbaf8050135ea9e8cdc487053f1dc6880949dc684c"
        );
    }

    #[test]
    fn test_tweak_matches_secp_add_tweak() {
        let pair = root().derive_bip86(0, AddressKind::Change, 3).unwrap();
        let internal = pair.internal_key();
        let tweak = tagged_hash(TAP_TWEAK_TAG, &internal.serialize());
        let scalar = secp256k1::Scalar::from_be_bytes(tweak).unwrap();
        let (expected, _) = internal.add_tweak(&*SECP, &scalar).unwrap();
        assert_eq!(taproot_output_key(&internal).unwrap(), expected.serialize());
    }

    #[test]
    fn test_branches_differ() {
        let root = root();
        let receive = root.derive_bip86(0, AddressKind::Receive, 0).unwrap();
        let change = root.derive_bip86(0, AddressKind::Change, 0).unwrap();
        assert_ne!(receive.public_key(), change.public_key());
    }

    #[test]
    fn test_hardened_range_rejected_for_index() {
        let err = root()
            .derive_bip86(0, AddressKind::Receive, 0x8000_0000)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DerivationFailure);
    }

    #[test]
    fn test_seed_length_rejected() {
        assert!(RootKey::from_seed(&[0u8; 8]).is_err());
    }
}
