//! Mnemonic phrases and seed derivation
//!
//! Phrases are twelve words from the BIP39 English list. Validation checks word
//! count and list membership only, so phrases from [`Mnemonic::new_random`] (which
//! carry no checksum) and standard BIP39 phrases are both accepted.

use crate::{Error, Result};
use bip39::Language;
use once_cell::sync::Lazy;
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, Rng, RngCore};
use sha2::Sha512;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, Zeroizing};

/// Number of words in a wallet mnemonic
pub const MNEMONIC_WORD_COUNT: usize = 12;

/// Seed length in bytes
pub const SEED_LEN: usize = 64;

const PBKDF2_ROUNDS: u32 = 2048;
const SEED_SALT_PREFIX: &str = "mnemonic";

static WORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| Language::English.word_list().iter().copied().collect());

/// Case-insensitive word list membership
pub fn is_word(word: &str) -> bool {
    WORD_SET.contains(word.to_lowercase().as_str())
}

/// Wallet seed bytes, wiped on drop
pub type Seed = Zeroizing<[u8; SEED_LEN]>;

/// Twelve-word mnemonic phrase
#[derive(Clone, PartialEq, Eq)]
pub struct Mnemonic {
    words: Vec<String>,
}

impl Mnemonic {
    /// Draw twelve words uniformly at random from the word list.
    ///
    /// The result is not BIP39 checksummed; see [`Mnemonic::generate_checksummed`]
    /// for phrases that strict BIP39 validators accept.
    pub fn new_random() -> Self {
        let list = Language::English.word_list();
        let mut rng = OsRng;
        let words = (0..MNEMONIC_WORD_COUNT)
            .map(|_| list[rng.gen_range(0..list.len())].to_string())
            .collect();
        Self { words }
    }

    /// Generate a standard BIP39 phrase from 128 bits of entropy
    pub fn generate_checksummed() -> Result<Self> {
        let mut entropy = Zeroizing::new([0u8; 16]);
        OsRng.fill_bytes(entropy.as_mut());

        let mnemonic = bip39::Mnemonic::from_entropy_in(Language::English, entropy.as_ref())
            .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

        Ok(Self {
            words: mnemonic.words().map(str::to_string).collect(),
        })
    }

    /// Parse and validate a phrase
    pub fn parse(phrase: &str) -> Result<Self> {
        Self::from_words(phrase.split_whitespace())
    }

    /// Build from individual words, validating count and membership
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .collect();

        if words.len() != MNEMONIC_WORD_COUNT {
            return Err(Error::InvalidMnemonic(format!(
                "expected {} words, got {}",
                MNEMONIC_WORD_COUNT,
                words.len()
            )));
        }

        if let Some(position) = words.iter().position(|w| !WORD_SET.contains(w.as_str())) {
            return Err(Error::InvalidMnemonic(format!(
                "word {} is not in the word list",
                position + 1
            )));
        }

        Ok(Self { words })
    }

    /// Validate a phrase without keeping it
    pub fn validate(phrase: &str) -> Result<()> {
        Self::parse(phrase).map(|_| ())
    }

    /// Words in order
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Space-joined phrase
    pub fn phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.words.join(" "))
    }

    /// PBKDF2-HMAC-SHA512 seed with salt `"mnemonic" + passphrase`
    pub fn seed(&self, passphrase: &str) -> Seed {
        let phrase = self.phrase();
        let salt = Zeroizing::new(format!("{}{}", SEED_SALT_PREFIX, passphrase));

        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        pbkdf2_hmac::<Sha512>(
            phrase.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ROUNDS,
            seed.as_mut(),
        );
        seed
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.phrase())
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mnemonic")
            .field("words", &format_args!("[REDACTED; {}]", self.words.len()))
            .finish()
    }
}

impl FromStr for Mnemonic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Drop for Mnemonic {
    fn drop(&mut self) {
        self.words.zeroize();
    }
}
