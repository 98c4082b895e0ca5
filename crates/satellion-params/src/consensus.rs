//! Protocol constants used for key derivation and compact filter matching

/// BIP86 purpose field (`m/86'/...`), single-key P2TR outputs
pub const BIP86_PURPOSE: u32 = 86;

/// Account used for all derived addresses
pub const DEFAULT_ACCOUNT: u32 = 0;

/// BIP158 basic filter false-positive rate parameter `M`
pub const FILTER_M: u64 = 784_931;

/// BIP158 basic filter Golomb-Rice coding parameter `P`
pub const FILTER_P: u8 = 19;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_filter_params() {
        assert_eq!(FILTER_M, 784_931);
        assert_eq!(FILTER_P, 19);
        assert_eq!(BIP86_PURPOSE, 86);
    }
}
