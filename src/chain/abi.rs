//! Calldata for the three contract functions the app uses, and uint256 decoding.

use crate::chain::Address;

/// `keccak256("getCurrentDay()")[..4]`
pub const GET_CURRENT_DAY: [u8; 4] = [0x3e, 0x69, 0x68, 0xb6];
/// `keccak256("lastClaimDay(address)")[..4]`
pub const LAST_CLAIM_DAY: [u8; 4] = [0x89, 0x11, 0xf7, 0x93];
/// `keccak256("checkInAndClaim()")[..4]`
pub const CHECK_IN_AND_CLAIM: [u8; 4] = [0xb1, 0x4c, 0x2d, 0x99];

const WORD: usize = 32;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AbiError {
    #[error("return data is {0} bytes, expected at least 32")]
    Short(usize),
    #[error("uint256 value does not fit in 64 bits")]
    Overflow,
    #[error("return data is not hex: {0}")]
    Hex(String),
}

pub fn encode_get_current_day() -> Vec<u8> {
    GET_CURRENT_DAY.to_vec()
}

pub fn encode_last_claim_day(owner: &Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&LAST_CLAIM_DAY);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(owner.as_bytes());
    data
}

pub fn encode_check_in_and_claim() -> Vec<u8> {
    CHECK_IN_AND_CLAIM.to_vec()
}

/// Decodes the first return word as an unsigned integer that must fit in `u64`.
pub fn decode_u64(data: &[u8]) -> Result<u64, AbiError> {
    let word = data.get(..WORD).ok_or(AbiError::Short(data.len()))?;
    let (high, low) = word.split_at(WORD - 8);
    if high.iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(low);
    Ok(u64::from_be_bytes(bytes))
}

pub fn to_hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

pub fn from_hex_data(s: &str) -> Result<Vec<u8>, AbiError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| AbiError::Hex(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn encode_last_claim_day__left_pads_the_address() {
        // given
        let owner = Address::new([0xAB; 20]);

        // when
        let data = encode_last_claim_day(&owner);

        // then
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &LAST_CLAIM_DAY);
        assert!(data[4..16].iter().all(|b| *b == 0));
        assert_eq!(&data[16..], &[0xAB; 20]);
    }

    #[test]
    fn encode_check_in_and_claim__is_selector_only() {
        assert_eq!(to_hex_data(&encode_check_in_and_claim()), "0xb14c2d99");
    }

    #[test]
    fn decode_u64__reads_big_endian_word() {
        // given
        let mut word = [0u8; 32];
        word[31] = 0x2a;
        word[30] = 0x01;

        // then
        assert_eq!(decode_u64(&word).unwrap(), 0x012a);
    }

    #[test]
    fn decode_u64__rejects_short_and_oversized_values() {
        // given
        let mut big = [0u8; 32];
        big[0] = 1;

        // then
        assert_eq!(decode_u64(&[0u8; 4]), Err(AbiError::Short(4)));
        assert_eq!(decode_u64(&big), Err(AbiError::Overflow));
    }

    #[test]
    fn from_hex_data__accepts_prefixed_input() {
        assert_eq!(from_hex_data("0x0102").unwrap(), vec![1, 2]);
        assert!(from_hex_data("0xzz").is_err());
    }
}
