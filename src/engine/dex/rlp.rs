// Paw Agent Engine — DEX RLP Encoding
// Recursive-length prefix encoding as used in Ethereum transactions.

use alloy_primitives::U256;

/// RLP-encode a single byte string
pub(crate) fn rlp_encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        return data.to_vec();
    }
    if data.len() <= 55 {
        let mut encoded = vec![(0x80 + data.len()) as u8];
        encoded.extend_from_slice(data);
        encoded
    } else {
        let len_bytes = u64_to_minimal_be(data.len() as u64);
        let mut encoded = vec![(0xb7 + len_bytes.len()) as u8];
        encoded.extend_from_slice(&len_bytes);
        encoded.extend_from_slice(data);
        encoded
    }
}

/// RLP-encode a list of already-RLP-encoded items
pub(crate) fn rlp_encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = items.concat();
    if payload.len() <= 55 {
        let mut encoded = vec![(0xc0 + payload.len()) as u8];
        encoded.extend_from_slice(&payload);
        encoded
    } else {
        let len_bytes = u64_to_minimal_be(payload.len() as u64);
        let mut encoded = vec![(0xf7 + len_bytes.len()) as u8];
        encoded.extend_from_slice(&len_bytes);
        encoded.extend_from_slice(&payload);
        encoded
    }
}

/// Encode a u64 as minimal big-endian bytes (zero → empty)
pub(crate) fn u64_to_minimal_be(val: u64) -> Vec<u8> {
    strip_leading_zeros(&val.to_be_bytes())
}

/// Encode a U256 as minimal big-endian bytes (zero → empty)
pub(crate) fn u256_to_minimal_be(val: U256) -> Vec<u8> {
    strip_leading_zeros(&val.to_be_bytes::<32>())
}

/// Strip leading zero bytes (for RLP integers and signature r, s)
pub(crate) fn strip_leading_zeros(data: &[u8]) -> Vec<u8> {
    match data.iter().position(|&b| b != 0) {
        Some(pos) => data[pos..].to_vec(),
        None => vec![],
    }
}
