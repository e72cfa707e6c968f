// Paw Agent Engine — DEX ABI Encoding
// EVM ABI encoding for the constant-product (Uniswap V2 style) router,
// factory and pair contracts, plus ERC-20 introspection helpers.

use super::primitives::{hex_decode, keccak256};
use crate::atoms::error::{EngineError, EngineResult};
use alloy_primitives::U256;

/// Compute 4-byte function selector from signature
pub fn function_selector(sig: &str) -> [u8; 4] {
    let hash = keccak256(sig.as_bytes());
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&hash[..4]);
    sel
}

// ── Signatures ─────────────────────────────────────────────────────────────

pub(crate) const SIG_GET_PAIR: &str = "getPair(address,address)";
pub(crate) const SIG_GET_RESERVES: &str = "getReserves()";
pub(crate) const SIG_TOKEN0: &str = "token0()";
pub(crate) const SIG_GET_AMOUNTS_OUT: &str = "getAmountsOut(uint256,address[])";
pub(crate) const SIG_SWAP_EXACT_ETH_FOR_TOKENS: &str = "swapExactETHForTokens(uint256,address[],address,uint256)";
pub(crate) const SIG_SWAP_EXACT_TOKENS_FOR_ETH: &str = "swapExactTokensForETH(uint256,uint256,address[],address,uint256)";
pub(crate) const SIG_BALANCE_OF: &str = "balanceOf(address)";
pub(crate) const SIG_DECIMALS: &str = "decimals()";
pub(crate) const SIG_SYMBOL: &str = "symbol()";
pub(crate) const SIG_APPROVE: &str = "approve(address,uint256)";
pub(crate) const SIG_ALLOWANCE: &str = "allowance(address,address)";
pub(crate) const SIG_TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";

// ── Word encoding ──────────────────────────────────────────────────────────

/// ABI-encode an address (left-padded to 32 bytes)
pub(crate) fn abi_encode_address(addr: &[u8; 20]) -> Vec<u8> {
    let mut encoded = vec![0u8; 12];
    encoded.extend_from_slice(addr);
    encoded
}

pub(crate) fn abi_encode_uint256(val: U256) -> Vec<u8> {
    val.to_be_bytes::<32>().to_vec()
}

fn abi_encode_usize(val: usize) -> Vec<u8> {
    abi_encode_uint256(U256::from(val))
}

/// Tail of a dynamic `address[]`: length word followed by one word per element
fn abi_encode_address_array(items: &[[u8; 20]]) -> Vec<u8> {
    let mut out = abi_encode_usize(items.len());
    for item in items {
        out.extend_from_slice(&abi_encode_address(item));
    }
    out
}

// ── Factory / pair ─────────────────────────────────────────────────────────

/// factory.getPair(tokenA, tokenB) → address
pub(crate) fn encode_get_pair(token_a: &[u8; 20], token_b: &[u8; 20]) -> Vec<u8> {
    let mut data = function_selector(SIG_GET_PAIR).to_vec();
    data.extend_from_slice(&abi_encode_address(token_a));
    data.extend_from_slice(&abi_encode_address(token_b));
    data
}

/// pair.getReserves() → (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
pub(crate) fn encode_get_reserves() -> Vec<u8> {
    function_selector(SIG_GET_RESERVES).to_vec()
}

/// pair.token0() → address
pub(crate) fn encode_token0() -> Vec<u8> {
    function_selector(SIG_TOKEN0).to_vec()
}

// ── Router ─────────────────────────────────────────────────────────────────

/// router.getAmountsOut(uint256 amountIn, address[] path) → uint256[]
pub(crate) fn encode_get_amounts_out(amount_in: U256, path: &[[u8; 20]]) -> Vec<u8> {
    let mut data = function_selector(SIG_GET_AMOUNTS_OUT).to_vec();
    data.extend_from_slice(&abi_encode_uint256(amount_in));
    data.extend_from_slice(&abi_encode_usize(2 * 32)); // offset to path
    data.extend_from_slice(&abi_encode_address_array(path));
    data
}

/// router.swapExactETHForTokens(amountOutMin, path, to, deadline), payable
pub(crate) fn encode_swap_exact_eth_for_tokens(
    amount_out_min: U256,
    path: &[[u8; 20]],
    to: &[u8; 20],
    deadline: u64,
) -> Vec<u8> {
    let mut data = function_selector(SIG_SWAP_EXACT_ETH_FOR_TOKENS).to_vec();
    data.extend_from_slice(&abi_encode_uint256(amount_out_min));
    data.extend_from_slice(&abi_encode_usize(4 * 32)); // offset to path
    data.extend_from_slice(&abi_encode_address(to));
    data.extend_from_slice(&abi_encode_uint256(U256::from(deadline)));
    data.extend_from_slice(&abi_encode_address_array(path));
    data
}

/// router.swapExactTokensForETH(amountIn, amountOutMin, path, to, deadline)
pub(crate) fn encode_swap_exact_tokens_for_eth(
    amount_in: U256,
    amount_out_min: U256,
    path: &[[u8; 20]],
    to: &[u8; 20],
    deadline: u64,
) -> Vec<u8> {
    let mut data = function_selector(SIG_SWAP_EXACT_TOKENS_FOR_ETH).to_vec();
    data.extend_from_slice(&abi_encode_uint256(amount_in));
    data.extend_from_slice(&abi_encode_uint256(amount_out_min));
    data.extend_from_slice(&abi_encode_usize(5 * 32)); // offset to path
    data.extend_from_slice(&abi_encode_address(to));
    data.extend_from_slice(&abi_encode_uint256(U256::from(deadline)));
    data.extend_from_slice(&abi_encode_address_array(path));
    data
}

// ── ERC-20 ─────────────────────────────────────────────────────────────────

pub(crate) fn encode_balance_of(address: &[u8; 20]) -> Vec<u8> {
    let mut data = function_selector(SIG_BALANCE_OF).to_vec();
    data.extend_from_slice(&abi_encode_address(address));
    data
}

pub(crate) fn encode_approve(spender: &[u8; 20], amount: U256) -> Vec<u8> {
    let mut data = function_selector(SIG_APPROVE).to_vec();
    data.extend_from_slice(&abi_encode_address(spender));
    data.extend_from_slice(&abi_encode_uint256(amount));
    data
}

pub(crate) fn encode_allowance(owner: &[u8; 20], spender: &[u8; 20]) -> Vec<u8> {
    let mut data = function_selector(SIG_ALLOWANCE).to_vec();
    data.extend_from_slice(&abi_encode_address(owner));
    data.extend_from_slice(&abi_encode_address(spender));
    data
}

pub(crate) fn encode_symbol() -> Vec<u8> {
    function_selector(SIG_SYMBOL).to_vec()
}

pub(crate) fn encode_decimals() -> Vec<u8> {
    function_selector(SIG_DECIMALS).to_vec()
}

// ── Decoding ───────────────────────────────────────────────────────────────

fn too_short(bytes: &[u8], index: usize) -> EngineError {
    EngineError::decode(format!("Return data too short: {} bytes, need word {}", bytes.len(), index))
}

fn word(bytes: &[u8], index: usize) -> EngineResult<U256> {
    let start = index.checked_mul(32).ok_or_else(|| too_short(bytes, index))?;
    let end = start.checked_add(32).ok_or_else(|| too_short(bytes, index))?;
    let slice = bytes.get(start..end).ok_or_else(|| too_short(bytes, index))?;
    Ok(U256::from_be_slice(slice))
}

fn word_as_usize(bytes: &[u8], index: usize) -> EngineResult<usize> {
    let val = word(bytes, index)?;
    usize::try_from(val).map_err(|_| EngineError::decode(format!("Offset out of range: {}", val)))
}

/// Decode a single uint256 return value
pub(crate) fn decode_uint256(hex_data: &str) -> EngineResult<U256> {
    let bytes = hex_decode(hex_data)?;
    word(&bytes, 0)
}

/// Decode a single address return value
pub(crate) fn decode_address(hex_data: &str) -> EngineResult<[u8; 20]> {
    let bytes = hex_decode(hex_data)?;
    if bytes.len() < 32 {
        return Err(EngineError::decode(format!("Address return too short: {} bytes", bytes.len())));
    }
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes[12..32]);
    Ok(addr)
}

/// Decode getReserves() → (reserve0, reserve1); the timestamp word is ignored
pub(crate) fn decode_reserves(hex_data: &str) -> EngineResult<(U256, U256)> {
    let bytes = hex_decode(hex_data)?;
    Ok((word(&bytes, 0)?, word(&bytes, 1)?))
}

/// Decode a `uint256[]` return value (offset, length, items)
pub(crate) fn decode_uint256_array(hex_data: &str) -> EngineResult<Vec<U256>> {
    let bytes = hex_decode(hex_data)?;
    let offset = word_as_usize(&bytes, 0)?;
    if offset % 32 != 0 {
        return Err(EngineError::decode(format!("Unaligned array offset: {}", offset)));
    }
    let len_index = offset / 32;
    let len = word_as_usize(&bytes, len_index)?;
    let available = (bytes.len() / 32).saturating_sub(len_index + 1);
    if len > available {
        return Err(EngineError::decode(format!("Array of {} items exceeds return data", len)));
    }
    (0..len).map(|i| word(&bytes, len_index + 1 + i)).collect()
}

/// Decode decimals() → u8
pub(crate) fn decode_uint8(hex_data: &str) -> EngineResult<u8> {
    let val = decode_uint256(hex_data)?;
    u8::try_from(val).map_err(|_| EngineError::decode(format!("Value does not fit in uint8: {}", val)))
}

/// Decode an ABI-encoded string (dynamic type at offset 0).
/// Falls back to bytes32 for old tokens that return a fixed-size symbol.
pub(crate) fn decode_abi_string(hex_data: &str) -> EngineResult<String> {
    let bytes = hex_decode(hex_data)?;
    if bytes.len() < 64 {
        let trimmed: Vec<u8> = bytes.iter().copied().filter(|&b| b != 0).collect();
        return String::from_utf8(trimmed).map_err(|_| EngineError::decode("Cannot decode string"));
    }
    let offset = word_as_usize(&bytes, 0)?;

    let data_start = match offset.checked_add(32) {
        Some(end) if end <= bytes.len() => end,
        _ => {
            let trimmed: Vec<u8> = bytes[..32].iter().copied().filter(|&b| b != 0).collect();
            return String::from_utf8(trimmed).map_err(|_| EngineError::decode("Cannot decode string"));
        }
    };

    let len = usize::try_from(U256::from_be_slice(&bytes[offset..data_start]))
        .map_err(|_| EngineError::decode("String length out of range"))?;

    let data = data_start
        .checked_add(len)
        .and_then(|end| bytes.get(data_start..end))
        .ok_or_else(|| EngineError::decode("String data exceeds response"))?;

    String::from_utf8(data.to_vec()).map_err(|_| EngineError::decode("Invalid UTF-8 in string"))
}

// ── Event logs ─────────────────────────────────────────────────────────────

/// Address held in the low 20 bytes of an indexed topic
fn topic_address(topic: &str) -> Option<[u8; 20]> {
    let bytes = hex_decode(topic).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes[12..]);
    Some(addr)
}

/// Total of the ERC-20 `Transfer` events that `token` emitted to `recipient`
/// in a receipt, or `None` when the receipt has no such log.
pub(crate) fn transferred_to(receipt: &serde_json::Value, token: &[u8; 20], recipient: &[u8; 20]) -> Option<U256> {
    let transfer_topic = keccak256(SIG_TRANSFER_EVENT.as_bytes());
    let logs = receipt.get("logs")?.as_array()?;
    logs.iter()
        .filter_map(|entry| {
            let emitter = hex_decode(entry["address"].as_str()?).ok()?;
            let topics = entry["topics"].as_array()?;
            if emitter.as_slice() != token.as_slice() || topics.len() < 3 {
                return None;
            }
            if hex_decode(topics[0].as_str()?).ok()?.as_slice() != transfer_topic.as_slice() {
                return None;
            }
            if topic_address(topics[2].as_str()?)? != *recipient {
                return None;
            }
            decode_uint256(entry["data"].as_str()?).ok()
        })
        .fold(None, |total: Option<U256>, amount| Some(total.unwrap_or(U256::ZERO).saturating_add(amount)))
}
