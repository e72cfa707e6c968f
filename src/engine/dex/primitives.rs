// Paw Agent Engine — DEX Ethereum Primitives
// Core hex, keccak, address, and amount conversion utilities.

use alloy_primitives::U256;

/// Keccak-256 hash (Ethereum's hash function)
pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    use tiny_keccak::{Hasher, Keccak};
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Hex-encode bytes with 0x prefix
pub(crate) fn hex_encode(data: &[u8]) -> String {
    format!("0x{}", data.iter().map(|b| format!("{:02x}", b)).collect::<String>())
}

/// Hex-decode a 0x-prefixed string
/// Handles Ethereum RPC's minimal hex encoding (e.g. "0x0", "0x1a3")
/// by left-padding to even length.
pub(crate) fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(bad) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(format!("Hex decode: invalid character {:?}", bad));
    }
    let padded;
    let hex_str = if s.len() % 2 != 0 {
        padded = format!("0{}", s);
        &padded
    } else {
        s
    };
    (0..hex_str.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex_str[i..i + 2], 16).map_err(|e| format!("Hex decode: {}", e)))
        .collect()
}

/// Derive the 20-byte Ethereum address from an uncompressed secp256k1 public key
pub(crate) fn address_from_pubkey(pubkey_uncompressed: &[u8]) -> [u8; 20] {
    // Skip the 0x04 marker, hash the 64-byte x||y, keep the last 20 bytes
    let hash = keccak256(&pubkey_uncompressed[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    addr
}

/// EIP-55 mixed-case checksum address
pub(crate) fn eip55_checksum(addr_bytes: &[u8]) -> String {
    let hex_addr: String = addr_bytes.iter().map(|b| format!("{:02x}", b)).collect();
    let hash = keccak256(hex_addr.as_bytes());
    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");
    for (i, c) in hex_addr.chars().enumerate() {
        let hash_nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        if hash_nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }
    checksummed
}

pub(crate) fn format_address(addr: &[u8; 20]) -> String {
    eip55_checksum(addr)
}

/// Parse an address string to 20 bytes
pub(crate) fn parse_address(addr: &str) -> Result<[u8; 20], String> {
    let addr = addr.trim();
    let bytes = hex_decode(addr)?;
    if bytes.len() != 20 {
        return Err(format!("Invalid address length: {} bytes (expected 20). Address: '{}'", bytes.len(), addr));
    }
    let mut arr = [0u8; 20];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// Parse a JSON-RPC quantity ("0x1bc16d674ec80000") into a U256
pub(crate) fn parse_quantity(hex: &str) -> Result<U256, String> {
    let digits = hex.trim().strip_prefix("0x").unwrap_or(hex.trim());
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).map_err(|e| format!("Parse quantity '{}': {}", hex, e))
}

/// Convert a decimal token amount to raw units
/// e.g., "1.5" with 18 decimals → 1500000000000000000
pub(crate) fn parse_units(amount: &str, decimals: u8) -> Result<U256, String> {
    let amount = amount.trim();
    let parts: Vec<&str> = amount.split('.').collect();
    if parts.len() > 2 || amount.is_empty() {
        return Err(format!("Invalid amount format: '{}'", amount));
    }
    let integer_part = if parts[0].is_empty() { "0" } else { parts[0] };
    let decimal_part = if parts.len() == 2 { parts[1] } else { "" };

    if decimal_part.len() > decimals as usize {
        return Err(format!("Too many decimal places (max {} for this token)", decimals));
    }
    if !integer_part.chars().chain(decimal_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid decimal amount: '{}'", amount));
    }

    let padded_decimals = format!("{:0<width$}", decimal_part, width = decimals as usize);
    let raw = format!("{}{}", integer_part, padded_decimals);
    let trimmed = raw.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(trimmed, 10).map_err(|e| format!("Amount out of range: {}", e))
}

/// Convert raw units to a human-readable amount
pub(crate) fn format_units(raw: U256, decimals: u8) -> String {
    let decimal_str = raw.to_string();
    if decimals == 0 {
        return decimal_str;
    }

    let dec = decimals as usize;
    if decimal_str.len() <= dec {
        let padded = format!("{:0>width$}", decimal_str, width = dec + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - dec);
        format!("{}.{}", int_part, frac_part.trim_end_matches('0')).trim_end_matches('.').to_string()
    } else {
        let (int_part, frac_part) = decimal_str.split_at(decimal_str.len() - dec);
        let trimmed_frac = frac_part.trim_end_matches('0');
        if trimmed_frac.is_empty() {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, trimmed_frac)
        }
    }
}

/// Display-only float view of a raw amount. Never feed the result back
/// into a transaction.
pub(crate) fn units_to_f64(raw: U256, decimals: u8) -> f64 {
    format_units(raw, decimals).parse().unwrap_or(0.0)
}

/// floor(value × numer / denom) without overflowing the intermediate product.
///
/// Splits value = a·denom + b so the result is a·numer + floor(b·numer / denom),
/// where b·numer always fits in 128 bits.
pub(crate) fn mul_frac_floor(value: U256, numer: u64, denom: u64) -> U256 {
    debug_assert!(denom > 0);
    let n = U256::from(numer);
    let d = U256::from(denom);
    let whole = value / d;
    let rem = value % d;
    whole.saturating_mul(n).saturating_add(rem * n / d)
}
