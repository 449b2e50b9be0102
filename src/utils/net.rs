//! IPv4 network address arithmetic

use crate::error::{MachinaError, Result};
use regex::Regex;
use std::{net::Ipv4Addr, sync::LazyLock};

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("valid dotted-quad regex")
});

/// Parse a dotted-quad string into its four octets.
///
/// Each octet must be a decimal number in `0..=255`; anything else is
/// reported as [`MachinaError::InvalidFormat`].
pub fn parse_octets(text: &str) -> Result<[u8; 4]> {
    let caps = DOTTED_QUAD
        .captures(text.trim())
        .ok_or_else(|| MachinaError::invalid_format(text))?;

    let mut octets = [0u8; 4];
    for (i, octet) in octets.iter_mut().enumerate() {
        *octet = caps
            .get(i + 1)
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .ok_or_else(|| MachinaError::invalid_format(text))?;
    }
    Ok(octets)
}

/// Compute the network address of `ip` under `mask`.
///
/// ```
/// use machina::utils::net::network_address;
///
/// assert_eq!(network_address("192.168.2.234", "255.255.255.0")?, "192.168.2.0");
/// # Ok::<(), machina::error::MachinaError>(())
/// ```
pub fn network_address(ip: &str, mask: &str) -> Result<String> {
    let ip = parse_octets(ip)?;
    let mask = parse_octets(mask)?;

    let source = u32::from(Ipv4Addr::from(ip));
    let mask = u32::from(Ipv4Addr::from(mask));
    Ok(Ipv4Addr::from(source & mask).to_string())
}
