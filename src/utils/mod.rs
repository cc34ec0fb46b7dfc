use anyhow::{anyhow, Context, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Parse a CIDR string into its address and prefix length.
/// A bare address is accepted as a host prefix (/32 or /128).
pub fn parse_cidr(cidr: &str) -> Result<(IpAddr, u8)> {
    let (addr, len) = match cidr.split_once('/') {
        Some((addr, len)) => (addr, Some(len)),
        None => (cidr, None),
    };

    let addr: IpAddr = addr
        .parse()
        .with_context(|| format!("Invalid CIDR {}: bad address", cidr))?;
    let max_len = max_prefix_len(&addr);

    let len = match len {
        Some(len) if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) => {
            return Err(anyhow!("Invalid CIDR {}: bad prefix length", cidr));
        }
        Some(len) => len
            .parse::<u8>()
            .with_context(|| format!("Invalid CIDR {}: bad prefix length", cidr))?,
        None => max_len,
    };
    if len > max_len {
        return Err(anyhow!("Invalid CIDR {}: prefix length {} exceeds {}", cidr, len, max_len));
    }

    Ok((addr, len))
}

fn max_prefix_len(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Keep the segments covered by `prefix_len`, mask the partially covered one
/// down to its significant high bits and zero the rest.
fn truncate_segments(segments: &mut [u16], width: u8, prefix_len: u8) {
    let full = (prefix_len / width) as usize;
    let partial = prefix_len % width;
    let all_ones: u16 = if width == 16 { 0xFFFF } else { 0xFF };

    for (i, segment) in segments.iter_mut().enumerate() {
        if i < full {
            continue;
        }
        if i == full && partial > 0 {
            *segment &= (all_ones << (width - partial)) & all_ones;
        } else {
            *segment = 0;
        }
    }
}

/// Network address of `addr` truncated to its significant octets (IPv4) or
/// hextets (IPv6).
pub fn network_address(addr: IpAddr, prefix_len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let mut octets = v4.octets().map(u16::from);
            truncate_segments(&mut octets, 8, prefix_len);
            IpAddr::V4(Ipv4Addr::from(octets.map(|o| o as u8)))
        }
        IpAddr::V6(v6) => {
            let mut hextets = v6.segments();
            truncate_segments(&mut hextets, 16, prefix_len);
            IpAddr::V6(Ipv6Addr::from(hextets))
        }
    }
}

/// Human readable network fragment used in pool names.
/// e.g., "203.0.113.0/22" -> "203.0.112.0/22"
pub fn extract_common_prefix(prefix: &str) -> Result<String> {
    let (addr, len) = parse_cidr(prefix)?;
    Ok(format!("{}/{}", network_address(addr, len), len))
}

/// Build the resource pool name for a site prefix: `role.vrf.site-network/len`.
/// The VRF segment is left out when there is none.
pub fn generate_pool_name(vrf_label: Option<&str>, site_name: &str, prefix: &str, role: &str) -> Result<String> {
    let prefix_common = extract_common_prefix(prefix)?;
    Ok(match vrf_label {
        Some(vrf) if !vrf.is_empty() => format!(
            "{}.{}.{}-{}",
            role,
            vrf.to_lowercase(),
            site_name.to_lowercase(),
            prefix_common
        ),
        _ => format!("{}.{}-{}", role, site_name.to_lowercase(), prefix_common),
    })
}

/// Gateway address for a prefix: the second to last address of the network,
/// keeping the prefix length (e.g., "10.101.1.0/24" -> "10.101.1.254/24").
pub fn gateway_address(prefix: &str) -> Result<String> {
    let (addr, len) = parse_cidr(prefix)?;
    let gateway: IpAddr = match network_address(addr, len) {
        IpAddr::V4(net) => {
            let host_bits = 32 - u32::from(len);
            if host_bits < 1 {
                return Err(anyhow!("Prefix {} is too small to hold a gateway", prefix));
            }
            let last = u32::from(net) | (u32::MAX >> (32 - host_bits));
            IpAddr::V4(Ipv4Addr::from(last - 1))
        }
        IpAddr::V6(net) => {
            let host_bits = 128 - u32::from(len);
            if host_bits < 1 {
                return Err(anyhow!("Prefix {} is too small to hold a gateway", prefix));
            }
            let last = u128::from(net) | (u128::MAX >> (128 - host_bits));
            IpAddr::V6(Ipv6Addr::from(last - 1))
        }
    };
    Ok(format!("{}/{}", gateway, len))
}

/// Capitalize the first letter and lowercase the rest ("VMware" -> "Vmware").
pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
