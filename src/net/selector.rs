//! Address selection on a matched link.
//!
//! Once route matching has picked a link, selection extracts the link's
//! advertisable addresses: at most one per family, chosen by configuration
//! order among the addresses passing the caller's validity predicate, with
//! the preferred family first.

use std::net::IpAddr;

use thiserror::Error;

use super::filter::AddressFilter;
use super::table::{AddressTable, IpFamily};

/// A matched link held no address passing the validity filter.
///
/// This is a hard failure for the resolution call; the core never silently
/// substitutes another link.
#[derive(Debug, Error)]
#[error("No valid address on {link}")]
pub struct NoValidAddress {
    /// Human-readable identity of the offending link.
    pub link: String,
}

/// Extracts the advertisable addresses of the link at `link_index`.
///
/// Addresses failing `filter` are dropped. Among the survivors, the first
/// address of each family (in the table's configuration order) is kept, and
/// the `preferred` family is emitted before the other. With no preference,
/// IPv4 precedes IPv6.
///
/// # Errors
///
/// Returns [`NoValidAddress`] if the link is absent from the table or every
/// address on it fails the filter.
pub fn select_addresses(
    link_index: u32,
    table: &AddressTable,
    filter: &dyn AddressFilter,
    preferred: Option<IpFamily>,
) -> Result<Vec<IpAddr>, NoValidAddress> {
    let Some((link, addresses)) = table.for_index(link_index) else {
        return Err(NoValidAddress {
            link: format!("link index {link_index}"),
        });
    };

    let preferred = preferred.unwrap_or(IpFamily::V4);
    let mut first_preferred: Option<IpAddr> = None;
    let mut first_other: Option<IpAddr> = None;

    for address in addresses.iter().filter(|a| filter.permits(a)) {
        let slot = if address.family() == preferred {
            &mut first_preferred
        } else {
            &mut first_other
        };
        if slot.is_none() {
            *slot = Some(address.ip);
        }
    }

    let selected: Vec<IpAddr> = first_preferred.into_iter().chain(first_other).collect();
    if selected.is_empty() {
        return Err(NoValidAddress {
            link: link.to_string(),
        });
    }
    Ok(selected)
}
