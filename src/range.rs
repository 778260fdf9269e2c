use std::{iter::FusedIterator, net::Ipv4Addr};

use ipnet::Ipv4Net;

use crate::error::{Error, Result};

/// An IPv4 subnet described by any address inside it and a contiguous mask.
///
/// The range is immutable once built. Its host addresses, everything strictly
/// between the network and broadcast address, are produced by [`NetworkRange::hosts`].
///
/// # Example
/// ```
/// use async_census::range::NetworkRange;
/// use std::net::Ipv4Addr;
///
/// let range = NetworkRange::new(Ipv4Addr::new(192, 168, 1, 17), 24).unwrap();
/// let hosts: Vec<_> = range.hosts().collect();
/// assert_eq!(hosts.len(), 254);
/// assert_eq!(hosts[0], Ipv4Addr::new(192, 168, 1, 1));
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NetworkRange {
    base: u32,
    mask: u32,
}

impl NetworkRange {
    /// Creates a range from an address and a prefix length (`/24` is `24`).
    ///
    /// # Errors
    /// Returns [`Error::InvalidPrefix`] if `prefix_len` is larger than 32.
    pub fn new(base: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        if prefix_len > 32 {
            return Err(Error::InvalidPrefix(prefix_len));
        }
        let mask = u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0);
        Ok(Self {
            base: base.into(),
            mask,
        })
    }

    /// Creates a range from an address and a dotted subnet mask.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMask`] if the one-bits of `mask` are not contiguous
    /// from the most significant bit.
    pub fn with_mask(base: Ipv4Addr, mask: Ipv4Addr) -> Result<Self> {
        let mask = u32::from(mask);
        if mask.leading_ones() + mask.trailing_zeros() != 32 {
            return Err(Error::InvalidMask(mask));
        }
        Ok(Self {
            base: base.into(),
            mask,
        })
    }

    pub fn base(&self) -> Ipv4Addr {
        self.base.into()
    }

    pub fn mask(&self) -> Ipv4Addr {
        self.mask.into()
    }

    pub fn prefix_len(&self) -> u8 {
        self.mask.leading_ones() as u8
    }

    pub fn network(&self) -> Ipv4Addr {
        (self.base & self.mask).into()
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        (self.base & self.mask | !self.mask).into()
    }

    /// Returns the host addresses of the range in ascending order.
    ///
    /// Network and broadcast addresses are excluded, so `/31` and `/32`
    /// ranges yield nothing.
    pub fn hosts(&self) -> Hosts {
        let network = self.base & self.mask;
        let broadcast = network | !self.mask;
        let next = network.saturating_add(1);
        Hosts {
            next,
            end: broadcast.max(next),
        }
    }
}

impl From<Ipv4Net> for NetworkRange {
    fn from(net: Ipv4Net) -> Self {
        Self {
            base: net.addr().into(),
            mask: net.netmask().into(),
        }
    }
}

impl std::fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix_len())
    }
}

/// Iterator over the host addresses of a [`NetworkRange`].
#[derive(Clone, Debug)]
pub struct Hosts {
    next: u32,
    // exclusive, the broadcast address
    end: u32,
}

impl Iterator for Hosts {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let addr = self.next;
        self.next += 1;
        Some(addr.into())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.end - self.next) as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Hosts {}

impl FusedIterator for Hosts {}
