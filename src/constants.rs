use std::time::Duration;

pub(crate) const MAC_ADDR_LEN: u8 = 6;
pub(crate) const IP_V4_LEN: u8 = 4;

pub(crate) const ARP_PACK_LEN: usize = 28;
pub(crate) const ETH_HDR_LEN: usize = 14;
pub(crate) const ETH_PACK_LEN: usize = ETH_HDR_LEN + ARP_PACK_LEN;

pub(crate) const ICMP_ECHO_LEN: usize = 8;

/// Largest untagged Ethernet frame the link capture reads at once.
pub(crate) const MAX_FRAME_LEN: usize = 1518;
pub(crate) const MAX_DATAGRAM_LEN: usize = 1500;

pub(crate) const ARP_LISTEN_TIMEOUT: Duration = Duration::from_secs(2);
pub(crate) const ECHO_LISTEN_TIMEOUT: Duration = Duration::from_secs(1);
pub(crate) const ECHO_HANDLE_TIMEOUT: Duration = Duration::from_secs(2);
