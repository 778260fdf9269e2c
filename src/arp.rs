use std::{net::Ipv4Addr, time::Duration};

use pnet::{
    packet::{
        arp::{Arp, ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket},
        ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket},
        FromPacket, Packet,
    },
    util::MacAddr,
};

use crate::{
    capture::Record,
    constants::{ARP_LISTEN_TIMEOUT, ARP_PACK_LEN, ETH_PACK_LEN, IP_V4_LEN, MAC_ADDR_LEN},
    error::{Error, Result},
    probe::{Classification, Deadlines, ProbeRequest, ProbeStrategy, ResponderIdentity},
};

/// ARP sweep: broadcast "who-has" requests and count the replies.
///
/// Requests carry the local hardware and protocol address as sender and a zero
/// target hardware address. Replies sent from the local hardware address are
/// reported as [`Classification::SelfReply`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ArpStrategy {
    sender_mac: MacAddr,
    sender_ip: Ipv4Addr,
    deadlines: Deadlines,
}

impl ArpStrategy {
    pub fn new(sender_mac: MacAddr, sender_ip: Ipv4Addr) -> Self {
        Self {
            sender_mac,
            sender_ip,
            deadlines: Deadlines::from_open(ARP_LISTEN_TIMEOUT),
        }
    }

    /// Overrides how long replies are counted after the handle is opened.
    pub fn with_listen_timeout(mut self, timeout: Duration) -> Self {
        self.deadlines = Deadlines::from_open(timeout);
        self
    }

    pub fn sender_mac(&self) -> MacAddr {
        self.sender_mac
    }

    fn fill_packet_buf(&self, eth_buf: &mut [u8], target_ip: Ipv4Addr) -> Result<()> {
        let mut eth_packet = MutableEthernetPacket::new(eth_buf)
            .ok_or_else(|| Error::Encode("buffer too small for Ethernet frame".into()))?;
        eth_packet.set_destination(MacAddr::broadcast());
        eth_packet.set_source(self.sender_mac);
        eth_packet.set_ethertype(EtherTypes::Arp);

        let mut arp_buf = [0; ARP_PACK_LEN];
        let mut arp_packet = MutableArpPacket::new(&mut arp_buf)
            .ok_or_else(|| Error::Encode("buffer too small for ARP packet".into()))?;
        arp_packet.set_hardware_type(ArpHardwareTypes::Ethernet);
        arp_packet.set_protocol_type(EtherTypes::Ipv4);
        arp_packet.set_hw_addr_len(MAC_ADDR_LEN);
        arp_packet.set_proto_addr_len(IP_V4_LEN);
        arp_packet.set_operation(ArpOperations::Request);
        arp_packet.set_sender_hw_addr(self.sender_mac);
        arp_packet.set_sender_proto_addr(self.sender_ip);
        arp_packet.set_target_hw_addr(MacAddr::zero());
        arp_packet.set_target_proto_addr(target_ip);

        eth_packet.set_payload(arp_packet.packet());
        Ok(())
    }
}

impl ProbeStrategy for ArpStrategy {
    fn encode(&self, target: Ipv4Addr) -> Result<ProbeRequest> {
        let mut eth_buf = vec![0; ETH_PACK_LEN];
        self.fill_packet_buf(&mut eth_buf, target)?;
        Ok(ProbeRequest::new(target, eth_buf))
    }

    fn classify(&self, record: &Record) -> Classification {
        let Some(arp) = parse_arp_packet(&record.data) else {
            return Classification::NotRelevant;
        };
        if arp.operation != ArpOperations::Reply {
            return Classification::NotRelevant;
        }
        if arp.sender_hw_addr == self.sender_mac {
            return Classification::SelfReply;
        }
        Classification::Reply(ResponderIdentity::Link {
            mac: arp.sender_hw_addr,
            ip: arp.sender_proto_addr,
        })
    }

    fn deadlines(&self) -> Deadlines {
        self.deadlines
    }
}

pub(crate) fn parse_arp_packet(bytes: &[u8]) -> Option<Arp> {
    let ethernet_packet = EthernetPacket::new(bytes)?;
    if ethernet_packet.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    Some(ArpPacket::new(ethernet_packet.payload())?.from_packet())
}
