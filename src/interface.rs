use std::net::Ipv4Addr;

use pnet::{
    datalink::{self, NetworkInterface},
    ipnetwork::IpNetwork,
    util::MacAddr,
};

use crate::{
    error::{Error, Result},
    range::NetworkRange,
};

/// Shortest prefix that is still swept; wider networks are skipped.
pub const MIN_PREFIX_LEN: u8 = 16;

/// Addressing of a local interface that can run an ARP census.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LocalIdentity {
    pub name: String,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
    pub prefix_len: u8,
}

impl LocalIdentity {
    /// Picks the first IPv4 network of `interface`.
    ///
    /// # Errors
    /// Returns [`Error::UnusableInterface`] for loopback interfaces, interfaces
    /// without a hardware or IPv4 address and networks wider than
    /// [`MIN_PREFIX_LEN`].
    pub fn check(interface: &NetworkInterface) -> Result<Self> {
        let unusable = |reason: &str| Error::UnusableInterface {
            name: interface.name.clone(),
            reason: reason.into(),
        };
        if interface.is_loopback() {
            return Err(unusable("loopback interface"));
        }
        let mac = interface
            .mac
            .ok_or_else(|| unusable("no hardware address"))?;
        let (ip, prefix_len) = interface
            .ips
            .iter()
            .find_map(|net| match net {
                IpNetwork::V4(net) => Some((net.ip(), net.prefix())),
                IpNetwork::V6(_) => None,
            })
            .ok_or_else(|| unusable("no IPv4 address"))?;
        if ip.is_loopback() {
            return Err(unusable("loopback address"));
        }
        if prefix_len < MIN_PREFIX_LEN {
            return Err(unusable("network wider than /16"));
        }
        Ok(Self {
            name: interface.name.clone(),
            mac,
            ip,
            prefix_len,
        })
    }

    /// The subnet this interface sits on.
    pub fn range(&self) -> Result<NetworkRange> {
        NetworkRange::new(self.ip, self.prefix_len)
    }
}

/// Every interface of the host that passes [`LocalIdentity::check`].
pub fn usable_interfaces() -> Vec<LocalIdentity> {
    datalink::interfaces()
        .iter()
        .filter_map(|interface| match LocalIdentity::check(interface) {
            Ok(identity) => Some(identity),
            Err(err) => {
                log::debug!("{}", err);
                None
            }
        })
        .collect()
}

/// Looks up a single interface by name.
///
/// # Errors
/// Returns [`Error::UnusableInterface`] if no interface is called `name` or it
/// fails [`LocalIdentity::check`].
pub fn interface_from(name: &str) -> Result<LocalIdentity> {
    let interface = datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| Error::UnusableInterface {
            name: name.into(),
            reason: "interface not found".into(),
        })?;
    LocalIdentity::check(&interface)
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use pnet::{
        datalink::NetworkInterface,
        ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network},
        util::MacAddr,
    };

    use super::{interface_from, LocalIdentity};
    use crate::error::Error;

    fn interface(mac: Option<MacAddr>, ips: Vec<IpNetwork>) -> NetworkInterface {
        NetworkInterface {
            name: "eth0".into(),
            description: String::new(),
            index: 2,
            mac,
            ips,
            flags: 0,
        }
    }

    fn v4(ip: Ipv4Addr, prefix: u8) -> IpNetwork {
        IpNetwork::V4(Ipv4Network::new(ip, prefix).unwrap())
    }

    fn reason(result: Result<LocalIdentity, Error>) -> String {
        match result {
            Err(Error::UnusableInterface { reason, .. }) => reason,
            other => panic!("expected unusable interface, got {:?}", other),
        }
    }

    #[test]
    fn test_first_ipv4_network_is_used() {
        let mac = MacAddr::new(0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e);
        let iface = interface(
            Some(mac),
            vec![
                IpNetwork::V6(Ipv6Network::new(Ipv6Addr::LOCALHOST, 128).unwrap()),
                v4(Ipv4Addr::new(192, 168, 1, 17), 24),
                v4(Ipv4Addr::new(10, 0, 0, 1), 8),
            ],
        );
        let identity = LocalIdentity::check(&iface).unwrap();
        assert_eq!(identity.mac, mac);
        assert_eq!(identity.ip, Ipv4Addr::new(192, 168, 1, 17));
        assert_eq!(identity.prefix_len, 24);
        assert_eq!(
            identity.range().unwrap().network(),
            Ipv4Addr::new(192, 168, 1, 0)
        );
    }

    #[test]
    fn test_unusable_interfaces() {
        let mac = Some(MacAddr::new(0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e));
        assert_eq!(
            reason(LocalIdentity::check(&interface(
                None,
                vec![v4(Ipv4Addr::new(192, 168, 1, 17), 24)]
            ))),
            "no hardware address"
        );
        assert_eq!(
            reason(LocalIdentity::check(&interface(mac, vec![]))),
            "no IPv4 address"
        );
        assert_eq!(
            reason(LocalIdentity::check(&interface(
                mac,
                vec![v4(Ipv4Addr::new(127, 0, 0, 1), 24)]
            ))),
            "loopback address"
        );
        assert_eq!(
            reason(LocalIdentity::check(&interface(
                mac,
                vec![v4(Ipv4Addr::new(10, 0, 0, 1), 8)]
            ))),
            "network wider than /16"
        );
    }

    #[test]
    fn test_missing_interface() {
        assert_eq!(reason(interface_from("invalid_dummy")), "interface not found");
    }
}
