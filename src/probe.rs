use std::{fmt, net::Ipv4Addr, time::Duration};

use pnet::util::MacAddr;

use crate::{capture::Record, error::Result};

/// One encoded discovery message addressed to a single host.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ProbeRequest {
    pub target: Ipv4Addr,
    pub bytes: Vec<u8>,
}

impl ProbeRequest {
    pub fn new(target: Ipv4Addr, bytes: Vec<u8>) -> Self {
        Self { target, bytes }
    }
}

/// Who answered a probe.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ResponderIdentity {
    /// Hardware address of an ARP reply together with the address it resolves.
    Link { mac: MacAddr, ip: Ipv4Addr },
    /// Source address of an echo reply, when the transport reports one.
    Network(Option<Ipv4Addr>),
}

impl fmt::Display for ResponderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderIdentity::Link { mac, ip } => write!(f, "IP : {}, MAC Addr : {}", ip, mac),
            ResponderIdentity::Network(Some(ip)) => write!(f, "{}", ip),
            ResponderIdentity::Network(None) => write!(f, "<unknown>"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Classification {
    NotRelevant,
    /// A reply sent by the local interface itself.
    SelfReply,
    Reply(ResponderIdentity),
}

/// Moment the listen window starts counting from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeadlineAnchor {
    HandleOpen,
    ListenerStart,
}

/// Timing of one census run.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Deadlines {
    /// How long replies are counted.
    pub listen: Duration,
    pub listen_from: DeadlineAnchor,
    /// Hard limit on the handle, measured from open. Also bounds transmission.
    pub handle: Option<Duration>,
}

impl Deadlines {
    pub fn from_open(listen: Duration) -> Self {
        Self {
            listen,
            listen_from: DeadlineAnchor::HandleOpen,
            handle: None,
        }
    }

    pub fn from_listener_start(listen: Duration, handle: Duration) -> Self {
        Self {
            listen,
            listen_from: DeadlineAnchor::ListenerStart,
            handle: Some(handle),
        }
    }
}

/// A discovery protocol: how probes are encoded and how replies are recognised.
///
/// The census engine is generic over this trait, so one engine serves both the
/// ARP and the ICMP echo sweep.
pub trait ProbeStrategy: Send + Sync + 'static {
    /// Encodes a probe for `target`.
    ///
    /// # Errors
    /// Returns an error if the packet could not be assembled.
    fn encode(&self, target: Ipv4Addr) -> Result<ProbeRequest>;

    /// Decides whether an inbound record is a reply worth counting.
    ///
    /// Malformed or unrelated records must map to [`Classification::NotRelevant`].
    fn classify(&self, record: &Record) -> Classification;

    fn deadlines(&self) -> Deadlines;
}
