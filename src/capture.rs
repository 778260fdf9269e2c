//! The packet I/O a census runs over.
//!
//! A [`Capture`] opens one handle and splits it into a write half used by the
//! transmitting task and a read half owned by the listener. Both halves must be
//! usable at the same time without extra locking.

use std::{future::Future, io, net::Ipv4Addr};

use crate::probe::ProbeRequest;

pub mod icmp;
pub mod link;

pub use icmp::IcmpCapture;
pub use link::LinkCapture;

/// One raw inbound record as delivered by a capture handle.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Record {
    /// Full Ethernet frame for link captures, the ICMP message for network captures.
    pub data: Vec<u8>,
    /// Sender address when the transport reports it.
    pub source: Option<Ipv4Addr>,
}

impl Record {
    pub fn frame(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            source: None,
        }
    }

    pub fn datagram(data: impl Into<Vec<u8>>, source: Ipv4Addr) -> Self {
        Self {
            data: data.into(),
            source: Some(source),
        }
    }
}

pub trait Capture {
    type Sender: Transmit + Send;
    type Receiver: Receive + Send + 'static;

    /// Acquires the underlying handle.
    fn open(&self) -> io::Result<(Self::Sender, Self::Receiver)>;
}

pub trait Transmit {
    fn transmit(&mut self, probe: &ProbeRequest) -> impl Future<Output = io::Result<()>> + Send;
}

pub trait Receive {
    /// Waits for the next inbound record.
    fn receive(&mut self) -> impl Future<Output = io::Result<Record>> + Send;
}
