use std::{io, net::IpAddr, thread, time::Duration};

use pnet::{
    packet::{icmp::IcmpPacket, ip::IpNextHeaderProtocols, Packet},
    transport::{
        self, TransportChannelType::Layer4, TransportProtocol::Ipv4, TransportReceiver,
        TransportSender,
    },
};
use tokio::sync::mpsc;

use super::{Capture, Receive, Record, Transmit};
use crate::{constants::MAX_DATAGRAM_LEN, probe::ProbeRequest};

const RECORD_QUEUE_LEN: usize = 256;

/// ICMP capture over a raw IPv4 socket bound to every local address.
///
/// Reads on the pnet transport channel block, so the read half is served by a
/// dedicated thread which hands records over to the async side. The thread
/// stops within one poll interval after the read half is dropped.
#[derive(Debug, Clone)]
pub struct IcmpCapture {
    buffer_size: usize,
    poll_interval: Duration,
}

impl Default for IcmpCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl IcmpCapture {
    pub fn new() -> Self {
        Self {
            buffer_size: 4 * MAX_DATAGRAM_LEN,
            poll_interval: Duration::from_millis(100),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Capture for IcmpCapture {
    type Sender = IcmpSender;
    type Receiver = IcmpReceiver;

    fn open(&self) -> io::Result<(IcmpSender, IcmpReceiver)> {
        let (tx, rx) = transport::transport_channel(
            self.buffer_size,
            Layer4(Ipv4(IpNextHeaderProtocols::Icmp)),
        )?;
        let (records_tx, records_rx) = mpsc::channel(RECORD_QUEUE_LEN);
        let poll_interval = self.poll_interval;
        thread::Builder::new()
            .name("icmp-capture".into())
            .spawn(move || drain(rx, records_tx, poll_interval))?;
        log::debug!("opened raw ICMP socket");
        Ok((
            IcmpSender { tx },
            IcmpReceiver {
                records: records_rx,
            },
        ))
    }
}

fn drain(
    mut rx: TransportReceiver,
    records: mpsc::Sender<io::Result<Record>>,
    poll_interval: Duration,
) {
    let mut packets = transport::icmp_packet_iter(&mut rx);
    while !records.is_closed() {
        let record = match packets.next_with_timeout(poll_interval) {
            Ok(Some((packet, IpAddr::V4(source)))) => Ok(Record::datagram(packet.packet(), source)),
            Ok(_) => continue,
            Err(err) => Err(err),
        };
        let failed = record.is_err();
        if records.blocking_send(record).is_err() || failed {
            break;
        }
    }
    log::trace!("icmp capture thread finished");
}

pub struct IcmpSender {
    tx: TransportSender,
}

impl Transmit for IcmpSender {
    async fn transmit(&mut self, probe: &ProbeRequest) -> io::Result<()> {
        let packet = IcmpPacket::new(&probe.bytes).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "probe is shorter than an ICMP header",
            )
        })?;
        self.tx.send_to(packet, IpAddr::V4(probe.target))?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct IcmpReceiver {
    records: mpsc::Receiver<io::Result<Record>>,
}

impl Receive for IcmpReceiver {
    async fn receive(&mut self) -> io::Result<Record> {
        match self.records.recv().await {
            Some(record) => record,
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "icmp capture thread stopped",
            )),
        }
    }
}

