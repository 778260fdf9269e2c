use std::io;

use afpacket::tokio::RawPacketStream;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{Capture, Receive, Record, Transmit};
use crate::{constants::MAX_FRAME_LEN, probe::ProbeRequest};

/// Ethernet capture on a single interface, backed by an `AF_PACKET` socket.
///
/// # Example
/// ```no_run
/// use async_census::{arp::ArpStrategy, capture::LinkCapture, census::Census, range::NetworkRange};
/// use pnet::util::MacAddr;
/// use std::net::Ipv4Addr;
///
/// tokio_test::block_on(async {
///     let local_ip = Ipv4Addr::new(192, 168, 1, 10);
///     let strategy = ArpStrategy::new(MacAddr::new(0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E), local_ip);
///     let range = NetworkRange::new(local_ip, 24).unwrap();
///     let result = Census::new(strategy)
///         .discover(&LinkCapture::new("eth0"), &range)
///         .await
///         .unwrap();
///     println!("connected hosts: {}", result.count);
/// })
/// ```
#[derive(Debug, Clone)]
pub struct LinkCapture {
    interface_name: String,
}

impl LinkCapture {
    pub fn new(interface_name: &str) -> Self {
        Self {
            interface_name: interface_name.into(),
        }
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }
}

impl Capture for LinkCapture {
    type Sender = LinkSender;
    type Receiver = LinkReceiver;

    // Even though nothing is awaited here, a tokio runtime must be running since
    // the stream registers itself with the reactor.
    fn open(&self) -> io::Result<(LinkSender, LinkReceiver)> {
        let mut stream = RawPacketStream::new()?;
        stream.bind(&self.interface_name)?;
        log::debug!("bound packet stream to {}", self.interface_name);
        Ok((
            LinkSender {
                stream: stream.clone(),
            },
            LinkReceiver {
                stream,
                buf: vec![0; MAX_FRAME_LEN],
            },
        ))
    }
}

#[derive(Debug)]
pub struct LinkSender {
    stream: RawPacketStream,
}

impl Transmit for LinkSender {
    async fn transmit(&mut self, probe: &ProbeRequest) -> io::Result<()> {
        self.stream.write_all(&probe.bytes).await
    }
}

#[derive(Debug)]
pub struct LinkReceiver {
    stream: RawPacketStream,
    buf: Vec<u8>,
}

impl Receive for LinkReceiver {
    async fn receive(&mut self) -> io::Result<Record> {
        let read_bytes = self.stream.read(&mut self.buf).await?;
        if read_bytes == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "packet stream closed",
            ));
        }
        Ok(Record::frame(&self.buf[..read_bytes]))
    }
}

#[cfg(test)]
mod tests {
    use super::LinkCapture;
    use crate::capture::Capture;

    // Even though no async functions called directly, tokio runtime must be running to rely on AsyncFd (which is used by dependency)
    #[tokio::test]
    async fn test_invalid_interface() {
        const INTERFACE_NAME: &str = "invalid_dummy";
        assert!(LinkCapture::new(INTERFACE_NAME).open().is_err());
    }
}
