use std::{net::Ipv4Addr, time::Duration};

use pnet::packet::icmp::{
    checksum, echo_reply::EchoReplyPacket, echo_request::MutableEchoRequestPacket, IcmpCode,
    IcmpPacket, IcmpTypes, MutableIcmpPacket,
};

use crate::{
    capture::Record,
    constants::{ECHO_HANDLE_TIMEOUT, ECHO_LISTEN_TIMEOUT, ICMP_ECHO_LEN},
    error::{Error, Result},
    probe::{Classification, Deadlines, ProbeRequest, ProbeStrategy, ResponderIdentity},
};

/// ICMP echo sweep.
///
/// Every request carries `identifier` and sequence number 0. Replies are matched
/// on their message type only; the identifier is not checked, so an echo reply
/// to some other pinger on the host is counted too.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct EchoStrategy {
    identifier: u16,
    deadlines: Deadlines,
}

impl EchoStrategy {
    pub fn new(identifier: u16) -> Self {
        Self {
            identifier,
            deadlines: Deadlines::from_listener_start(ECHO_LISTEN_TIMEOUT, ECHO_HANDLE_TIMEOUT),
        }
    }

    pub fn with_timeouts(mut self, listen: Duration, handle: Duration) -> Self {
        self.deadlines = Deadlines::from_listener_start(listen, handle);
        self
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }
}

impl ProbeStrategy for EchoStrategy {
    fn encode(&self, target: Ipv4Addr) -> Result<ProbeRequest> {
        let mut buf = vec![0; ICMP_ECHO_LEN];
        {
            let mut echo = MutableEchoRequestPacket::new(&mut buf)
                .ok_or_else(|| Error::Encode("buffer too small for echo request".into()))?;
            echo.set_icmp_type(IcmpTypes::EchoRequest);
            echo.set_icmp_code(IcmpCode::new(0));
            echo.set_identifier(self.identifier);
            echo.set_sequence_number(0);
        }
        let sum = IcmpPacket::new(&buf)
            .map(|icmp| checksum(&icmp))
            .ok_or_else(|| Error::Encode("buffer too small for ICMP header".into()))?;
        if let Some(mut icmp) = MutableIcmpPacket::new(&mut buf) {
            icmp.set_checksum(sum);
        }

        Ok(ProbeRequest::new(target, buf))
    }

    fn classify(&self, record: &Record) -> Classification {
        let Some(icmp) = IcmpPacket::new(&record.data) else {
            return Classification::NotRelevant;
        };
        if icmp.get_icmp_type() != IcmpTypes::EchoReply {
            return Classification::NotRelevant;
        }
        if EchoReplyPacket::new(&record.data).is_none() {
            return Classification::NotRelevant;
        }
        Classification::Reply(ResponderIdentity::Network(record.source))
    }

    fn deadlines(&self) -> Deadlines {
        self.deadlines
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::net::Ipv4Addr;

    use pnet::packet::icmp::{
        checksum, echo_reply::MutableEchoReplyPacket, echo_request::EchoRequestPacket, IcmpCode,
        IcmpPacket, IcmpTypes, MutableIcmpPacket,
    };

    use super::EchoStrategy;
    use crate::{
        capture::Record,
        probe::{Classification, DeadlineAnchor, ProbeStrategy, ResponderIdentity},
    };

    pub(crate) fn echo_reply(identifier: u16) -> Vec<u8> {
        let mut buf = vec![0; 8];
        {
            let mut reply = MutableEchoReplyPacket::new(&mut buf).unwrap();
            reply.set_icmp_type(IcmpTypes::EchoReply);
            reply.set_icmp_code(IcmpCode::new(0));
            reply.set_identifier(identifier);
        }
        buf
    }

    #[test]
    fn test_encode_request() {
        let strategy = EchoStrategy::new(0x1234);
        let target = Ipv4Addr::new(192, 168, 1, 9);
        let probe = strategy.encode(target).unwrap();
        assert_eq!(probe.target, target);

        let echo = EchoRequestPacket::new(&probe.bytes).unwrap();
        assert_eq!(echo.get_icmp_type(), IcmpTypes::EchoRequest);
        assert_eq!(echo.get_icmp_code(), IcmpCode::new(0));
        assert_eq!(echo.get_identifier(), 0x1234);
        assert_eq!(echo.get_sequence_number(), 0);

        let icmp = IcmpPacket::new(&probe.bytes).unwrap();
        assert_ne!(icmp.get_checksum(), 0);
        assert_eq!(checksum(&icmp), icmp.get_checksum());
    }

    #[test]
    fn test_default_deadlines() {
        let deadlines = EchoStrategy::new(1).deadlines();
        assert_eq!(deadlines.listen_from, DeadlineAnchor::ListenerStart);
        assert_eq!(deadlines.listen.as_secs(), 1);
        assert_eq!(deadlines.handle.map(|handle| handle.as_secs()), Some(2));
    }

    #[test]
    fn test_classify_echo_reply() {
        let strategy = EchoStrategy::new(7);
        let source = Ipv4Addr::new(192, 168, 1, 40);
        assert_eq!(
            strategy.classify(&Record::datagram(echo_reply(7), source)),
            Classification::Reply(ResponderIdentity::Network(Some(source)))
        );
        // identifiers are not compared
        assert_eq!(
            strategy.classify(&Record::datagram(echo_reply(8), source)),
            Classification::Reply(ResponderIdentity::Network(Some(source)))
        );
        assert_eq!(
            strategy.classify(&Record::frame(echo_reply(7))),
            Classification::Reply(ResponderIdentity::Network(None))
        );
    }

    #[test]
    fn test_classify_rejects_other_types() {
        let strategy = EchoStrategy::new(7);
        let source = Ipv4Addr::new(192, 168, 1, 40);

        let request = strategy.encode(source).unwrap();
        assert_eq!(
            strategy.classify(&Record::datagram(request.bytes, source)),
            Classification::NotRelevant
        );

        let mut unreachable = echo_reply(7);
        MutableIcmpPacket::new(&mut unreachable)
            .unwrap()
            .set_icmp_type(IcmpTypes::DestinationUnreachable);
        assert_eq!(
            strategy.classify(&Record::datagram(unreachable, source)),
            Classification::NotRelevant
        );
    }

    #[test]
    fn test_classify_truncated() {
        let strategy = EchoStrategy::new(7);
        let reply = echo_reply(7);
        let source = Ipv4Addr::new(192, 168, 1, 40);
        assert_eq!(
            strategy.classify(&Record::datagram(&reply[..2], source)),
            Classification::NotRelevant
        );
        assert_eq!(
            strategy.classify(&Record::datagram(&reply[..6], source)),
            Classification::NotRelevant
        );
    }
}
