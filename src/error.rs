use std::{io, net::Ipv4Addr};

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to open capture handle, reason: {0}")]
    HandleOpen(#[source] io::Error),
    #[error("failed to send probe to {target}, reason: {source}")]
    Transmit {
        target: Ipv4Addr,
        #[source]
        source: io::Error,
    },
    #[error("listener finished without reporting a result")]
    ListenerLost,
    #[error("{0:#010x} is not a contiguous subnet mask")]
    InvalidMask(u32),
    #[error("prefix length {0} exceeds 32")]
    InvalidPrefix(u8),
    #[error("failed to encode probe, reason: {0}")]
    Encode(String),
    #[error("interface {name} is not usable, reason: {reason}")]
    UnusableInterface { name: String, reason: String },
    #[error("invalid target list at line {line}: {reason}")]
    Config { line: usize, reason: String },
    #[error("{0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
