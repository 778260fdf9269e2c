//! Active host discovery on local IPv4 subnets.
//!
//! A [`census::Census`] sends one probe to every host address of a subnet and
//! counts the replies that arrive before a fixed deadline. The probe protocol is
//! a [`probe::ProbeStrategy`]: [`arp::ArpStrategy`] on the link layer or
//! [`echo::EchoStrategy`] for ICMP echo. Packet I/O is a [`capture::Capture`].
//!
//! ## Example
//! Following example counts the hosts answering ARP on every usable local subnet.
//! Sending raw frames requires `CAP_NET_RAW` (or root).
//! ```no_run
//! use async_census::{arp::ArpStrategy, capture::LinkCapture, interface, Census};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     for identity in interface::usable_interfaces() {
//!         let range = identity.range().unwrap();
//!         let census = Census::new(ArpStrategy::new(identity.mac, identity.ip));
//!         match census.discover(&LinkCapture::new(&identity.name), &range).await {
//!             Ok(result) => println!("{}: {} hosts", identity.name, result.count),
//!             Err(err) => eprintln!("{}: {}", identity.name, err),
//!         }
//!     }
//! }
//! ```
//! The `arp-census` and `ping-census` binaries wrap both sweeps.

pub mod arp;
pub mod capture;
pub mod census;
pub mod echo;
pub mod error;
pub mod interface;
pub mod probe;
pub mod range;
pub mod targets;

pub(crate) mod constants;

pub use census::{Census, DiscoveryResult};
pub use error::{Error, Result};
