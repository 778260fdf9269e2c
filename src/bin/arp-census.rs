use async_census::{
    arp::ArpStrategy,
    capture::LinkCapture,
    census::{count_or_sentinel, Census},
    interface::{self, LocalIdentity},
};
use clap::Parser;
use std::process::ExitCode;

mod common;

/// Counts the hosts answering ARP requests on each local subnet
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Network interface to sweep, every usable interface when omitted
    #[arg(short, long)]
    iface: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    common::init_logging();
    let args = Args::parse();

    let identities = match args.iface {
        Some(name) => match interface::interface_from(&name) {
            Ok(identity) => vec![identity],
            Err(err) => {
                log::error!("{}", err);
                return ExitCode::FAILURE;
            }
        },
        None => interface::usable_interfaces(),
    };

    for identity in identities {
        sweep(&identity).await;
    }
    ExitCode::SUCCESS
}

async fn sweep(identity: &LocalIdentity) {
    let range = match identity.range() {
        Ok(range) => range,
        Err(err) => {
            log::error!("skipping {}, reason: {}", identity.name, err);
            return;
        }
    };
    println!(
        "{}: using {}/{}",
        identity.name, identity.ip, identity.prefix_len
    );

    let census = Census::new(ArpStrategy::new(identity.mac, identity.ip));
    let result = census
        .discover(&LinkCapture::new(&identity.name), &range)
        .await;
    match count_or_sentinel(result) {
        Ok(count) => println!("connected hosts: {}", count),
        Err(err) => log::error!("sweep on {} aborted, reason: {}", identity.name, err),
    }
}
