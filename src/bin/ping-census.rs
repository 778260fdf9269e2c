use async_census::{
    capture::IcmpCapture,
    census::{count_or_sentinel, Census},
    echo::EchoStrategy,
    targets,
};
use clap::Parser;
use std::{path::PathBuf, process::ExitCode};

mod common;

/// Counts the hosts answering ICMP echo requests in each listed subnet
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV table of subnets with an `id,address,mask` header
    #[arg(short, long, default_value = "network.csv")]
    targets: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    common::init_logging();
    let args = Args::parse();

    let targets = match targets::load_targets(&args.targets) {
        Ok(targets) => targets,
        Err(err) => {
            log::error!("failed to load {}, reason: {}", args.targets.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let census = Census::new(EchoStrategy::new((std::process::id() & 0xffff) as u16));
    let capture = IcmpCapture::new();
    for target in targets {
        println!("{}", target);
        match count_or_sentinel(census.discover(&capture, &target.network).await) {
            Ok(count) => println!("connected hosts: {}\n", count),
            Err(err) => log::error!("sweep of {} aborted, reason: {}", target, err),
        }
    }
    ExitCode::SUCCESS
}
