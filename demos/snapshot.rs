use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;

use gpsd_state::client::GpsdSession;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1")]
    addr: IpAddr,
    #[arg(short, long, default_value = "2947")]
    port: u16,
    /// Seconds between snapshots
    #[arg(short, long, default_value = "5")]
    interval: u64,
    /// Echo unclassified reports to stdout
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let session = GpsdSession::new(format!("{}:{}", args.addr, args.port), 0.0, 0.0);
    session.set_debug(args.debug);

    let handle = match session.start().await {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to start session: {e}");
            return;
        }
    };

    let state = session.state();
    loop {
        tokio::time::sleep(Duration::from_secs(args.interval)).await;

        match state.to_json_pretty() {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize snapshot: {e}"),
        }

        if handle.is_finished() {
            eprintln!("Session ended: {}", handle.join().await);
            return;
        }
    }
}
