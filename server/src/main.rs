use std::time::Duration;

use clap::Parser;
use log::{error, info};
use relay_server::{RelayConfig, RelayServer};
use relay_shared::{DEFAULT_PORT, DEFAULT_ROOM};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "RELAY_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Room new connections are placed in
    #[arg(long, env = "RELAY_DEFAULT_ROOM", default_value = DEFAULT_ROOM)]
    default_room: String,

    /// Forget rooms as soon as their last member leaves
    #[arg(long, env = "RELAY_GC_EMPTY_ROOMS")]
    gc_empty_rooms: bool,

    /// Events buffered per connection before deliveries to it are dropped
    #[arg(long, env = "RELAY_OUTBOUND_CAPACITY", default_value_t = 256,
          value_parser = clap::value_parser!(u32).range(1..))]
    outbound_capacity: u32,

    /// Seconds between stats log lines, 0 to disable
    #[arg(long, env = "RELAY_STATS_INTERVAL_SECS", default_value_t = 300)]
    stats_interval_secs: u64,
}

impl Args {
    fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            default_room: self.default_room.clone(),
            gc_empty_rooms: self.gc_empty_rooms,
            outbound_capacity: self.outbound_capacity as usize,
            stats_interval: match self.stats_interval_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let tcp_addr = format!("{}:{}", args.host, args.port);

    let server = match RelayServer::bind(tcp_addr.clone(), args.relay_config()).await {
        Ok(relay_server) => relay_server,
        Err(e) => {
            error!("Error binding: {}", e);
            return;
        }
    };

    info!(
        "Voice relay listening on {} (default room: {})",
        tcp_addr, args.default_room
    );

    match server.listen_until(shutdown_signal()).await {
        Ok(_) => info!("Process terminated"),
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Could not listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
