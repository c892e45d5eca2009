use core::error::Error;
use std::{future::Future, io, net::SocketAddr, time::Duration};

use log::{error, info};
use relay_shared::ConnectionId;
use tokio::{
    net::{TcpListener, ToSocketAddrs},
    task::JoinHandle,
    time::{Instant, interval_at},
};

use crate::{
    config::RelayConfig,
    connection::ConnectionHandler,
    hub::{Hub, SharedHub},
};

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

pub struct RelayServer {
    tcp_listener: TcpListener,
    hub: SharedHub,
    config: RelayConfig,
}

impl RelayServer {
    pub async fn bind<A>(addr: A, config: RelayConfig) -> Result<Self, Box<dyn Error + Send + Sync>>
    where
        A: ToSocketAddrs,
    {
        Ok(Self {
            tcp_listener: TcpListener::bind(addr).await?,
            hub: Hub::shared(config.clone()),
            config,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp_listener.local_addr()
    }

    pub fn hub(&self) -> SharedHub {
        self.hub.clone()
    }

    pub async fn listen(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.listen_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves. Each connection gets a
    /// fresh id from a counter that never wraps back to a used value.
    pub async fn listen_until<F>(self, shutdown: F) -> Result<(), Box<dyn Error + Send + Sync>>
    where
        F: Future<Output = ()>,
    {
        let stats_task = self
            .config
            .stats_interval
            .filter(|period| !period.is_zero())
            .map(|period| spawn_stats_task(self.hub.clone(), period));

        let mut next_id: u64 = 1;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {

                _ = &mut shutdown => {

                    info!("Shutting down, no longer accepting connections");
                    break;
                }

                result = self.tcp_listener.accept() => {

                    let tcp_socket = match result {
                        Ok((tcp_socket, _)) => tcp_socket,
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                            continue;
                        }
                    };

                    let id = ConnectionId(next_id);
                    next_id += 1;

                    let hub = self.hub.clone();
                    let outbound_capacity = self.config.outbound_capacity;

                    tokio::spawn(async move {

                        ConnectionHandler::handle_stream(tcp_socket, id, hub, outbound_capacity).await;
                    });
                }
            }
        }

        if let Some(stats_task) = stats_task {
            stats_task.abort();
        }

        let stats = self.hub.lock().await.stats();
        info!(
            "Final stats - Connected users: {}, Known rooms: {}",
            stats.connected_users, stats.known_rooms
        );

        Ok(())
    }
}

fn spawn_stats_task(hub: SharedHub, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stats_interval = interval_at(Instant::now() + period, period);

        loop {
            stats_interval.tick().await;

            let stats = hub.lock().await.stats();
            info!(
                "Server stats - Connected users: {}, Active rooms: {}/{}",
                stats.connected_users, stats.occupied_rooms, stats.known_rooms
            );
        }
    })
}
