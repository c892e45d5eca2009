use std::fmt;

use log::{debug, info, warn};
use relay_shared::{
    ConnectionId,
    client_event::ClientEvent,
    error::ProtocolError,
    received_event::ReceivedEvent,
    server_event::ServerEvent,
};
use tokio::{
    net::{TcpStream, tcp::OwnedReadHalf},
    sync::mpsc,
    task::{JoinError, JoinHandle},
};

use crate::hub::SharedHub;

type WriterTask = JoinHandle<Result<(), ProtocolError>>;

/// Why a connection ended. Only ever logged.
#[derive(Debug)]
pub enum DisconnectReason {
    ClientClosed,
    TransportClosed(ProtocolError),
    ProtocolViolation(ProtocolError),
    WriteFailed(ProtocolError),
    WriterGone(Option<JoinError>),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::ClientClosed => write!(f, "client closed connection"),
            DisconnectReason::TransportClosed(e) => write!(f, "transport closed: {}", e),
            DisconnectReason::ProtocolViolation(e) => write!(f, "protocol error: {}", e),
            DisconnectReason::WriteFailed(e) => write!(f, "write failed: {}", e),
            DisconnectReason::WriterGone(Some(e)) => write!(f, "writer task failed: {}", e),
            DisconnectReason::WriterGone(None) => write!(f, "outbound queue closed"),
        }
    }
}

pub struct ConnectionHandler;

impl ConnectionHandler {
    /// Runs one client session to completion: connect, then dispatch inbound
    /// frames to the hub until the socket or the protocol gives out, then
    /// disconnect.
    pub async fn handle_stream(
        stream: TcpStream,
        id: ConnectionId,
        hub: SharedHub,
        outbound_capacity: usize,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not set TCP_NODELAY for {}: {}", id, e);
        }

        match stream.peer_addr() {
            Ok(addr) => info!("{} accepted from {}", id, addr),
            Err(_) => info!("{} accepted", id),
        }

        let (mut reader, mut writer) = stream.into_split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerEvent>(outbound_capacity.max(1));

        let mut writer_task: WriterTask = tokio::spawn(async move {
            while let Some(event) = outbound_rx.recv().await {
                event.write_to_stream(&mut writer).await?;
            }

            Ok::<(), ProtocolError>(())
        });

        if hub.lock().await.connect(id, outbound_tx).is_none() {
            writer_task.abort();
            return;
        }

        let reason = Self::read_loop(&mut reader, id, &hub, &mut writer_task).await;

        match &reason {
            DisconnectReason::ProtocolViolation(_) | DisconnectReason::WriteFailed(_) => {
                warn!("Closing {}: {}", id, reason)
            }
            _ => {}
        }

        hub.lock().await.disconnect(id, &reason);
        writer_task.abort();
    }

    async fn read_loop(
        reader: &mut OwnedReadHalf,
        id: ConnectionId,
        hub: &SharedHub,
        writer_task: &mut WriterTask,
    ) -> DisconnectReason {
        loop {
            tokio::select! {

                result = ClientEvent::read_from_stream(reader) => {

                    let incoming_event = match result {
                        Ok(ReceivedEvent::EOF) => return DisconnectReason::ClientClosed,
                        Ok(ReceivedEvent::Event(event)) => event,
                        Err(e) if e.is_disconnect() => return DisconnectReason::TransportClosed(e),
                        Err(e) => return DisconnectReason::ProtocolViolation(e),
                    };

                    debug!("{} sent {}", id, incoming_event.id());

                    hub.lock().await.handle(id, incoming_event);
                }

                result = &mut *writer_task => {

                    return match result {
                        Ok(Ok(())) => DisconnectReason::WriterGone(None),
                        Ok(Err(e)) => DisconnectReason::WriteFailed(e),
                        Err(e) => DisconnectReason::WriterGone(Some(e)),
                    };
                }
            }
        }
    }
}
