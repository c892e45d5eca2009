use std::{net::SocketAddr, time::Duration};

use bytes::Bytes;
use relay_server::{RelayConfig, RelayServer};
use relay_shared::{
    ConnectionId, Participant, client_event::ClientEvent, received_event::ReceivedEvent,
    server_event::ServerEvent,
};
use tokio::{io::AsyncWriteExt, net::TcpStream, time::timeout};

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server(config: RelayConfig) -> SocketAddr {
    let server = RelayServer::bind("127.0.0.1:0", config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.listen());
    addr
}

struct TestClient {
    stream: TcpStream,
    id: ConnectionId,
    display_name: String,
    initial_snapshot: Vec<Participant>,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let mut stream = TcpStream::connect(addr).await.unwrap();

        let (id, display_name) = match next_event(&mut stream).await {
            ServerEvent::ConnectSuccess { id, display_name } => (id, display_name),
            other => panic!("expected connect-success, got {other:?}"),
        };
        let initial_snapshot = match next_event(&mut stream).await {
            ServerEvent::ParticipantsSnapshot(participants) => participants,
            other => panic!("expected participants-snapshot, got {other:?}"),
        };

        Self {
            stream,
            id,
            display_name,
            initial_snapshot,
        }
    }

    async fn send(&mut self, event: ClientEvent) {
        event.write_to_stream(&mut self.stream).await.unwrap();
    }

    async fn next(&mut self) -> ServerEvent {
        next_event(&mut self.stream).await
    }
}

async fn next_event(stream: &mut TcpStream) -> ServerEvent {
    match timeout(STEP_TIMEOUT, ServerEvent::read_from_stream(stream))
        .await
        .expect("timed out waiting for server event")
        .unwrap()
    {
        ReceivedEvent::Event(event) => event,
        ReceivedEvent::EOF => panic!("server closed the connection"),
    }
}

#[tokio::test]
async fn newcomer_gets_identity_and_existing_participants() {
    let addr = start_server(RelayConfig::default()).await;

    let mut a = TestClient::connect(addr).await;
    assert!(a.initial_snapshot.is_empty());

    let b = TestClient::connect(addr).await;
    assert_ne!(a.id, b.id);
    assert!(b.display_name.starts_with("User_"));
    assert_eq!(
        b.initial_snapshot,
        vec![Participant {
            id: a.id,
            display_name: a.display_name.clone(),
            speaking: false,
        }]
    );

    assert_eq!(
        a.next().await,
        ServerEvent::UserJoined {
            id: b.id,
            display_name: b.display_name.clone(),
        }
    );
}

#[tokio::test]
async fn audio_and_speaking_are_relayed_to_the_room() {
    let addr = start_server(RelayConfig::default()).await;

    let mut a = TestClient::connect(addr).await;
    let mut b = TestClient::connect(addr).await;
    let mut c = TestClient::connect(addr).await;
    a.next().await;
    a.next().await;
    b.next().await;

    a.send(ClientEvent::SpeakingStarted).await;
    a.send(ClientEvent::SpeakingStarted).await;
    a.send(ClientEvent::AudioChunk(Bytes::from_static(b"segment-1")))
        .await;
    a.send(ClientEvent::SpeakingStopped).await;

    for peer in [&mut b, &mut c] {
        assert_eq!(peer.next().await, ServerEvent::SpeakingStarted(a.id));
        match peer.next().await {
            ServerEvent::AudioChunk {
                sender, payload, ..
            } => {
                assert_eq!(sender, a.id);
                assert_eq!(payload, Bytes::from_static(b"segment-1"));
            }
            other => panic!("expected audio chunk, got {other:?}"),
        }
        assert_eq!(peer.next().await, ServerEvent::SpeakingStopped(a.id));
    }

    // a hears nothing of its own; the next thing it sees is c leaving
    drop(c);
    let c_left = a.next().await;
    assert!(matches!(c_left, ServerEvent::UserLeft(_)));
}

#[tokio::test]
async fn switching_rooms_over_tcp() {
    let addr = start_server(RelayConfig::default()).await;

    let mut a = TestClient::connect(addr).await;
    let mut b = TestClient::connect(addr).await;
    assert!(matches!(a.next().await, ServerEvent::UserJoined { .. }));

    b.send(ClientEvent::SwitchRoom("team".to_string())).await;
    assert_eq!(b.next().await, ServerEvent::ParticipantsSnapshot(Vec::new()));
    assert_eq!(a.next().await, ServerEvent::UserLeft(b.id));

    a.send(ClientEvent::SwitchRoom("team".to_string())).await;
    assert_eq!(
        a.next().await,
        ServerEvent::ParticipantsSnapshot(vec![Participant {
            id: b.id,
            display_name: b.display_name.clone(),
            speaking: false,
        }])
    );
    assert_eq!(
        b.next().await,
        ServerEvent::UserJoined {
            id: a.id,
            display_name: a.display_name.clone(),
        }
    );
}

#[tokio::test]
async fn malformed_frame_disconnects_only_the_offender() {
    let addr = start_server(RelayConfig::default()).await;

    let mut a = TestClient::connect(addr).await;
    let mut b = TestClient::connect(addr).await;
    a.next().await;

    b.stream.write_all(&[0x00]).await.unwrap();

    assert_eq!(a.next().await, ServerEvent::UserLeft(b.id));

    let closed = timeout(STEP_TIMEOUT, ServerEvent::read_from_stream(&mut b.stream))
        .await
        .expect("timed out waiting for close");
    assert!(!matches!(closed, Ok(ReceivedEvent::Event(_))));
}

#[tokio::test]
async fn reconnect_gets_a_new_identity() {
    let addr = start_server(RelayConfig::default()).await;

    let a = TestClient::connect(addr).await;
    let first_id = a.id;
    drop(a);

    let a = TestClient::connect(addr).await;
    assert!(a.id > first_id);
}

#[tokio::test]
async fn listen_until_stops_accepting() {
    let server = RelayServer::bind("127.0.0.1:0", RelayConfig::default())
        .await
        .unwrap();
    let hub = server.hub();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(server.listen_until(async {
        let _ = stop_rx.await;
    }));

    stop_tx.send(()).unwrap();
    timeout(STEP_TIMEOUT, task)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    assert_eq!(hub.lock().await.stats().connected_users, 0);
}
