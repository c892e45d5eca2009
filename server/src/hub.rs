//! Shared relay state: the connection registry, the room directory and each
//! live session's outbound queue, all behind one lock.
//!
//! Session transitions live in `coordinator`, fan-out of audio and speaking
//! changes in `relay`.

use std::{collections::HashMap, sync::Arc};

use log::{debug, warn};
use relay_shared::{
    ConnectionId, Participant, client_event::ClientEvent, server_event::ServerEvent,
};
use tokio::sync::{
    Mutex,
    mpsc::{self, error::TrySendError},
};

use crate::{config::RelayConfig, directory::RoomDirectory, registry::ConnectionRegistry};

pub type SharedHub = Arc<Mutex<Hub>>;

pub type Outbound = mpsc::Sender<ServerEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Disconnected,
}

pub(crate) struct Session {
    pub(crate) state: SessionState,
    pub(crate) outbound: Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    pub connected_users: usize,
    pub known_rooms: usize,
    pub occupied_rooms: usize,
}

pub struct Hub {
    pub(crate) config: RelayConfig,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) directory: RoomDirectory,
    pub(crate) sessions: HashMap<ConnectionId, Session>,
}

impl Hub {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            directory: RoomDirectory::new(config.gc_empty_rooms),
            registry: ConnectionRegistry::new(),
            sessions: HashMap::new(),
            config,
        }
    }

    pub fn shared(config: RelayConfig) -> SharedHub {
        Arc::new(Mutex::new(Self::new(config)))
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    pub fn session_state(&self, id: ConnectionId) -> SessionState {
        self.sessions
            .get(&id)
            .map_or(SessionState::Disconnected, |session| session.state)
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            connected_users: self.registry.len(),
            known_rooms: self.directory.room_count(),
            occupied_rooms: self.directory.occupied_room_count(),
        }
    }

    /// Routes one inbound event from `from`. Events are applied in the order
    /// the connection's reader hands them over.
    pub fn handle(&mut self, from: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::SwitchRoom(room) => {
                self.switch_room(from, &room);
            }
            ClientEvent::AudioChunk(payload) => {
                self.relay_audio(from, payload);
            }
            ClientEvent::SpeakingStarted => {
                self.relay_speaking_change(from, true);
            }
            ClientEvent::SpeakingStopped => {
                self.relay_speaking_change(from, false);
            }
        }
    }

    /// Participants of `room` other than `excluding`, in join order.
    pub(crate) fn snapshot(&self, room: &str, excluding: ConnectionId) -> Vec<Participant> {
        self.directory
            .members_excluding(room, excluding)
            .into_iter()
            .filter_map(|id| self.registry.lookup(id))
            .map(|user| user.participant())
            .collect()
    }

    /// Pushes `event` onto `to`'s outbound queue without waiting. A full or
    /// closed queue loses the event.
    pub(crate) fn deliver(&self, to: ConnectionId, event: ServerEvent) -> bool {
        let Some(session) = self.sessions.get(&to) else {
            return false;
        };

        match session.outbound.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!("Outbound queue full for {}, dropping {}", to, event.id());
                false
            }
            Err(TrySendError::Closed(event)) => {
                debug!("{} is gone, dropping {}", to, event.id());
                false
            }
        }
    }

    /// Delivers a copy of `event` to each recipient independently. Returns how
    /// many queues accepted it.
    pub(crate) fn fan_out(&self, recipients: &[ConnectionId], event: &ServerEvent) -> usize {
        let delivered = recipients
            .iter()
            .filter(|to| self.deliver(**to, event.clone()))
            .count();

        debug!(
            "Fanned out {} to {}/{} peers",
            event.id(),
            delivered,
            recipients.len()
        );

        delivered
    }
}
