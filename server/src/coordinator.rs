use std::fmt::Display;

use log::{debug, error, info};
use relay_shared::{ConnectionId, server_event::ServerEvent};

use crate::{
    hub::{Hub, Outbound, Session, SessionState},
    registry::User,
};

impl Hub {
    /// Registers `id`, seats it in the default room, sends it its identity and
    /// the room's participants, then announces it to the room.
    ///
    /// Returns `None` when `id` is already registered; that connect is dropped.
    pub fn connect(&mut self, id: ConnectionId, outbound: Outbound) -> Option<User> {
        let user = match self.registry.register(id) {
            Ok(user) => user.clone(),
            Err(e) => {
                error!("Dropping connect: {}", e);
                return None;
            }
        };

        self.sessions.insert(
            id,
            Session {
                state: SessionState::Connecting,
                outbound,
            },
        );

        let room = self.config.default_room.clone();
        self.directory.join(&room, id);

        self.deliver(
            id,
            ServerEvent::ConnectSuccess {
                id,
                display_name: user.display_name.clone(),
            },
        );
        self.deliver(id, ServerEvent::ParticipantsSnapshot(self.snapshot(&room, id)));

        let peers = self.directory.members_excluding(&room, id);
        self.fan_out(
            &peers,
            &ServerEvent::UserJoined {
                id,
                display_name: user.display_name.clone(),
            },
        );

        if let Some(session) = self.sessions.get_mut(&id) {
            session.state = SessionState::Active;
        }

        info!("{} connected as {} in {}", id, user.display_name, room);

        Some(user)
    }

    /// Moves an active connection into `target`. Old-room peers see it leave,
    /// new-room peers see it join, and it receives a fresh snapshot.
    ///
    /// Returns false when the connection is not active.
    pub fn switch_room(&mut self, id: ConnectionId, target: &str) -> bool {
        if self.session_state(id) != SessionState::Active {
            debug!("Ignoring room switch from inactive {}", id);
            return false;
        }

        let Some(display_name) = self.registry.lookup(id).map(|u| u.display_name.clone()) else {
            return false;
        };

        if self.directory.room_of(id) == Some(target) {
            self.deliver(
                id,
                ServerEvent::ParticipantsSnapshot(self.snapshot(target, id)),
            );
            return true;
        }

        if let Some(previous) = self.directory.join(target, id) {
            let old_peers = self.directory.members_excluding(&previous, id);
            self.fan_out(&old_peers, &ServerEvent::UserLeft(id));
            info!("{} left {} for {}", id, previous, target);
        } else {
            info!("{} joined {}", id, target);
        }

        let new_peers = self.directory.members_excluding(target, id);
        self.fan_out(&new_peers, &ServerEvent::UserJoined { id, display_name });

        self.deliver(
            id,
            ServerEvent::ParticipantsSnapshot(self.snapshot(target, id)),
        );

        true
    }

    /// Tears down `id`: leaves its room, tells the remaining peers, and drops
    /// its user record. Repeating it, or calling it for an id that never fully
    /// connected, is a no-op for whatever is already gone.
    ///
    /// Returns false when there was nothing left to tear down.
    pub fn disconnect(&mut self, id: ConnectionId, reason: impl Display) -> bool {
        let had_session = self.sessions.remove(&id).is_some();

        if let Some(room) = self.directory.leave_current(id) {
            let peers = self.directory.members(&room).to_vec();
            self.fan_out(&peers, &ServerEvent::UserLeft(id));
        }

        let user = self.registry.deregister(id);

        if !had_session && user.is_none() {
            debug!("Ignoring disconnect for unknown {}", id);
            return false;
        }

        match user {
            Some(user) => info!(
                "{} ({}) disconnected, reason: {}",
                id, user.display_name, reason
            ),
            None => info!("{} disconnected, reason: {}", id, reason),
        }

        true
    }
}
