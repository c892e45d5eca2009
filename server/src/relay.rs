use bytes::Bytes;
use chrono::Utc;
use log::debug;
use relay_shared::{ConnectionId, server_event::ServerEvent};

use crate::hub::Hub;

impl Hub {
    /// Forwards an audio chunk to everyone else in the sender's room, stamped
    /// with the relay time. A sender without a room is ignored.
    ///
    /// Returns the number of peers whose queue accepted the chunk.
    pub fn relay_audio(&self, sender: ConnectionId, payload: Bytes) -> usize {
        let Some(room) = self.directory.room_of(sender) else {
            debug!("Dropping audio from {}: not in a room", sender);
            return 0;
        };

        let peers = self.directory.members_excluding(room, sender);
        if peers.is_empty() {
            return 0;
        }

        let event = ServerEvent::AudioChunk {
            sender,
            payload,
            delivered_at: Utc::now().timestamp_millis(),
        };

        self.fan_out(&peers, &event)
    }

    /// Records the sender's speaking flag and, only if it flipped, tells the
    /// rest of its room.
    pub fn relay_speaking_change(&mut self, sender: ConnectionId, speaking: bool) -> usize {
        let Some(previous) = self.registry.set_speaking(sender, speaking) else {
            return 0;
        };

        if previous == speaking {
            return 0;
        }

        let Some(room) = self.directory.room_of(sender) else {
            return 0;
        };

        let peers = self.directory.members_excluding(room, sender);
        let event = if speaking {
            ServerEvent::SpeakingStarted(sender)
        } else {
            ServerEvent::SpeakingStopped(sender)
        };

        self.fan_out(&peers, &event)
    }
}
