use std::collections::HashMap;

use relay_shared::{ConnectionId, RoomId};

/// Room membership, with a reverse index so every connection resolves to at
/// most one room.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Vec<ConnectionId>>,
    room_of: HashMap<ConnectionId, RoomId>,
    gc_empty_rooms: bool,
}

impl RoomDirectory {
    pub fn new(gc_empty_rooms: bool) -> Self {
        Self {
            gc_empty_rooms,
            ..Self::default()
        }
    }

    /// Adds `id` to `room`, creating the room if needed. A connection sitting
    /// in another room is moved out of it first; that room is returned.
    pub fn join(&mut self, room: &str, id: ConnectionId) -> Option<RoomId> {
        let previous = match self.room_of.get(&id) {
            Some(current) if current == room => return None,
            Some(current) => Some(current.clone()),
            None => None,
        };

        if let Some(previous) = &previous {
            self.remove_member(previous, id);
        }

        let members = self.rooms.entry(room.to_string()).or_default();
        if !members.contains(&id) {
            members.push(id);
        }
        self.room_of.insert(id, room.to_string());

        previous
    }

    /// Returns whether `id` was a member of `room`.
    pub fn leave(&mut self, room: &str, id: ConnectionId) -> bool {
        if self.room_of.get(&id).map(String::as_str) != Some(room) {
            return false;
        }

        self.room_of.remove(&id);
        self.remove_member(room, id);

        true
    }

    /// Leaves whatever room `id` occupies.
    pub fn leave_current(&mut self, id: ConnectionId) -> Option<RoomId> {
        let room = self.room_of.remove(&id)?;
        self.remove_member(&room, id);

        Some(room)
    }

    pub fn members(&self, room: &str) -> &[ConnectionId] {
        self.rooms.get(room).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Members of `room` in join order, minus `excluded`.
    pub fn members_excluding(&self, room: &str, excluded: ConnectionId) -> Vec<ConnectionId> {
        self.members(room)
            .iter()
            .copied()
            .filter(|id| *id != excluded)
            .collect()
    }

    pub fn room_of(&self, id: ConnectionId) -> Option<&str> {
        self.room_of.get(&id).map(String::as_str)
    }

    pub fn contains_room(&self, room: &str) -> bool {
        self.rooms.contains_key(room)
    }

    /// Known rooms, empty ones included.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn occupied_room_count(&self) -> usize {
        self.rooms.values().filter(|m| !m.is_empty()).count()
    }

    fn remove_member(&mut self, room: &str, id: ConnectionId) {
        let Some(members) = self.rooms.get_mut(room) else {
            return;
        };

        members.retain(|member| *member != id);

        if self.gc_empty_rooms && members.is_empty() {
            self.rooms.remove(room);
        }
    }
}
