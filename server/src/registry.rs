use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::{Rng, rng};
use relay_shared::{ConnectionId, Participant};

use crate::error::HubError;

const NAME_PREFIX: &str = "User_";
const NAME_SUFFIX_LEN: usize = 6;
const NAME_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: ConnectionId,
    pub display_name: String,
    pub speaking: bool,
    pub joined_at: DateTime<Utc>,
}

impl User {
    pub fn participant(&self) -> Participant {
        Participant {
            id: self.id,
            display_name: self.display_name.clone(),
            speaking: self.speaking,
        }
    }
}

/// Live user records keyed by connection.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    users: HashMap<ConnectionId, User>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: ConnectionId) -> Result<&User, HubError> {
        if self.users.contains_key(&id) {
            return Err(HubError::AlreadyRegistered(id));
        }

        let user = User {
            id,
            display_name: generate_display_name(),
            speaking: false,
            joined_at: Utc::now(),
        };

        Ok(self.users.entry(id).or_insert(user))
    }

    pub fn lookup(&self, id: ConnectionId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Returns the flag's previous value, or `None` for an unknown connection.
    pub fn set_speaking(&mut self, id: ConnectionId, speaking: bool) -> Option<bool> {
        let user = self.users.get_mut(&id)?;
        let previous = user.speaking;
        user.speaking = speaking;

        Some(previous)
    }

    pub fn deregister(&mut self, id: ConnectionId) -> Option<User> {
        self.users.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// `User_` followed by six random base-36 characters. Collisions are possible
/// and allowed.
pub fn generate_display_name() -> String {
    let mut rng = rng();

    let suffix: String = (0..NAME_SUFFIX_LEN)
        .map(|_| NAME_ALPHABET[rng.random_range(0..NAME_ALPHABET.len())] as char)
        .collect();

    format!("{}{}", NAME_PREFIX, suffix)
}
