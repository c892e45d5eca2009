use std::time::Duration;

use relay_shared::{DEFAULT_ROOM, RoomId};

pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Room every new connection lands in.
    pub default_room: RoomId,
    /// Drop a room's directory entry as soon as its last member leaves.
    pub gc_empty_rooms: bool,
    /// Events buffered per connection before further deliveries to it are
    /// dropped.
    pub outbound_capacity: usize,
    pub stats_interval: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_room: DEFAULT_ROOM.to_string(),
            gc_empty_rooms: false,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            stats_interval: Some(DEFAULT_STATS_INTERVAL),
        }
    }
}
