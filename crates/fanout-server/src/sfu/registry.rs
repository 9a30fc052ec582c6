//! Session registry: the authority on which rooms exist

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::Room;
use crate::error::{Result, SfuError};

/// Rooms keyed by ID.
///
/// The lock only guards the map itself; negotiation and per-room state
/// never run under it.
#[derive(Default)]
pub struct SessionRegistry {
    rooms: RwLock<HashMap<String, Arc<Room>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room, failing if the ID is already taken
    pub async fn create_room(&self, id: &str) -> Result<Arc<Room>> {
        let mut rooms = self.rooms.write().await;

        if rooms.contains_key(id) {
            return Err(SfuError::RoomConflict(id.to_string()));
        }

        let room = Arc::new(Room::new(id));
        rooms.insert(id.to_string(), room.clone());
        tracing::info!("Created room {}", id);

        Ok(room)
    }

    pub async fn get_room(&self, id: &str) -> Result<Arc<Room>> {
        self.rooms
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SfuError::RoomNotFound(id.to_string()))
    }

    /// Forget a room whose publish never completed
    pub async fn discard_room(&self, id: &str) -> Option<Arc<Room>> {
        let room = self.rooms.write().await.remove(id);
        if room.is_some() {
            tracing::info!("Discarded room {}", id);
        }
        room
    }

    pub async fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}
