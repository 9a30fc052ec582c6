//! Rooms and the peer sessions attached to them

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

use super::ForwardingStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Publisher,
    Player,
}

impl std::fmt::Display for PeerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerRole::Publisher => write!(f, "publisher"),
            PeerRole::Player => write!(f, "player"),
        }
    }
}

/// One publisher or player connection.
///
/// Every background task spawned on behalf of the connection runs under
/// [`PeerSession::scope`], which is cancelled once the connection fails or
/// closes.
pub struct PeerSession {
    id: Uuid,
    role: PeerRole,
    peer_connection: Arc<RTCPeerConnection>,
    scope: CancellationToken,
}

impl PeerSession {
    pub fn new(role: PeerRole, room_id: &str, peer_connection: Arc<RTCPeerConnection>) -> Arc<Self> {
        let id = Uuid::new_v4();
        let scope = CancellationToken::new();

        let token = scope.clone();
        let label = format!("{role} {id} in room {room_id}");
        peer_connection.on_peer_connection_state_change(Box::new(move |state| {
            tracing::info!("Peer connection state of {} changed to {}", label, state);
            if matches!(
                state,
                RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
            ) {
                token.cancel();
            }
            Box::pin(async {})
        }));

        Arc::new(Self {
            id,
            role,
            peer_connection,
            scope,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }

    /// Token observed by every task owned by this connection
    pub fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Cancel the connection's tasks and close the endpoint
    pub async fn close(&self) {
        self.scope.cancel();
        if let Err(e) = self.peer_connection.close().await {
            tracing::warn!("Error closing {} {}: {}", self.role, self.id, e);
        }
    }
}

/// A conference room: one publisher fanned out to any number of players
pub struct Room {
    id: String,
    publisher: RwLock<Option<Arc<PeerSession>>>,
    /// Append-only; players snapshot it when they attach
    streams: RwLock<Vec<Arc<ForwardingStream>>>,
    players: RwLock<Vec<Arc<PeerSession>>>,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            publisher: RwLock::new(None),
            streams: RwLock::new(Vec::new()),
            players: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Install the room's publisher. Returns false if one is already set.
    pub async fn set_publisher(&self, session: Arc<PeerSession>) -> bool {
        let mut publisher = self.publisher.write().await;
        if publisher.is_some() {
            return false;
        }
        *publisher = Some(session);
        true
    }

    pub async fn publisher(&self) -> Option<Arc<PeerSession>> {
        self.publisher.read().await.clone()
    }

    pub async fn add_stream(&self, stream: Arc<ForwardingStream>) {
        let mut streams = self.streams.write().await;
        streams.push(stream);
        tracing::info!("Room {} now forwards {} streams", self.id, streams.len());
    }

    /// Snapshot of the forwarding streams as of now
    pub async fn streams(&self) -> Vec<Arc<ForwardingStream>> {
        self.streams.read().await.clone()
    }

    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Attach a player, forgetting players whose connections have ended
    pub async fn add_player(&self, session: Arc<PeerSession>) {
        let mut players = self.players.write().await;
        players.retain(|p| !p.is_closed());
        players.push(session);
    }

    /// Players whose connections are still open
    pub async fn players(&self) -> Vec<Arc<PeerSession>> {
        self.players
            .read()
            .await
            .iter()
            .filter(|p| !p.is_closed())
            .cloned()
            .collect()
    }

    /// Close the publisher and every player
    pub async fn close(&self) {
        if let Some(publisher) = self.publisher.read().await.clone() {
            publisher.close().await;
        }

        let players = std::mem::take(&mut *self.players.write().await);
        for player in players {
            player.close().await;
        }

        tracing::info!("Closed room {}", self.id);
    }
}
