//! Play pipeline: attach a new player to an existing room

use std::sync::Arc;

use webrtc::track::track_local::TrackLocal;

use super::room::{PeerRole, PeerSession};
use super::{Room, SfuServer, forwarding, negotiate, signal};
use crate::error::{Result, SfuError};

impl SfuServer {
    /// Answer a player's `offer` with the streams `room_id` forwards right now.
    ///
    /// Streams the publisher adds later are not offered to this player;
    /// there is no renegotiation.
    pub async fn play(&self, room_id: &str, offer: &str) -> Result<String> {
        let room = self.registry.get_room(room_id).await?;
        let peer_connection = self.factory.new_peer().await?;
        let session = PeerSession::new(PeerRole::Player, room_id, peer_connection);

        match self.negotiate_player(&room, &session, offer).await {
            Ok(answer) => {
                room.add_player(session.clone()).await;
                tracing::info!("Player {} joined room {}", session.id(), room_id);
                Ok(answer)
            }
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    async fn negotiate_player(
        &self,
        room: &Arc<Room>,
        session: &Arc<PeerSession>,
        offer: &str,
    ) -> Result<String> {
        let peer_connection = session.peer_connection();

        let streams = room.streams().await;
        for stream in &streams {
            let sender = peer_connection
                .add_track(stream.track() as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .map_err(|e| SfuError::negotiation("attach forwarding stream", e))?;

            forwarding::spawn_feedback_drain(sender, session.scope());
        }

        tracing::debug!(
            "Attached {} streams from room {} to player {}",
            streams.len(),
            room.id(),
            session.id()
        );

        let offer = signal::decode(offer)?;
        negotiate::answer_offer(peer_connection, offer, self.gather_timeout).await
    }
}
