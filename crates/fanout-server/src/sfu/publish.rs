//! Publish pipeline: one publisher per room

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

use super::room::{PeerRole, PeerSession};
use super::{ForwardingStream, Room, SfuServer, forwarding, negotiate, signal};
use crate::error::Result;

impl SfuServer {
    /// Create `room_id` with a new publisher and answer its `offer`.
    ///
    /// Each media stream the publisher sends becomes a forwarding stream
    /// of the room as soon as its first packet arrives.
    pub async fn publish(&self, room_id: &str, offer: &str) -> Result<String> {
        let offer = signal::decode(offer)?;
        let room = self.registry.create_room(room_id).await?;

        match self.negotiate_publisher(&room, offer).await {
            Ok(answer) => {
                tracing::info!("Publisher joined room {}", room_id);
                Ok(answer)
            }
            Err(e) => {
                // The room never had a working publisher, so the ID stays free
                room.close().await;
                self.registry.discard_room(room_id).await;
                Err(e)
            }
        }
    }

    async fn negotiate_publisher(
        &self,
        room: &Arc<Room>,
        offer: RTCSessionDescription,
    ) -> Result<String> {
        let peer_connection = self.factory.new_peer().await?;
        let session = PeerSession::new(PeerRole::Publisher, room.id(), peer_connection.clone());
        let installed = room.set_publisher(session.clone()).await;
        debug_assert!(installed, "room {} was created with a publisher", room.id());

        let room_ref = Arc::downgrade(room);
        let pc_ref = Arc::downgrade(&peer_connection);
        let scope = session.scope();
        let keyframe_interval = self.keyframe_interval;

        peer_connection.on_track(Box::new(move |remote, _receiver, _transceiver| {
            let room_ref = room_ref.clone();
            let pc_ref = pc_ref.clone();
            let scope = scope.clone();

            Box::pin(async move {
                handle_incoming_track(room_ref, pc_ref, remote, scope, keyframe_interval).await;
            })
        }));

        negotiate::answer_offer(&peer_connection, offer, self.gather_timeout).await
    }
}

/// Turn a newly detected publisher track into a forwarding stream
async fn handle_incoming_track(
    room: Weak<Room>,
    peer_connection: Weak<RTCPeerConnection>,
    remote: Arc<TrackRemote>,
    scope: CancellationToken,
    keyframe_interval: Duration,
) {
    let (Some(room), Some(peer_connection)) = (room.upgrade(), peer_connection.upgrade()) else {
        return;
    };

    let kind = remote.kind();
    tracing::info!(
        "Received {} track {} (SSRC {}, {}) in room {}",
        kind,
        remote.id(),
        remote.ssrc(),
        remote.codec().capability.mime_type,
        room.id()
    );

    if kind != RTPCodecType::Audio && kind != RTPCodecType::Video {
        tracing::debug!("Ignoring track of unspecified kind in room {}", room.id());
        return;
    }

    let stream = Arc::new(ForwardingStream::from_remote(&remote, room.id()));
    room.add_stream(stream.clone()).await;

    let media_ssrc = remote.ssrc();
    forwarding::spawn_relay(remote, stream, scope.clone(), room.id().to_string());

    if kind == RTPCodecType::Video {
        forwarding::spawn_keyframe_requests(peer_connection, media_ssrc, keyframe_interval, scope);
    }
}
