//! Forwarding streams for RTP fan-out
//!
//! A [`ForwardingStream`] mirrors one incoming publisher track. The relay
//! task copies every RTP packet from the incoming track onto it untouched,
//! and every player that attaches it gets the same packets. Uses
//! TrackLocalStaticRTP so packetization is preserved end to end.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtcp::payload_feedbacks::picture_loss_indication::PictureLossIndication;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocalWriter;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_remote::TrackRemote;

/// Size of the buffer used to drain RTCP from a player's sender
const RTCP_BUFFER_SIZE: usize = 1500;

/// Local track that relays one of the publisher's incoming tracks
pub struct ForwardingStream {
    track: Arc<TrackLocalStaticRTP>,
    capability: RTCRtpCodecCapability,
    kind: RTPCodecType,
    /// SSRC of the incoming track on the publisher's connection
    source_ssrc: u32,
}

impl ForwardingStream {
    pub fn new(
        capability: RTCRtpCodecCapability,
        kind: RTPCodecType,
        source_ssrc: u32,
        stream_id: &str,
    ) -> Self {
        let track = Arc::new(TrackLocalStaticRTP::new(
            capability.clone(),
            format!("{kind}-{source_ssrc}"),
            stream_id.to_string(),
        ));

        Self {
            track,
            capability,
            kind,
            source_ssrc,
        }
    }

    /// Mirror an incoming track, copying its negotiated codec capability
    pub fn from_remote(remote: &TrackRemote, stream_id: &str) -> Self {
        Self::new(
            remote.codec().capability,
            remote.kind(),
            remote.ssrc(),
            stream_id,
        )
    }

    pub fn track(&self) -> Arc<TrackLocalStaticRTP> {
        self.track.clone()
    }

    pub fn kind(&self) -> RTPCodecType {
        self.kind
    }

    pub fn source_ssrc(&self) -> u32 {
        self.source_ssrc
    }

    pub fn capability(&self) -> &RTCRtpCodecCapability {
        &self.capability
    }
}

/// Copy RTP from `remote` to `stream` until the read side fails or `scope`
/// is cancelled.
pub fn spawn_relay(
    remote: Arc<TrackRemote>,
    stream: Arc<ForwardingStream>,
    scope: CancellationToken,
    room_id: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            "Starting {} relay for SSRC {} in room {}",
            stream.kind(),
            stream.source_ssrc(),
            room_id
        );

        let mut packet_count = 0u64;

        loop {
            let packet = tokio::select! {
                _ = scope.cancelled() => {
                    tracing::info!("Relay for SSRC {} in room {} cancelled", stream.source_ssrc(), room_id);
                    break;
                }
                read = remote.read_rtp() => match read {
                    Ok((packet, _attributes)) => packet,
                    Err(e) => {
                        tracing::info!(
                            "Relay for SSRC {} in room {} stopped reading: {}",
                            stream.source_ssrc(),
                            room_id,
                            e
                        );
                        break;
                    }
                }
            };

            packet_count += 1;
            if packet_count % 1000 == 1 {
                tracing::debug!(
                    "Relayed {} packets on SSRC {} (seq: {}, payload: {} bytes)",
                    packet_count,
                    stream.source_ssrc(),
                    packet.header.sequence_number,
                    packet.payload.len()
                );
            }

            // A closed pipe means a player is tearing down, keep serving the rest
            if let Err(e) = stream.track.write_rtp(&packet).await {
                if !is_closed_pipe(&e) {
                    tracing::warn!(
                        "Failed to forward RTP on SSRC {} in room {}: {}",
                        stream.source_ssrc(),
                        room_id,
                        e
                    );
                }
            }
        }
    })
}

/// Whether a write failed only because a bound player's transport is closed.
///
/// `write_rtp` folds per-binding failures into one message-only error, so
/// the closed-pipe case has to be recognised by its text as well.
fn is_closed_pipe(err: &webrtc::Error) -> bool {
    *err == webrtc::Error::ErrClosedPipe
        || err
            .to_string()
            .contains(&webrtc::Error::ErrClosedPipe.to_string())
}

/// Periodically ask the publisher for a fresh keyframe on `media_ssrc`.
///
/// The first request goes out one `period` after the task starts.
pub fn spawn_keyframe_requests(
    peer_connection: Arc<RTCPeerConnection>,
    media_ssrc: u32,
    period: Duration,
    scope: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = scope.cancelled() => break,
                _ = ticker.tick() => {
                    let pli = PictureLossIndication {
                        sender_ssrc: 0,
                        media_ssrc,
                    };
                    if let Err(e) = peer_connection.write_rtcp(&[Box::new(pli)]).await {
                        tracing::warn!("PLI send error for SSRC {}: {}", media_ssrc, e);
                    }
                }
            }
        }

        tracing::debug!("Keyframe requests for SSRC {} stopped", media_ssrc);
    })
}

/// Read and discard RTCP arriving on a player's sender so the transport's
/// feedback path never backs up.
pub fn spawn_feedback_drain(sender: Arc<RTCRtpSender>, scope: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rtcp_buf = vec![0u8; RTCP_BUFFER_SIZE];

        loop {
            tokio::select! {
                _ = scope.cancelled() => break,
                read = sender.read(&mut rtcp_buf) => {
                    if let Err(e) = read {
                        tracing::debug!("RTCP drain stopped: {}", e);
                        break;
                    }
                }
            }
        }
    })
}
