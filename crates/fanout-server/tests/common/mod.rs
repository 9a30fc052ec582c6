//! Client-side helpers shared by the SFU integration tests
//!
//! Publishers and players here are plain webrtc-rs peers talking to the
//! SFU over loopback.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fanout_server::sfu::{SfuServer, signal};
use fanout_server::state::Config;
use tokio::task::JoinHandle;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::api::setting_engine::SettingEngine;
use webrtc::ice::network_type::NetworkType;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_local::{TrackLocal, TrackLocalWriter};

pub const AUDIO_TAG: u8 = 0xA0;
pub const VIDEO_TAG: u8 = 0x10;
const PAYLOAD_LEN: usize = 160;

/// SFU on an ephemeral ICE port, advertising loopback
pub async fn start_sfu() -> Arc<SfuServer> {
    let config = Config {
        webrtc_port: 0,
        ..Config::default()
    };
    Arc::new(SfuServer::new(&config).await.expect("Failed to start SFU"))
}

pub async fn client_peer() -> Arc<RTCPeerConnection> {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs().unwrap();

    let mut registry = Registry::new();
    registry = register_default_interceptors(registry, &mut media_engine).unwrap();

    let mut setting_engine = SettingEngine::default();
    setting_engine.set_network_types(vec![NetworkType::Udp4]);
    setting_engine.set_include_loopback_candidate(true);

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .with_setting_engine(setting_engine)
        .build();

    Arc::new(
        api.new_peer_connection(RTCConfiguration::default())
            .await
            .unwrap(),
    )
}

/// Create an offer, wait for all candidates, and encode it for signaling
pub async fn local_offer(pc: &RTCPeerConnection) -> String {
    let offer = pc.create_offer(None).await.unwrap();
    let mut gather_complete = pc.gathering_complete_promise().await;
    pc.set_local_description(offer).await.unwrap();
    let _ = gather_complete.recv().await;

    signal::encode(&pc.local_description().await.unwrap()).unwrap()
}

pub async fn accept_answer(pc: &RTCPeerConnection, answer: &str) {
    pc.set_remote_description(signal::decode(answer).unwrap())
        .await
        .unwrap();
}

pub async fn wait_connected(pc: &RTCPeerConnection) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while pc.connection_state() != RTCPeerConnectionState::Connected {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("peer connection never connected");
}

pub async fn wait_for_streams(sfu: &SfuServer, room_id: &str, count: usize) {
    let room = sfu.registry().get_room(room_id).await.unwrap();
    tokio::time::timeout(Duration::from_secs(10), async {
        while room.stream_count().await < count {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("publisher streams never detected");
}

pub fn media_section_count(answer: &str) -> usize {
    signal::decode(answer)
        .unwrap()
        .sdp
        .lines()
        .filter(|line| line.starts_with("m="))
        .count()
}

/// Payload the publisher writes for a given tag and sequence number
pub fn expected_payload(tag: u8, sequence_number: u16) -> Vec<u8> {
    let mut payload = vec![tag];
    payload.extend_from_slice(&sequence_number.to_be_bytes());
    payload.extend((0..PAYLOAD_LEN - 3).map(|i| (i as u8).wrapping_mul(7)));
    payload
}

fn rtp_packet(payload_type: u8, sequence_number: u16, timestamp: u32, tag: u8) -> Vec<u8> {
    let mut packet = vec![0x80, payload_type];
    packet.extend_from_slice(&sequence_number.to_be_bytes());
    packet.extend_from_slice(&timestamp.to_be_bytes());
    packet.extend_from_slice(&0u32.to_be_bytes());
    packet.extend(expected_payload(tag, sequence_number));
    packet
}

/// A publisher sending one audio and one video track of synthetic RTP
pub struct TestPublisher {
    pub pc: Arc<RTCPeerConnection>,
    pub audio_sender: Arc<RTCRtpSender>,
    pub video_sender: Arc<RTCRtpSender>,
    audio: Arc<TrackLocalStaticRTP>,
    video: Arc<TrackLocalStaticRTP>,
    writers: Vec<JoinHandle<()>>,
}

impl TestPublisher {
    /// A publisher with both tracks attached but not yet negotiated
    pub async fn new() -> Self {
        let pc = client_peer().await;

        let audio = Arc::new(TrackLocalStaticRTP::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_string(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            "audio".to_string(),
            "publisher".to_string(),
        ));
        let video = Arc::new(TrackLocalStaticRTP::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_string(),
                clock_rate: 90000,
                ..Default::default()
            },
            "video".to_string(),
            "publisher".to_string(),
        ));

        let audio_sender = pc
            .add_track(audio.clone() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .unwrap();
        let video_sender = pc
            .add_track(video.clone() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .unwrap();

        Self {
            pc,
            audio_sender,
            video_sender,
            audio,
            video,
            writers: Vec::new(),
        }
    }

    /// Publish to `room_id` and start streaming once connected
    pub async fn connect(sfu: &SfuServer, room_id: &str) -> Self {
        let mut publisher = Self::new().await;

        let offer = local_offer(&publisher.pc).await;
        let answer = sfu.publish(room_id, &offer).await.expect("publish failed");
        accept_answer(&publisher.pc, &answer).await;
        wait_connected(&publisher.pc).await;

        publisher.start_writing();
        publisher
    }

    pub fn start_writing(&mut self) {
        self.writers = vec![
            spawn_writer(self.audio.clone(), 111, 960, AUDIO_TAG, Duration::from_millis(20)),
            spawn_writer(self.video.clone(), 96, 3000, VIDEO_TAG, Duration::from_millis(33)),
        ];
    }

    pub async fn close(self) {
        for writer in self.writers {
            writer.abort();
        }
        self.pc.close().await.unwrap();
    }
}

fn spawn_writer(
    track: Arc<TrackLocalStaticRTP>,
    payload_type: u8,
    timestamp_step: u32,
    tag: u8,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        let mut sequence_number: u16 = 1;
        let mut timestamp: u32 = 0;

        loop {
            ticker.tick().await;
            let packet = rtp_packet(payload_type, sequence_number, timestamp, tag);
            // Writes before the transport settles may fail; keep the cadence
            let _ = track.write(&packet).await;
            sequence_number = sequence_number.wrapping_add(1);
            timestamp = timestamp.wrapping_add(timestamp_step);
        }
    })
}
