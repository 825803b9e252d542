use crate::capture::AudioChunk;
use crate::transport::{EncodedChunkMessage, TransportChannel};
use base64::Engine;
use std::sync::Arc;
use tracing::warn;

/// Encode one capture segment into its wire form
pub fn encode_chunk(chunk: &AudioChunk) -> EncodedChunkMessage {
    EncodedChunkMessage {
        chunk: base64::engine::general_purpose::STANDARD.encode(chunk.pcm_bytes()),
    }
}

/// Encode a chunk and emit it as soon as its own encoding completes
///
/// Each chunk is handled independently; no ordering is enforced across
/// chunks, and a failed send is logged and dropped (at-most-once).
pub fn spawn_encode_and_send(chunk: AudioChunk, transport: Arc<dyn TransportChannel>) {
    tokio::spawn(async move {
        let msg = encode_chunk(&chunk);
        if let Err(e) = transport.send_chunk(msg).await {
            warn!("failed to send audio chunk: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_pcm_as_standard_base64() {
        let chunk = AudioChunk {
            samples: vec![0x0102, -2],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: 1000,
        };
        // i16 little-endian: [0x02, 0x01, 0xFE, 0xFF]
        let msg = encode_chunk(&chunk);
        assert_eq!(msg.chunk, "AgH+/w==");
    }

    #[test]
    fn empty_chunk_encodes_to_empty_string() {
        let chunk = AudioChunk {
            samples: vec![],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: 0,
        };
        assert_eq!(encode_chunk(&chunk).chunk, "");
    }
}
