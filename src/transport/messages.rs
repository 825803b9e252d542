use serde::{Deserialize, Serialize};

/// Outbound `audio_chunk` message: one base64-encoded capture segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedChunkMessage {
    pub chunk: String, // Base64-encoded PCM bytes
}

/// Inbound `audio_reply` message from the voice agent
///
/// Both renderable fields are optional and independent; the service may
/// send text only, speech only, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyPayload {
    /// Agent response text
    #[serde(default)]
    pub response: Option<String>,

    /// What the service heard (logged, not rendered)
    #[serde(default)]
    pub transcription: Option<String>,

    /// Base64-encoded synthesized speech, WAV-typed
    #[serde(default)]
    pub tts_audio: Option<String>,
}

/// Inbound `error` message from the voice agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_fields_are_independently_optional() {
        let reply: ReplyPayload = serde_json::from_str(r#"{"response":"Hello"}"#).unwrap();
        assert_eq!(reply.response.as_deref(), Some("Hello"));
        assert!(reply.tts_audio.is_none());

        let reply: ReplyPayload = serde_json::from_str(r#"{"tts_audio":"UklGRg=="}"#).unwrap();
        assert!(reply.response.is_none());
        assert_eq!(reply.tts_audio.as_deref(), Some("UklGRg=="));
    }

    #[test]
    fn chunk_message_wire_shape() {
        let msg = EncodedChunkMessage {
            chunk: "AAAA".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"chunk":"AAAA"}"#);
    }
}
