// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

// Zlib Context Codec Adapter
//
// Default ContextCodec implementation backed by flate2. Compression runs on
// the blocking pool so large payloads never stall the delegation worker.

use crate::domain::codec::{CodecError, CompressionOptions, CompressionQuality, ContextCodec};
use async_trait::async_trait;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

pub struct DeflateContextCodec;

impl DeflateContextCodec {
    pub fn new() -> Self {
        Self
    }

    fn level_for(quality: CompressionQuality) -> Compression {
        match quality {
            CompressionQuality::Fast => Compression::fast(),
            CompressionQuality::Balanced => Compression::default(),
            CompressionQuality::Max => Compression::best(),
        }
    }
}

impl Default for DeflateContextCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextCodec for DeflateContextCodec {
    async fn compress(&self, text: &str, options: &CompressionOptions) -> Result<Vec<u8>, CodecError> {
        let level = Self::level_for(options.quality);
        let input = text.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || {
            let mut encoder = ZlibEncoder::new(Vec::new(), level);
            encoder
                .write_all(&input)
                .map_err(|e| CodecError::Compression(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| CodecError::Compression(e.to_string()))
        })
        .await
        .map_err(|e| CodecError::Compression(format!("compression task aborted: {}", e)))?
    }

    async fn decompress(&self, bytes: &[u8]) -> Result<String, CodecError> {
        let input = bytes.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut decoder = ZlibDecoder::new(input.as_slice());
            let mut output = String::new();
            decoder
                .read_to_string(&mut output)
                .map_err(|e| CodecError::Decompression(e.to_string()))?;
            Ok(output)
        })
        .await
        .map_err(|e| CodecError::Decompression(format!("decompression task aborted: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_fidelity() {
        let codec = DeflateContextCodec::new();
        let payload = r#"{"goal":"fix the slow login bug","files":["auth.rs","session.rs"]}"#;

        for quality in [
            CompressionQuality::Fast,
            CompressionQuality::Balanced,
            CompressionQuality::Max,
        ] {
            let options = CompressionOptions::for_handoff(quality);
            let compressed = codec.compress(payload, &options).await.unwrap();
            let restored = codec.decompress(&compressed).await.unwrap();
            assert_eq!(restored, payload);
        }
    }

    #[tokio::test]
    async fn test_repetitive_payload_shrinks() {
        let codec = DeflateContextCodec::new();
        let payload = "retry the flaky integration suite ".repeat(64);
        let options = CompressionOptions::for_handoff(CompressionQuality::Balanced);

        let compressed = codec.compress(&payload, &options).await.unwrap();
        assert!(compressed.len() < payload.len());
    }

    #[tokio::test]
    async fn test_garbage_input_fails_decompression() {
        let codec = DeflateContextCodec::new();
        let result = codec.decompress(b"definitely not zlib").await;
        assert!(result.is_err());
    }
}
