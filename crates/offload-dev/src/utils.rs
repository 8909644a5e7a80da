//! Utility functions for development and testing

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sample rate of generated fixtures
pub const FIXTURE_SAMPLE_RATE: u32 = 16_000;

/// Setup test logging with appropriate levels
pub fn setup_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "offload_dev=debug,offload_state=debug,offload_adapter=debug,offload_router=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Generate a mono 16-bit PCM WAV file of silence lasting `duration_ms`.
///
/// Payload size grows linearly with duration, which makes these handy for
/// exercising the latency-versus-size models.
pub fn generate_wav(duration_ms: u32) -> Vec<u8> {
    let channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let block_align = channels * bits_per_sample / 8;
    let byte_rate = FIXTURE_SAMPLE_RATE * u32::from(block_align);
    let samples = FIXTURE_SAMPLE_RATE as u64 * u64::from(duration_ms) / 1000;
    let data_len = (samples * u64::from(block_align)) as u32;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&FIXTURE_SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);

    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_test_logging_is_idempotent() {
        setup_test_logging();
        setup_test_logging();
    }

    #[test]
    fn test_generate_wav() {
        let wav = generate_wav(1000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 32_000);

        let data_len = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_len, 32_000);

        assert_eq!(generate_wav(0).len(), 44);
        assert!(generate_wav(500).len() < generate_wav(1500).len());
    }
}
