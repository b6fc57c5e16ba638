// crates/network/src/probe.rs
//! Track duration discovery
//!
//! Only the first bytes of a file are fetched. The duration is whatever the
//! container headers declare; formats that need the whole file to know their
//! length come back as unknown (0).

use crate::client::Client;
use crate::error::{NetworkError, NetworkResult};
use std::future::Future;
use std::io::Cursor;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;
use taleshelf_config::PrefetchConfig;
use taleshelf_core::source_file_name;

/// Something that can find out how long a remote track is
pub trait DurationProbe: Send + Sync + 'static {
    /// Duration of `source` in seconds, `0.0` when the file gives no answer
    fn probe(&self, source: &str) -> impl Future<Output = NetworkResult<f64>> + Send;
}

/// Probe that reads container headers over HTTP
#[derive(Debug, Clone)]
pub struct HttpDurationProbe {
    client: Client,
    range_bytes: u64,
}

impl HttpDurationProbe {
    pub fn new(client: Client, range_bytes: u64) -> Self {
        Self {
            client,
            range_bytes,
        }
    }

    pub fn from_config(client: Client, config: &PrefetchConfig) -> Self {
        Self::new(client, config.probe_range_bytes)
    }

    pub fn range_bytes(&self) -> u64 {
        self.range_bytes
    }
}

impl DurationProbe for HttpDurationProbe {
    async fn probe(&self, source: &str) -> NetworkResult<f64> {
        let bytes = self.client.get_prefix(source, self.range_bytes).await?;
        let extension = extension_of(source).map(str::to_string);

        tokio::task::spawn_blocking(move || duration_from_header(bytes, extension.as_deref()))
            .await
            .map_err(|e| NetworkError::Custom(format!("Header decoding task failed: {}", e)))?
    }
}

fn extension_of(source: &str) -> Option<&str> {
    let name = source_file_name(source);
    let name = name.split(['?', '#']).next().unwrap_or(name);
    name.rsplit_once('.').map(|(_, ext)| ext).filter(|e| !e.is_empty())
}

/// Reads the declared duration from the first bytes of an audio file
///
/// The bytes are exposed as a non-seekable stream so the reader cannot mistake
/// the prefix length for the file length.
pub fn duration_from_header(bytes: Vec<u8>, extension: Option<&str>) -> NetworkResult<f64> {
    let source = ReadOnlySource::new(Cursor::new(bytes));
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| NetworkError::Decode(e.to_string()))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| NetworkError::Decode("No audio tracks found".to_string()))?;

    let params = &track.codec_params;
    let time_base = params.time_base.or_else(|| {
        params
            .sample_rate
            .filter(|rate| *rate > 0)
            .map(|rate| TimeBase::new(1, rate))
    });

    let seconds = match (params.n_frames, time_base) {
        (Some(n_frames), Some(tb)) => {
            let time = tb.calc_time(n_frames);
            time.seconds as f64 + time.frac
        }
        _ => 0.0,
    };

    Ok(if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    })
}
