// crates/network/tests/network_tests.rs
//! Integration tests for duration probing and the prefetch queue

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taleshelf_core::{DisplayTarget, TitleId};
use taleshelf_network::{
    Client, DurationCache, DurationProbe, DurationUpdate, HttpDurationProbe, MetadataPrefetcher,
    NetworkError, NetworkResult, PrefetchSettings,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone, Copy)]
enum Step {
    Answer { after: Duration, seconds: f64 },
    Fail,
    Hang,
}

#[derive(Default)]
struct ProbeStats {
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ProbeStats {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct ScriptedProbe {
    script: HashMap<String, Step>,
    stats: Arc<ProbeStats>,
}

impl ScriptedProbe {
    fn new(script: &[(&str, Step)]) -> (Self, Arc<ProbeStats>) {
        init_logging();
        let stats = Arc::new(ProbeStats::default());
        let probe = Self {
            script: script
                .iter()
                .map(|(source, step)| (source.to_string(), *step))
                .collect(),
            stats: stats.clone(),
        };
        (probe, stats)
    }
}

impl DurationProbe for ScriptedProbe {
    async fn probe(&self, source: &str) -> NetworkResult<f64> {
        self.stats
            .calls
            .lock()
            .expect("calls lock")
            .push(source.to_string());

        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.stats.in_flight);

        match self.script.get(source).copied().unwrap_or(Step::Fail) {
            Step::Answer { after, seconds } => {
                tokio::time::sleep(after).await;
                Ok(seconds)
            }
            Step::Fail => Err(NetworkError::Status {
                url: source.to_string(),
                status: 404,
            }),
            Step::Hang => std::future::pending().await,
        }
    }
}

fn answer(ms: u64, seconds: f64) -> Step {
    Step::Answer {
        after: Duration::from_millis(ms),
        seconds,
    }
}

fn target(index: usize) -> DisplayTarget {
    DisplayTarget::new(TitleId::new(9), index)
}

async fn collect(updates: &mut UnboundedReceiver<DurationUpdate>, n: usize) -> Vec<DurationUpdate> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(updates.recv().await.expect("prefetcher still running"));
    }
    out
}

#[tokio::test(start_paused = true)]
async fn test_hanging_probe_times_out_and_queue_continues() {
    let (probe, stats) = ScriptedProbe::new(&[
        ("a.mp3", answer(10, 600.0)),
        ("b.mp3", Step::Hang),
        ("c.mp3", answer(10, 1200.0)),
    ]);
    let (prefetcher, mut updates) = MetadataPrefetcher::spawn(probe, PrefetchSettings::default());

    for (i, source) in ["a.mp3", "b.mp3", "c.mp3"].iter().enumerate() {
        prefetcher.enqueue(*source, target(i));
    }

    let results = collect(&mut updates, 3).await;
    let seconds: Vec<f64> = results.iter().map(|u| u.seconds).collect();
    assert_eq!(seconds, vec![600.0, 0.0, 1200.0]);
    assert_eq!(
        results.iter().map(|u| u.target.track_index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(stats.calls(), vec!["a.mp3", "b.mp3", "c.mp3"]);
}

#[tokio::test(start_paused = true)]
async fn test_one_probe_in_flight() {
    let script: Vec<(String, Step)> = (0..6)
        .map(|i| (format!("t{}.mp3", i), answer(25, 100.0 + i as f64)))
        .collect();
    let script_refs: Vec<(&str, Step)> = script.iter().map(|(s, st)| (s.as_str(), *st)).collect();
    let (probe, stats) = ScriptedProbe::new(&script_refs);
    let (prefetcher, mut updates) = MetadataPrefetcher::spawn(probe, PrefetchSettings::default());

    for (i, (source, _)) in script.iter().enumerate() {
        prefetcher.enqueue(source.clone(), target(i));
    }

    let results = collect(&mut updates, 6).await;
    assert!(results.iter().all(DurationUpdate::is_known));
    assert_eq!(stats.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(stats.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_errors_resolve_as_unknown_and_are_retried_later() {
    let (probe, stats) = ScriptedProbe::new(&[("missing.mp3", Step::Fail)]);
    let (prefetcher, mut updates) = MetadataPrefetcher::spawn(probe, PrefetchSettings::default());

    prefetcher.enqueue("missing.mp3", target(0));
    let first = collect(&mut updates, 1).await;
    assert_eq!(first[0].seconds, 0.0);
    assert_eq!(prefetcher.cache().get("missing.mp3"), Some(0.0));

    // A cached unknown is a miss, so the file is probed again
    prefetcher.enqueue("missing.mp3", target(0));
    collect(&mut updates, 1).await;
    assert_eq!(stats.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_known_duration_answered_from_cache() {
    let cache = DurationCache::new();
    cache.insert("cached.mp3", 321.0);
    let (probe, stats) = ScriptedProbe::new(&[]);
    let (prefetcher, mut updates) =
        MetadataPrefetcher::with_cache(probe, PrefetchSettings::default(), cache);

    prefetcher.enqueue("cached.mp3", target(4));
    let update = updates.try_recv().expect("answered without waiting");
    assert_eq!(update.seconds, 321.0);
    assert_eq!(update.target, target(4));
    assert!(stats.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_drops_queue_and_silences_in_flight_probe() {
    let (probe, stats) = ScriptedProbe::new(&[
        ("old-1.mp3", answer(100, 500.0)),
        ("old-2.mp3", answer(100, 700.0)),
        ("new-1.mp3", answer(10, 900.0)),
    ]);
    let (prefetcher, mut updates) = MetadataPrefetcher::spawn(probe, PrefetchSettings::default());

    prefetcher.enqueue("old-1.mp3", target(0));
    prefetcher.enqueue("old-2.mp3", target(1));

    // Let the worker start the first probe
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(stats.calls(), vec!["old-1.mp3"]);

    prefetcher.clear();
    assert_eq!(prefetcher.generation(), 1);
    prefetcher.enqueue("new-1.mp3", target(0));

    let update = collect(&mut updates, 1).await.remove(0);
    assert_eq!(update.source, "new-1.mp3");
    assert_eq!(update.generation, 1);

    // The abandoned probe still filled the cache; the queued one never ran
    assert_eq!(prefetcher.cache().known("old-1.mp3"), Some(500.0));
    assert_eq!(stats.calls(), vec!["old-1.mp3", "new-1.mp3"]);
    assert!(updates.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_delay_between_probes() {
    let (probe, _stats) = ScriptedProbe::new(&[("a.mp3", answer(0, 1.0)), ("b.mp3", answer(0, 2.0))]);
    let settings = PrefetchSettings {
        probe_timeout: Duration::from_secs(5),
        inter_request_delay: Duration::from_millis(50),
    };
    let (prefetcher, mut updates) = MetadataPrefetcher::spawn(probe, settings);

    let start = tokio::time::Instant::now();
    prefetcher.enqueue("a.mp3", target(0));
    prefetcher.enqueue("b.mp3", target(1));
    collect(&mut updates, 2).await;

    assert!(start.elapsed() >= Duration::from_millis(50));
}

/// Canonical PCM WAV header for 8 kHz mono 16-bit audio
fn wav_prefix(data_len: u32, payload: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8000u32.to_le_bytes());
    out.extend_from_slice(&16000u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + payload, 0);
    out
}

/// Serves one HTTP response and hands back the raw request
async fn serve_once(
    status_line: &'static str,
    body: Vec<u8>,
) -> (String, tokio::task::JoinHandle<String>) {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.expect("read request");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let head = format!(
            "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_line,
            body.len()
        );
        socket.write_all(head.as_bytes()).await.expect("write head");
        socket.write_all(&body).await.expect("write body");
        let _ = socket.shutdown().await;

        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn test_http_probe_reads_duration_from_ranged_prefix() {
    let (base, server) = serve_once("HTTP/1.1 206 Partial Content", wav_prefix(40_000, 256)).await;
    let probe = HttpDurationProbe::new(Client::new().expect("client"), 4096);

    let seconds = probe
        .probe(&format!("{}/book/c1-10.wav", base))
        .await
        .expect("header decodes");
    assert!((seconds - 2.5).abs() < 1e-6);

    let request = server.await.expect("server task").to_lowercase();
    assert!(request.starts_with("get /book/c1-10.wav"));
    assert!(request.contains("range: bytes=0-4095"));
}

#[tokio::test]
async fn test_http_probe_missing_file_through_prefetcher() {
    let (base, _server) = serve_once("HTTP/1.1 404 Not Found", Vec::new()).await;
    let probe = HttpDurationProbe::new(Client::new().expect("client"), 4096);
    let (prefetcher, mut updates) = MetadataPrefetcher::spawn(probe, PrefetchSettings::default());

    prefetcher.enqueue(format!("{}/book/gone.mp3", base), target(0));
    let update = updates.recv().await.expect("one update");
    assert!(!update.is_known());
}
