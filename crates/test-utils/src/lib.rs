pub mod builders;
pub mod monitor;
pub mod tasks;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once, mpsc};
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};
use workflow_engine::Resumer;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Hands out resumers and records when they fire.
///
/// Each resumer counts its invocation and signals a channel the test thread
/// can block on.
pub struct ResumeProbe {
    fired: Arc<AtomicUsize>,
    tx: mpsc::Sender<()>,
    rx: Mutex<mpsc::Receiver<()>>,
}

impl ResumeProbe {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            fired: Arc::new(AtomicUsize::new(0)),
            tx,
            rx: Mutex::new(rx),
        }
    }

    pub fn resumer(&self) -> impl Resumer + use<> {
        let fired = Arc::clone(&self.fired);
        let tx = self.tx.clone();
        move || {
            fired.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        }
    }

    /// How many resumers from this probe have fired so far.
    pub fn fired(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }

    /// Block until a resumer fires; false on timeout.
    pub fn wait(&self, timeout: Duration) -> bool {
        self.rx
            .lock()
            .unwrap()
            .recv_timeout(timeout)
            .is_ok()
    }
}

impl Default for ResumeProbe {
    fn default() -> Self {
        Self::new()
    }
}
