//! Fixed-delay retries with a stop requested from inside the operation.
use redo::prelude::*;
use redo::LogSink;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Unavailable(u32);

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "service unavailable (attempt {})", self.0)
    }
}

impl std::error::Error for Unavailable {}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let redo = Redo::new(5, Duration::from_millis(200)).with_sink(LogSink);
    let mut attempt = 0;

    let result = redo
        .run(|stop| {
            attempt += 1;
            // Replace with your real fallible work
            if attempt == 3 {
                stop.stop();
            }
            let outcome: Result<(), Unavailable> = Err(Unavailable(attempt));
            async move { outcome }
        })
        .await;

    println!("result: {:?}", result);
    println!("last error: {:?}", redo.last_err());
}
