//! Exponential backoff bounded by elapsed time, stopped from a second task.
use redo::prelude::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let config = BackoffConfig::new(
        Duration::from_millis(100),
        2.0,
        0.2,
        Duration::from_secs(1),
        Some(Duration::from_secs(10)),
    )?;
    let redo: Redo<String> = Redo::new(-1, Duration::ZERO);

    let stopper = {
        let handle = redo.stop_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            handle.stop();
        })
    };

    let result = redo
        .back_off(&config, |_stop| async { Err::<(), _>("connection refused".to_string()) })
        .await;
    stopper.await?;

    println!("result: {:?} after {} attempts", result, redo.attempts());
    println!("last error: {:?}", redo.last_err());
    Ok(())
}
