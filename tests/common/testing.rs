use std::time::Duration;

/// Poll `pred` every 10 ms until it holds or `deadline` elapses; returns the
/// final outcome.
pub async fn wait_until(deadline: Duration, mut pred: impl FnMut() -> bool) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if pred() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    pred()
}
