//! Condition-based waits on top of a [`PageDriver`]
//!
//! Drivers never block on page conditions themselves. These helpers poll the
//! driver until a condition holds or an explicit timeout elapses, so no wait
//! is ever unbounded.

use super::{DriverResult, ElementHandle, PageDriver};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Outcome of a bounded wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    Ready(T),
    TimedOut,
}

/// Waits until an element matching `selector` is present
pub async fn wait_for_element<D>(
    driver: &D,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> DriverResult<WaitOutcome<ElementHandle>>
where
    D: PageDriver + ?Sized,
{
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(element) = driver.find_one(selector).await? {
            return Ok(WaitOutcome::Ready(element));
        }

        if Instant::now() >= deadline {
            return Ok(WaitOutcome::TimedOut);
        }

        sleep(poll.min(deadline.saturating_duration_since(Instant::now()))).await;
    }
}

/// Waits until the number of elements matching `selector` differs from `previous`
///
/// Returns the new count, or `TimedOut` when the count stayed the same for the
/// whole `timeout`.
pub async fn wait_for_count_change<D>(
    driver: &D,
    selector: &str,
    previous: usize,
    timeout: Duration,
    poll: Duration,
) -> DriverResult<WaitOutcome<usize>>
where
    D: PageDriver + ?Sized,
{
    let deadline = Instant::now() + timeout;

    loop {
        let count = driver.find_all(selector).await?.len();
        if count != previous {
            return Ok(WaitOutcome::Ready(count));
        }

        if Instant::now() >= deadline {
            return Ok(WaitOutcome::TimedOut);
        }

        sleep(poll.min(deadline.saturating_duration_since(Instant::now()))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;

    const URL: &str = "https://hub.example/page";

    #[tokio::test]
    async fn test_wait_for_present_element() {
        let mut driver = MemoryDriver::new().with_page(URL, "<h1>Title</h1>");
        driver.navigate(URL).await.unwrap();

        let outcome = wait_for_element(&driver, "h1", Duration::from_millis(200), Duration::from_millis(10))
            .await
            .unwrap();
        assert!(matches!(outcome, WaitOutcome::Ready(e) if e.text == "Title"));
    }

    #[tokio::test]
    async fn test_wait_for_missing_element_times_out() {
        let mut driver = MemoryDriver::new().with_page(URL, "<p>No title</p>");
        driver.navigate(URL).await.unwrap();

        let started = Instant::now();
        let outcome = wait_for_element(&driver, "h1", Duration::from_millis(50), Duration::from_millis(10))
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_count_change_detected_after_scroll() {
        let items: Vec<String> = (0..4).map(|i| format!("<li class=\"c\">{}</li>", i)).collect();
        let mut driver = MemoryDriver::new().with_listing(URL, items, 2);
        driver.navigate(URL).await.unwrap();
        driver.run_script(crate::driver::SCROLL_TO_BOTTOM).await.unwrap();

        let outcome = wait_for_count_change(&driver, "li.c", 2, Duration::from_millis(100), Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Ready(4));
    }

    #[tokio::test]
    async fn test_stable_count_times_out() {
        let items: Vec<String> = (0..2).map(|i| format!("<li class=\"c\">{}</li>", i)).collect();
        let mut driver = MemoryDriver::new().with_listing(URL, items, 2);
        driver.navigate(URL).await.unwrap();

        let outcome = wait_for_count_change(&driver, "li.c", 2, Duration::from_millis(30), Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }
}
