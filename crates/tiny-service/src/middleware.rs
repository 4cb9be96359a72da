//! Request metrics middleware.
//!
//! `track` is the composition step: it times one invocation of the next
//! stage, records count and latency, and hands back whatever the stage
//! produced. `http_metrics` adapts it to axum and is installed by the router
//! as the outermost layer, so 404s from the fallback are counted too.

use std::convert::Infallible;
use std::future::Future;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;
use crate::obs::HttpMetrics;

/// Records one request when dropped, so a stage that panics or is cancelled
/// mid-flight is still counted and timed exactly once.
struct RequestTimer<'a> {
    metrics: &'a HttpMetrics,
    method: &'a str,
    endpoint: &'a str,
    start: Instant,
    outcome: &'static str,
}

impl Drop for RequestTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.metrics.record(self.method, self.endpoint, elapsed);
        tracing::debug!(
            method = %self.method,
            endpoint = %self.endpoint,
            elapsed_s = elapsed.as_secs_f64(),
            outcome = self.outcome,
            "request served"
        );
    }
}

/// Run `next` once and record it against `(method, endpoint)`.
///
/// Success, failure, panic and cancellation are all recorded; the result is
/// returned unchanged.
pub async fn track<F, T, E>(metrics: &HttpMetrics, method: &str, endpoint: &str, next: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let mut timer = RequestTimer {
        metrics,
        method,
        endpoint,
        start: Instant::now(),
        outcome: "aborted",
    };
    let result = next.await;
    timer.outcome = if result.is_ok() { "ok" } else { "err" };
    result
}

/// axum adapter around [`track`]. The endpoint label is the raw request path.
pub async fn http_metrics(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let path = request.uri().path().to_owned();

    let outcome = track(state.http_metrics(), &method, &path, async {
        Ok::<_, Infallible>(next.run(request).await)
    })
    .await;

    match outcome {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tiny_core::error::TinyError;
    use tiny_core::metrics::Registry;

    use super::*;

    #[tokio::test]
    async fn success_is_forwarded_and_recorded() {
        let registry = Registry::new();
        let metrics = HttpMetrics::register(&registry).unwrap();
        let calls = AtomicUsize::new(0);

        let out: Result<&str, TinyError> = track(&metrics, "GET", "/greet", async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("hi")
        })
        .await;

        assert_eq!(out.unwrap(), "hi");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.requests().get(&["GET", "/greet"]).unwrap(), 1);
        assert_eq!(metrics.latency().snapshot().count, 1);
    }

    #[tokio::test]
    async fn failure_is_recorded_then_propagated_unchanged() {
        let registry = Registry::new();
        let metrics = HttpMetrics::register(&registry).unwrap();
        let calls = AtomicUsize::new(0);

        let out: Result<(), TinyError> = track(&metrics, "GET", "/boom", async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TinyError::Internal("handler blew up".into()))
        })
        .await;

        match out {
            Err(TinyError::Internal(msg)) => assert_eq!(msg, "handler blew up"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.requests().get(&["GET", "/boom"]).unwrap(), 1);
        assert_eq!(metrics.latency().snapshot().count, 1);
    }

    #[tokio::test]
    async fn elapsed_covers_the_next_stage() {
        let registry = Registry::new();
        let metrics = HttpMetrics::register(&registry).unwrap();

        let _: Result<(), Infallible> = track(&metrics, "GET", "/slow", async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        })
        .await;

        let snap = metrics.latency().snapshot();
        assert!(snap.sum >= 0.02, "sum was {}", snap.sum);
        // 20ms is above the 0.01 bound.
        assert_eq!(snap.buckets.get(1).map(|b| b.1), Some(0));
    }

    #[tokio::test]
    async fn panicking_stage_is_recorded_and_panic_propagates() {
        let registry = Registry::new();
        let metrics = HttpMetrics::register(&registry).unwrap();

        let m = metrics.clone();
        let handle = tokio::spawn(async move {
            track(&m, "GET", "/boom", async {
                if true {
                    panic!("handler fault");
                }
                Ok::<(), Infallible>(())
            })
            .await
        });

        let err = handle.await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(metrics.requests().get(&["GET", "/boom"]).unwrap(), 1);
        assert_eq!(metrics.latency().snapshot().count, 1);
    }

    #[tokio::test]
    async fn cancelled_stage_is_recorded_once() {
        let registry = Registry::new();
        let metrics = HttpMetrics::register(&registry).unwrap();

        let stalled = track(&metrics, "GET", "/stall", async {
            std::future::pending::<Result<(), Infallible>>().await
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(10), stalled).await;

        assert!(timed_out.is_err());
        assert_eq!(metrics.requests().get(&["GET", "/stall"]).unwrap(), 1);
        assert_eq!(metrics.latency().snapshot().count, 1);
    }
}
