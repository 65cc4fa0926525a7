//! Serial delivery of encoded payloads.

use crate::{uploader, Error, HttpClient};
use bytes::Bytes;
use http::Uri;
use std::{
    collections::VecDeque,
    pin::pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::{runtime::Handle, sync::Notify};
use tracing::{debug, warn};

/// FIFO delivery of payloads with at most one request in flight.
///
/// Every submitted payload is sent exactly once, in submission order. A failed send is logged
/// and delivery continues with the next payload.
#[derive(Debug)]
pub struct DeliveryEngine<C> {
    inner: Arc<Inner<C>>,
    max_backlog: Option<usize>,
}

#[derive(Debug)]
struct Inner<C> {
    client: C,
    endpoint: Uri,
    runtime: Handle,
    state: Mutex<State>,
    idle: Notify,
}

#[derive(Debug, Default)]
struct State {
    backlog: VecDeque<Bytes>,
    in_flight: bool,
}

impl<C: HttpClient + 'static> DeliveryEngine<C> {
    /// Create an engine sending to `endpoint` with `client`. Sends are spawned on `runtime`.
    pub fn new(client: C, endpoint: Uri, runtime: Handle) -> Self {
        DeliveryEngine {
            inner: Arc::new(Inner {
                client,
                endpoint,
                runtime,
                state: Mutex::new(State::default()),
                idle: Notify::new(),
            }),
            max_backlog: None,
        }
    }

    /// Limit the number of payloads waiting behind the one in flight.
    ///
    /// Once the limit is reached, newly submitted payloads are rejected. Unbounded by default.
    pub fn with_max_backlog(mut self, max_backlog: usize) -> Self {
        self.max_backlog = Some(max_backlog);
        self
    }

    /// Queue a payload for delivery, starting a send right away if none is in flight.
    pub fn submit(&self, payload: Bytes) -> Result<(), Error> {
        let mut state = self.inner.lock_state();
        if state.in_flight {
            if let Some(max) = self.max_backlog {
                if state.backlog.len() >= max {
                    drop(state);
                    warn!(max_backlog = max, "Delivery backlog full, dropping telemetry");
                    return Err(Error::BacklogFull(max));
                }
            }
            state.backlog.push_back(payload);
            return Ok(());
        }
        state.in_flight = true;
        drop(state);

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(drain(inner, payload));
        Ok(())
    }

    /// Wait until every submitted payload has been sent.
    pub async fn flush(&self) {
        loop {
            let mut notified = pin!(self.inner.idle.notified());
            notified.as_mut().enable();
            if !self.is_in_flight() {
                return;
            }
            notified.await;
        }
    }

    /// Track endpoint payloads are sent to.
    pub fn endpoint(&self) -> &Uri {
        &self.inner.endpoint
    }

    /// Whether a send is currently in progress.
    pub fn is_in_flight(&self) -> bool {
        self.inner.lock_state().in_flight
    }

    /// Number of payloads waiting behind the one in flight.
    pub fn backlog_len(&self) -> usize {
        self.inner.lock_state().backlog.len()
    }
}

impl<C> Inner<C> {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sends one payload on its own task. A panicking transport counts as a failed send.
async fn send_isolated<C: HttpClient + 'static>(
    inner: &Arc<Inner<C>>,
    payload: Bytes,
) -> Result<(), Error> {
    let task_inner = Arc::clone(inner);
    inner
        .runtime
        .spawn(async move {
            uploader::send(&task_inner.client, &task_inner.endpoint, payload).await
        })
        .await
        .unwrap_or_else(|err| Err(Error::UploadConnection(err.into())))
}

async fn drain<C: HttpClient + 'static>(inner: Arc<Inner<C>>, mut payload: Bytes) {
    loop {
        let len = payload.len();
        match send_isolated(&inner, payload).await {
            Ok(()) => debug!(bytes = len, "Telemetry sent"),
            Err(err) => warn!(error = %err, "Telemetry delivery failed, payload dropped"),
        }

        let next = {
            let mut state = inner.lock_state();
            let next = state.backlog.pop_front();
            if next.is_none() {
                state.in_flight = false;
            }
            next
        };
        match next {
            Some(next) => payload = next,
            None => {
                inner.idle.notify_waiters();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpError;
    use async_trait::async_trait;
    use http::{Request, Response};
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    #[derive(Debug, Default)]
    struct StubClient {
        fail: bool,
        delay: Duration,
        active: AtomicUsize,
        max_active: AtomicUsize,
        bodies: Mutex<Vec<Bytes>>,
    }

    #[async_trait]
    impl HttpClient for StubClient {
        async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.bodies.lock().unwrap().push(request.into_body());
            self.active.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                Err("connection refused".into())
            } else {
                Ok(Response::builder().status(200).body(Bytes::new())?)
            }
        }
    }

    fn engine(client: StubClient) -> (DeliveryEngine<Arc<StubClient>>, Arc<StubClient>) {
        let client = Arc::new(client);
        let engine = DeliveryEngine::new(
            Arc::clone(&client),
            Uri::from_static("https://example.com/v2/track"),
            Handle::current(),
        );
        (engine, client)
    }

    fn payload(i: usize) -> Bytes {
        Bytes::from(i.to_string())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sends_in_submission_order_one_at_a_time() {
        let (engine, client) = engine(StubClient {
            delay: Duration::from_millis(5),
            ..Default::default()
        });
        for i in 0..10 {
            engine.submit(payload(i)).unwrap();
        }
        assert!(engine.is_in_flight());
        engine.flush().await;

        let bodies = client.bodies.lock().unwrap().clone();
        assert_eq!((0..10).map(payload).collect::<Vec<_>>(), bodies);
        assert_eq!(1, client.max_active.load(Ordering::SeqCst));
        assert!(!engine.is_in_flight());
        assert_eq!(0, engine.backlog_len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_transport_drains_to_empty() {
        let (engine, client) = engine(StubClient {
            fail: true,
            ..Default::default()
        });
        for i in 0..5 {
            engine.submit(payload(i)).unwrap();
        }
        engine.flush().await;

        assert_eq!(5, client.bodies.lock().unwrap().len());
        assert!(!engine.is_in_flight());
        assert_eq!(0, engine.backlog_len());

        engine.submit(payload(5)).unwrap();
        engine.flush().await;
        assert_eq!(6, client.bodies.lock().unwrap().len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn full_backlog_rejects_newest() {
        let (engine, client) = engine(StubClient {
            delay: Duration::from_millis(100),
            ..Default::default()
        });
        let engine = engine.with_max_backlog(2);
        engine.submit(payload(0)).unwrap();
        engine.submit(payload(1)).unwrap();
        engine.submit(payload(2)).unwrap();
        assert_eq!(2, engine.backlog_len());
        assert!(matches!(
            engine.submit(payload(3)),
            Err(Error::BacklogFull(2))
        ));
        engine.flush().await;

        let bodies = client.bodies.lock().unwrap().clone();
        assert_eq!(vec![payload(0), payload(1), payload(2)], bodies);
    }

    #[derive(Debug, Default)]
    struct PanicsOnFirstSend {
        bodies: Mutex<Vec<Bytes>>,
    }

    #[async_trait]
    impl HttpClient for PanicsOnFirstSend {
        async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            let first = {
                let mut bodies = self.bodies.lock().unwrap();
                bodies.push(request.into_body());
                bodies.len() == 1
            };
            if first {
                panic!("transport crashed");
            }
            Ok(Response::builder().status(200).body(Bytes::new())?)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_transport_fails_only_that_payload() {
        let client = Arc::new(PanicsOnFirstSend::default());
        let engine = DeliveryEngine::new(
            Arc::clone(&client),
            Uri::from_static("https://example.com/v2/track"),
            Handle::current(),
        );
        engine.submit(payload(0)).unwrap();
        engine.submit(payload(1)).unwrap();
        tokio::time::timeout(Duration::from_secs(5), engine.flush())
            .await
            .expect("flush completes after a panicking send");
        assert!(!engine.is_in_flight());

        engine.submit(payload(2)).unwrap();
        tokio::time::timeout(Duration::from_secs(5), engine.flush())
            .await
            .expect("engine keeps delivering");

        let bodies = client.bodies.lock().unwrap().clone();
        assert_eq!(vec![payload(0), payload(1), payload(2)], bodies);
        assert_eq!(0, engine.backlog_len());
    }

    #[tokio::test]
    async fn flush_when_idle_returns_immediately() {
        let (engine, _client) = engine(StubClient::default());
        engine.flush().await;
        assert!(!engine.is_in_flight());
    }
}
