use std::{io, sync::Arc};

use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{Instant, Sleep},
};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::{Capture, Receive, Transmit},
    error::{Error, Result},
    probe::{Classification, DeadlineAnchor, Deadlines, ProbeStrategy, ResponderIdentity},
    range::NetworkRange,
};

/// Outcome of one census run.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct DiscoveryResult {
    /// Number of replies counted before the deadline. Every reply counts, so a
    /// host answering twice is counted twice.
    pub count: usize,
    /// Responders in order of arrival.
    pub responders: Vec<ResponderIdentity>,
}

impl DiscoveryResult {
    /// Count reported when the capture handle could not be opened.
    pub const HANDLE_OPEN_FAILED: i64 = -1;

    fn record(&mut self, responder: ResponderIdentity) {
        self.count += 1;
        self.responders.push(responder);
    }
}

/// Maps a census outcome onto a plain count.
///
/// A handle that could not be opened yields [`DiscoveryResult::HANDLE_OPEN_FAILED`];
/// every other error is passed through, so an aborted sweep never reports a
/// partial count.
pub fn count_or_sentinel(result: Result<DiscoveryResult>) -> Result<i64> {
    match result {
        Ok(result) => Ok(result.count as i64),
        Err(Error::HandleOpen(err)) => {
            log::error!("capture unavailable, reason: {}", err);
            Ok(DiscoveryResult::HANDLE_OPEN_FAILED)
        }
        Err(err) => Err(err),
    }
}

/// Sweeps a subnet with one probe per host and counts the replies.
///
/// A run opens the capture, hands its read half to a background listener,
/// transmits probes in ascending address order from the calling task and then
/// waits for the listener to report once its deadline has passed.
///
/// # Example
/// ```no_run
/// use async_census::{capture::IcmpCapture, census::Census, echo::EchoStrategy, range::NetworkRange};
/// use std::net::Ipv4Addr;
///
/// tokio_test::block_on(async {
///     let census = Census::new(EchoStrategy::new(std::process::id() as u16));
///     let range = NetworkRange::new(Ipv4Addr::new(192, 168, 1, 0), 24).unwrap();
///     let result = census.discover(&IcmpCapture::new(), &range).await.unwrap();
///     println!("connected hosts: {}", result.count);
/// })
/// ```
#[derive(Debug)]
pub struct Census<S> {
    strategy: Arc<S>,
}

impl<S: ProbeStrategy> Census<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            strategy: Arc::new(strategy),
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Runs a single census over `range`.
    ///
    /// # Errors
    /// Returns [`Error::HandleOpen`] if the capture could not be opened and
    /// [`Error::Transmit`] if sending any probe fails; in the latter case the
    /// replies counted so far are discarded.
    pub async fn discover<C: Capture>(
        &self,
        capture: &C,
        range: &NetworkRange,
    ) -> Result<DiscoveryResult> {
        let (mut sender, receiver) = capture.open().map_err(Error::HandleOpen)?;
        let opened = Instant::now();
        let deadlines = self.strategy.deadlines();
        log::debug!("sweeping {} ({} hosts)", range, range.hosts().len());

        let (result_tx, result_rx) = oneshot::channel();
        let mut task_spawner = BackgroundTaskSpawner::new();
        task_spawner.spawn(
            Listener::new(receiver, Arc::clone(&self.strategy)),
            deadlines,
            opened,
            result_tx,
        );

        let handle_deadline = deadlines.handle.map(|handle| opened + handle);
        self.transmit_all(&mut sender, range, handle_deadline).await?;
        log::debug!("all probes sent to {}, awaiting listener", range);

        let result = result_rx.await.map_err(|_| Error::ListenerLost)?;
        log::debug!("{} replies counted on {}", result.count, range);
        Ok(result)
    }

    async fn transmit_all<T: Transmit>(
        &self,
        sender: &mut T,
        range: &NetworkRange,
        handle_deadline: Option<Instant>,
    ) -> Result<()> {
        for target in range.hosts() {
            let probe = self.strategy.encode(target)?;
            let sent = match handle_deadline {
                Some(limit) if Instant::now() >= limit => Err(handle_expired()),
                Some(limit) => tokio::time::timeout_at(limit, sender.transmit(&probe))
                    .await
                    .unwrap_or_else(|_| Err(handle_expired())),
                None => sender.transmit(&probe).await,
            };
            sent.map_err(|source| Error::Transmit { target, source })?;
            // senders may complete without suspending; let the listener drain replies
            tokio::task::yield_now().await;
        }
        Ok(())
    }
}

fn handle_expired() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "capture handle deadline exceeded")
}

/// Instant at which the listener stops counting.
fn listen_deadline(deadlines: &Deadlines, opened: Instant, started: Instant) -> Instant {
    let anchor = match deadlines.listen_from {
        DeadlineAnchor::HandleOpen => opened,
        DeadlineAnchor::ListenerStart => started,
    };
    let deadline = anchor + deadlines.listen;
    match deadlines.handle {
        Some(handle) => deadline.min(opened + handle),
        None => deadline,
    }
}

struct Listener<R, S> {
    receiver: R,
    strategy: Arc<S>,
}

impl<R: Receive, S: ProbeStrategy> Listener<R, S> {
    fn new(receiver: R, strategy: Arc<S>) -> Self {
        Self { receiver, strategy }
    }

    async fn listen(mut self, deadline: Sleep) -> DiscoveryResult {
        let mut result = DiscoveryResult::default();
        let mut readable = true;
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => break,
                record = self.receiver.receive(), if readable => {
                    match record {
                        Ok(record) => match self.strategy.classify(&record) {
                            Classification::Reply(responder) => {
                                log::info!("{}", responder);
                                result.record(responder);
                            }
                            Classification::SelfReply => log::trace!("skipping own reply"),
                            Classification::NotRelevant => {}
                        },
                        Err(err) => {
                            log::warn!("stopped reading replies, reason: {}", err);
                            readable = false;
                        }
                    }
                }
            }
        }
        log::debug!("listen deadline reached");
        result
    }
}

#[derive(Debug)]
struct BackgroundTaskSpawner {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTaskSpawner {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            handle: None,
        }
    }

    fn spawn<R, S>(
        &mut self,
        listener: Listener<R, S>,
        deadlines: Deadlines,
        opened: Instant,
        result_tx: oneshot::Sender<DiscoveryResult>,
    ) where
        R: Receive + Send + 'static,
        S: ProbeStrategy,
    {
        let token = self.token.clone();
        let handle = tokio::task::spawn(async move {
            let deadline = listen_deadline(&deadlines, opened, Instant::now());
            tokio::select! {
                result = listener.listen(tokio::time::sleep_until(deadline)) => {
                    let _ = result_tx.send(result);
                },
                _ = token.cancelled() => {
                    log::debug!("listener cancelled");
                }
            }
        });
        self.handle = Some(handle);
    }
}

impl Drop for BackgroundTaskSpawner {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.token.cancel();
        }
    }
}
