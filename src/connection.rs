use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use bytes::Bytes;
use futures::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch, Notify, RwLock};
use tokio::time::sleep;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, trace, warn};

use crate::backoff::BackoffPolicy;
use crate::state::{ChannelSignal, ConnectionPhase};

/// One inbound WebSocket message payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

/// Owns the one logical channel to the Monitor.
///
/// `open()` spawns a background task that connects, pumps frames in both
/// directions, and reconnects with [`BackoffPolicy`] delays whenever the
/// channel is lost — indefinitely, until `close()` requests permanent
/// shutdown. The current [`ConnectionPhase`] is published on a watch
/// channel; inbound [`Frame`]s on a broadcast channel. All state lives on
/// this instance; callers hold it explicitly.
pub struct ConnectionManager {
    url: String,
    policy: BackoffPolicy,
    frame_tx: broadcast::Sender<Frame>,
    outbound_tx: Arc<RwLock<Option<mpsc::Sender<String>>>>,
    outbound_capacity: usize,
    state_tx: Arc<watch::Sender<ConnectionPhase>>,
    state_rx: watch::Receiver<ConnectionPhase>,
    stop_signal: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    channel_task: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

/// Everything the channel task needs, detached from the manager itself.
struct ChannelContext {
    url: String,
    policy: BackoffPolicy,
    frame_tx: broadcast::Sender<Frame>,
    state_tx: Arc<watch::Sender<ConnectionPhase>>,
    stop_signal: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
}

enum ChannelOutcome {
    Lost,
    Shutdown,
}

impl ConnectionManager {
    pub fn new(
        url: impl Into<String>,
        policy: BackoffPolicy,
        frame_capacity: usize,
        outbound_capacity: usize,
    ) -> Self {
        let (frame_tx, _) = broadcast::channel(frame_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(ConnectionPhase::Disconnected);

        Self {
            url: url.into(),
            policy,
            frame_tx,
            outbound_tx: Arc::new(RwLock::new(None)),
            outbound_capacity: outbound_capacity.max(1),
            state_tx: Arc::new(state_tx),
            state_rx,
            stop_signal: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            channel_task: Arc::new(RwLock::new(None)),
        }
    }

    /// Current phase of the channel lifecycle.
    pub fn current_state(&self) -> ConnectionPhase {
        *self.state_rx.borrow()
    }

    /// Watch the channel lifecycle.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionPhase> {
        self.state_tx.subscribe()
    }

    /// Subscribe to inbound frames.
    pub fn frame_receiver(&self) -> broadcast::Receiver<Frame> {
        self.frame_tx.subscribe()
    }

    /// Open the channel and start the background task. Any existing task
    /// and pending reconnect timer are cancelled first, so calling this on
    /// a live manager restarts the channel lifecycle from scratch.
    pub async fn open(&self) {
        info!(url = %self.url, "opening channel to monitor");
        self.halt_task().await;

        self.stop_signal.store(false, Ordering::SeqCst);
        // Drain any stale shutdown permit from a previous lifecycle.
        while self.shutdown_notify.notified().now_or_never().is_some() {}

        let (outbound_tx, outbound_rx) = mpsc::channel(self.outbound_capacity);
        *self.outbound_tx.write().await = Some(outbound_tx);

        // Fresh lifecycle: reset the phase directly rather than through the
        // transition table, since the previous lifecycle may have ended in
        // the terminal Closed phase.
        let _ = self.state_tx.send_replace(ConnectionPhase::Disconnected);
        apply_signal(&self.state_tx, ChannelSignal::OpenRequested);

        let ctx = ChannelContext {
            url: self.url.clone(),
            policy: self.policy,
            frame_tx: self.frame_tx.clone(),
            state_tx: self.state_tx.clone(),
            stop_signal: self.stop_signal.clone(),
            shutdown_notify: self.shutdown_notify.clone(),
        };

        let handle = tokio::spawn(run_channel(ctx, outbound_rx));
        *self.channel_task.write().await = Some(handle);
    }

    /// Hand a payload to the channel task. Effective only while Connected;
    /// otherwise the payload is logged and dropped — no buffering.
    pub async fn send(&self, payload: String) {
        let phase = self.current_state();
        if phase != ConnectionPhase::Connected {
            warn!(?phase, "dropping outbound payload, channel not connected");
            return;
        }

        let guard = self.outbound_tx.read().await;
        match guard.as_ref() {
            Some(tx) => {
                if let Err(err) = tx.try_send(payload) {
                    warn!(error = %err, "dropping outbound payload, queue unavailable");
                }
            }
            None => warn!("dropping outbound payload, channel not open"),
        }
    }

    /// Permanently shut the channel down: cancels any pending reconnect,
    /// closes the socket, and settles in the terminal Closed phase. No
    /// further automatic reconnection is attempted, even if a close event
    /// for the in-flight channel arrives afterwards.
    pub async fn close(&self) {
        info!("closing channel to monitor");
        self.halt_task().await;
        *self.outbound_tx.write().await = None;
        let _ = self.state_tx.send_replace(ConnectionPhase::Closed);
    }

    async fn halt_task(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();

        let handle = { self.channel_task.write().await.take() };
        if let Some(handle) = handle {
            debug!("awaiting channel task termination");
            if let Err(err) = handle.await {
                warn!(error = %err, "channel task join failed");
            }
        }
    }
}

// Make sure the background task winds down if the manager is dropped
// without an explicit close().
impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.url)
            .field("state", &self.current_state())
            .finish()
    }
}

fn apply_signal(state_tx: &watch::Sender<ConnectionPhase>, signal: ChannelSignal) {
    state_tx.send_if_modified(|phase| {
        let next = phase.transition(signal);
        if next != *phase {
            *phase = next;
            true
        } else {
            false
        }
    });
}

/// Outer lifecycle loop: connect, drive, back off, repeat. Only an explicit
/// shutdown breaks out; a never-reachable endpoint is retried forever at
/// the capped delay.
async fn run_channel(ctx: ChannelContext, mut outbound_rx: mpsc::Receiver<String>) {
    info!("channel task started");
    let mut delay = ctx.policy.initial_delay();

    loop {
        if ctx.stop_signal.load(Ordering::Relaxed) {
            break;
        }

        tokio::select! {
            biased;

            _ = ctx.shutdown_notify.notified() => {
                info!("channel task received shutdown notification");
                break;
            }

            attempt = connect_async(ctx.url.as_str()) => match attempt {
                Ok((stream, _response)) => {
                    info!(url = %ctx.url, "channel established");
                    apply_signal(&ctx.state_tx, ChannelSignal::ChannelEstablished);
                    // Successful connection resets the delay sequence.
                    delay = ctx.policy.initial_delay();

                    match drive_channel(&ctx, stream, &mut outbound_rx).await {
                        ChannelOutcome::Shutdown => break,
                        ChannelOutcome::Lost => {
                            warn!("channel lost, scheduling reconnect");
                            apply_signal(&ctx.state_tx, ChannelSignal::ChannelLost);
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "channel connect failed, scheduling reconnect");
                    apply_signal(&ctx.state_tx, ChannelSignal::ChannelLost);
                }
            }
        }

        if ctx.stop_signal.load(Ordering::Relaxed) {
            break;
        }

        debug!(?delay, "waiting before reconnect attempt");
        tokio::select! {
            biased;
            _ = ctx.shutdown_notify.notified() => {
                info!("shutdown requested during reconnect delay");
                break;
            }
            _ = sleep(delay) => {
                delay = ctx.policy.next_delay(delay);
                apply_signal(&ctx.state_tx, ChannelSignal::BackoffElapsed);
            }
        }
    }

    info!("channel task finished");
    let _ = ctx.state_tx.send_replace(ConnectionPhase::Closed);
}

/// Pump one established socket until it dies or shutdown is requested.
async fn drive_channel(
    ctx: &ChannelContext,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    outbound_rx: &mut mpsc::Receiver<String>,
) -> ChannelOutcome {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            biased;

            _ = ctx.shutdown_notify.notified() => {
                let _ = sink.send(Message::Close(None)).await;
                return ChannelOutcome::Shutdown;
            }

            outbound = outbound_rx.recv() => match outbound {
                Some(payload) => {
                    trace!(len = payload.len(), "sending payload to monitor");
                    if let Err(err) = sink.send(Message::Text(payload.into())).await {
                        warn!(error = %err, "failed to send payload");
                        return ChannelOutcome::Lost;
                    }
                }
                // Sender side replaced out from under us; treat as loss so
                // the outer loop re-checks the stop signal.
                None => return ChannelOutcome::Lost,
            },

            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let _ = ctx.frame_tx.send(Frame::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    let _ = ctx.frame_tx.send(Frame::Binary(data));
                }
                Some(Ok(Message::Ping(payload))) => {
                    trace!("ping -> pong");
                    if let Err(err) = sink.send(Message::Pong(payload)).await {
                        warn!(error = %err, "failed to answer ping");
                        return ChannelOutcome::Lost;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "monitor closed the channel");
                    return ChannelOutcome::Lost;
                }
                Some(Ok(_)) => {} // Pong / raw frames
                Some(Err(err)) => {
                    warn!(error = %err, "channel read error");
                    return ChannelOutcome::Lost;
                }
                None => {
                    info!("channel stream ended");
                    return ChannelOutcome::Lost;
                }
            }
        }
    }
}
