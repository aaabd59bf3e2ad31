//! Server-wide event channel (§4.9 ambient stack) feeding the single-threaded
//! main loop in `lcdd-bin`. Everything that can happen to the server —
//! a client connecting, a line arriving, a disconnect, the frame clock
//! ticking — is funneled through one bounded `mpsc` channel so the loop
//! never has to reason about concurrent mutation of [`lcdd_proto::Server`].

use lcdd_model::ClientId;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Channel capacity; generous relative to expected line/tick volume so a
/// slow tick doesn't apply backpressure to client input under normal load.
pub const EVENT_CHANNEL_CAP: usize = 4096;

/// Capacity of a client's outbound byte channel. Bounded (rather than
/// unbounded) so the loop can detect a client that isn't draining — see
/// §5's one-second GONE-marking rule.
pub const CLIENT_WRITE_CHANNEL_CAP: usize = 64;

/// Everything the main loop reacts to.
#[derive(Debug)]
pub enum ServerEvent {
    /// A new TCP client connected. `writer` is the raw-byte sink back to
    /// its connection task, which owns the actual `TcpStream` — the loop
    /// task never touches sockets directly, only `lcdd_wire::LineWriter`
    /// buffers that it drains into this channel. `close` lets the loop
    /// force the connection shut (e.g. after `bye`) once its outstanding
    /// bytes are flushed, since dropping `writer` alone only stops the
    /// write side and leaves the read half blocked on the peer.
    Connected {
        client: ClientId,
        writer: Sender<Vec<u8>>,
        close: oneshot::Sender<()>,
    },
    /// One newline-terminated line arrived from `client`.
    Line { client: ClientId, text: String },
    /// `client`'s socket was closed (by either side) or its task errored out.
    Disconnected { client: ClientId },
    /// The frame clock advanced one tick (§4.3).
    Tick,
    /// SIGINT/SIGTERM observed; the loop should wind down gracefully.
    Shutdown,
}

/// Implemented by any background producer of [`ServerEvent`]s. Each source
/// owns one spawned task that pushes events into the shared channel until
/// either it decides to stop or the channel closes.
pub trait AsyncEventSource: Send + 'static {
    /// Stable name used in logging.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task.
    fn spawn(self: Box<Self>, tx: Sender<ServerEvent>) -> JoinHandle<()>;
}

/// Holds event sources until startup, then spawns them all at once.
#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn every registered source, each with its own clone of `tx`.
    /// Drop the caller's own `tx` before awaiting shutdown so sources see
    /// the channel close and exit.
    pub fn spawn_all(&mut self, tx: &Sender<ServerEvent>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Drives the scheduler at a fixed rate (§4.3's `PROCESS_FREQ`).
pub struct FrameClock {
    interval: std::time::Duration,
}

impl FrameClock {
    pub fn new(frame_rate_hz: u32) -> Self {
        let hz = frame_rate_hz.max(1) as f64;
        Self { interval: std::time::Duration::from_secs_f64(1.0 / hz) }
    }
}

impl AsyncEventSource for FrameClock {
    fn name(&self) -> &'static str {
        "frame_clock"
    }

    fn spawn(self: Box<Self>, tx: Sender<ServerEvent>) -> JoinHandle<()> {
        let period = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(ServerEvent::Tick).await.is_err() {
                    break;
                }
            }
        })
    }
}

/// Resolves when SIGINT or SIGTERM (on unix) is received, then emits one
/// [`ServerEvent::Shutdown`].
pub struct ShutdownSignal;

impl AsyncEventSource for ShutdownSignal {
    fn name(&self) -> &'static str {
        "shutdown_signal"
    }

    fn spawn(self: Box<Self>, tx: Sender<ServerEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!(target: "runtime.events", error = %e, "failed to install SIGTERM handler");
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
            let _ = tx.send(ServerEvent::Shutdown).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn frame_clock_emits_ticks() {
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAP);
        let mut reg = EventSourceRegistry::new();
        reg.register(FrameClock::new(200));
        let handles = reg.spawn_all(&tx);

        let ev = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("should receive within timeout")
            .expect("channel open");
        assert!(matches!(ev, ServerEvent::Tick));

        drop(tx);
        for h in handles {
            let _ = tokio::time::timeout(Duration::from_millis(50), h).await;
        }
    }

    #[tokio::test]
    async fn registry_sources_exit_on_channel_drop() {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAP);
        let mut reg = EventSourceRegistry::new();
        reg.register(FrameClock::new(1000));
        let handles = reg.spawn_all(&tx);
        drop(tx);
        drop(rx);
        for h in handles {
            tokio::time::timeout(Duration::from_millis(100), h)
                .await
                .expect("source should exit promptly on channel close")
                .expect("source task should not panic");
        }
    }
}
