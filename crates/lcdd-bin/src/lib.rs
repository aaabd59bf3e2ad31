//! `lcdd` entrypoint: CLI parsing, logging setup, and the single loop task
//! that owns all server state (§5/§4.9).

use anyhow::{Context, Result};
use clap::Parser;
use lcdd_config::ServerConfig;
use lcdd_driver::{Driver, MemoryDriver, NullDriver};
use lcdd_events::{
    EventSourceRegistry, FrameClock, ServerEvent, ShutdownSignal, CLIENT_WRITE_CHANNEL_CAP,
    EVENT_CHANNEL_CAP,
};
use lcdd_model::ClientId;
use lcdd_proto::{commands::build_table, dispatch_line, CommandTable, Server, CLIENT_OUT_CAPACITY};
use lcdd_render::{RenderParams, Renderer};
use lcdd_wire::LineReader;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Once;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// A client is marked GONE if its outbound buffer stays full for longer
/// than this.
const BACKPRESSURE_TIMEOUT: Duration = Duration::from_secs(1);

/// CLI arguments, mirroring the shape of a typical daemon's flag set:
/// config path override, driver selection, port override, foreground mode.
#[derive(Parser, Debug)]
#[command(name = "lcdd", version, about = "LCD multiplexing display daemon")]
pub struct Args {
    /// Path to `lcdd.toml` (overrides discovery).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Driver backend to use: "null" or "memory" (headless/testing).
    #[arg(long = "driver")]
    pub driver: Option<String>,
    /// TCP port to listen on, overriding the config file.
    #[arg(long = "port")]
    pub port: Option<u16>,
    /// Stay attached to the controlling terminal and log to stderr too.
    #[arg(long = "foreground", default_value_t = false)]
    pub foreground: bool,
}

pub fn configure_logging(foreground: bool) -> Option<WorkerGuard> {
    let log_path = PathBuf::from("lcdd.log");
    let file_appender = tracing_appender::rolling::never(".", "lcdd.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let result = if foreground {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(nb_writer)
            .try_init()
    };
    match result {
        Ok(()) => {
            info!(target: "runtime", log_path = %log_path.display(), "logging configured");
            Some(guard)
        }
        Err(_) => None,
    }
}

pub fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn build_driver(name: &str) -> Box<dyn Driver> {
    match name {
        "memory" => Box::new(MemoryDriver::new(20, 4)),
        _ => Box::new(NullDriver::new()),
    }
}

/// Resolve CLI-overridable configuration: load the file, then layer `args`
/// on top.
pub fn resolve_config(args: &Args) -> Result<ServerConfig> {
    let mut config = lcdd_config::load_from(args.config.clone())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(driver) = &args.driver {
        config.driver = driver.clone();
    }
    Ok(config)
}

/// A running server: the bound address plus a handle that resolves once
/// the loop task exits (on `ServerEvent::Shutdown` or channel closure).
pub struct RunningServer {
    pub local_addr: SocketAddr,
    pub join: tokio::task::JoinHandle<()>,
}

/// Binds the listener, spawns the ambient event sources and the single
/// loop task, and returns immediately with the bound address — the loop
/// keeps running in the background until a shutdown signal arrives (or,
/// for tests, until the returned `join` handle is dropped/aborted).
pub async fn spawn_server(config: ServerConfig) -> Result<RunningServer> {
    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    let local_addr = listener.local_addr()?;
    info!(target: "runtime", addr = %local_addr, "listening");

    let (tx, rx) = mpsc::channel::<ServerEvent>(EVENT_CHANNEL_CAP);

    let mut sources = EventSourceRegistry::new();
    sources.register(FrameClock::new(config.frame_rate_hz));
    sources.register(ShutdownSignal);
    let source_handles = sources.spawn_all(&tx);

    let accept_handle = {
        let tx = tx.clone();
        let config = config.clone();
        tokio::spawn(async move { accept_loop(listener, tx, config).await })
    };
    drop(tx);

    let join = tokio::spawn(async move {
        let table = build_table();
        let mut server = Server::new(build_driver(&config.driver));
        let mut renderer = Renderer::new();
        let render_params = RenderParams {
            frame_rate_hz: config.frame_rate_hz,
            title_speed: 2,
            global_backlight_on: server.global_backlight_on,
            global_heartbeat_on: server.global_heartbeat_on,
        };

        event_loop(&mut server, &table, rx, &mut renderer, render_params).await;

        accept_handle.abort();
        for h in source_handles {
            let _ = h.await;
        }
    });

    Ok(RunningServer { local_addr, join })
}

/// Accepts connections, checks the IP allow-list, and spawns one
/// reader/writer task per client. That task owns the `TcpStream`; it never
/// touches `Server` state, only forwards lines in and raw bytes out.
async fn accept_loop(listener: TcpListener, tx: mpsc::Sender<ServerEvent>, config: ServerConfig) {
    let mut next_client_id: u64 = 1;
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(target: "runtime", error = %e, "accept failed");
                continue;
            }
        };
        if !config.is_allowed(peer.ip()) {
            warn!(target: "runtime", peer = %peer, "connection rejected by allow-list");
            continue;
        }

        let client = ClientId::from_raw(next_client_id);
        next_client_id += 1;
        let (out_tx, out_rx) = mpsc::channel::<Vec<u8>>(CLIENT_WRITE_CHANNEL_CAP);
        let (close_tx, close_rx) = tokio::sync::oneshot::channel();
        if tx
            .send(ServerEvent::Connected { client, writer: out_tx, close: close_tx })
            .await
            .is_err()
        {
            return;
        }

        let tx = tx.clone();
        tokio::spawn(async move { connection_task(socket, client, tx, out_rx, close_rx).await });
    }
}

/// Reads lines from one client socket into the shared event channel, and
/// concurrently drains the loop's outbound byte channel onto the same
/// socket. Neither direction blocks on the other; `close_rx` lets the loop
/// tear the connection down even when the peer never closes its side.
async fn connection_task(
    socket: TcpStream,
    client: ClientId,
    tx: mpsc::Sender<ServerEvent>,
    mut out_rx: mpsc::Receiver<Vec<u8>>,
    mut close_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let (mut read_half, mut write_half) = socket.into_split();
    let mut reader = LineReader::new();
    let mut buf = [0u8; 4096];

    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = out_rx.recv().await {
            if write_half.write_all(&bytes).await.is_err() {
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    loop {
        tokio::select! {
            biased;
            _ = &mut close_rx => break,
            result = read_half.read(&mut buf) => match result {
                Ok(0) => break,
                Ok(n) => {
                    reader.feed(&buf[..n]);
                    loop {
                        match reader.next_line() {
                            Ok(Some(line)) => {
                                if tx.send(ServerEvent::Line { client, text: line }).await.is_err() {
                                    writer_task.abort();
                                    return;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                warn!(target: "wire", client = client.raw(), error = ?e, "line too long, discarded");
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(target: "runtime", client = client.raw(), error = %e, "read error");
                    break;
                }
            },
        }
    }
    drop(read_half);
    let _ = writer_task.await;
    let _ = tx.send(ServerEvent::Disconnected { client }).await;
}

/// A connected client's half of the event loop: where to push outbound
/// bytes, how to force the socket shut once everything's flushed, and since
/// when its outbound channel has been refusing writes.
struct ClientHandle {
    out: mpsc::Sender<Vec<u8>>,
    close: Option<tokio::sync::oneshot::Sender<()>>,
    backpressure_since: Option<Instant>,
}

/// Drains `client`'s outbound `LineWriter` buffer into its connection
/// task's channel. If the channel is full — the socket isn't keeping up —
/// the unwritten bytes stay queued in `LineWriter` and the backpressure
/// clock starts; once it's run for longer than [`BACKPRESSURE_TIMEOUT`]
/// the client is reported as GONE (§5).
fn flush_client(server: &mut Server, client: ClientId, writers: &mut HashMap<ClientId, ClientHandle>) -> bool {
    let Some(handle) = writers.get_mut(&client) else { return false };
    let Some(c) = server.clients.get_mut(&client) else { return false };
    if c.out.is_empty() {
        handle.backpressure_since = None;
        return false;
    }
    let mut blocked = false;
    let _ = c.out.drain_into(|chunk| match handle.out.try_send(chunk.to_vec()) {
        Ok(()) => Ok(chunk.len()),
        Err(_) => {
            blocked = true;
            Ok(0)
        }
    });
    if blocked {
        let since = *handle.backpressure_since.get_or_insert_with(Instant::now);
        since.elapsed() >= BACKPRESSURE_TIMEOUT
    } else {
        handle.backpressure_since = None;
        false
    }
}

/// Flushes every connected client, returning the ones that have been
/// backpressured for too long and should be dropped as GONE.
fn flush_all(server: &mut Server, writers: &mut HashMap<ClientId, ClientHandle>) -> Vec<ClientId> {
    let ids: Vec<ClientId> = server.clients.keys().cloned().collect();
    let mut gone = Vec::new();
    for id in ids {
        if flush_client(server, id, writers) {
            gone.push(id);
        }
    }
    gone
}

/// Forces `client`'s connection task to close its socket once its queued
/// bytes have drained. Used when the server decides to end the connection
/// (`bye`, a `DispatchOutcome::Drop`, or persistent backpressure) rather
/// than the peer hanging up.
fn close_client(writers: &mut HashMap<ClientId, ClientHandle>, client: ClientId) {
    if let Some(handle) = writers.get_mut(&client) {
        if let Some(close) = handle.close.take() {
            let _ = close.send(());
        }
    }
}

/// Drops a client that's been unreachable for too long: marks it gone in
/// `Server`, forces its socket shut, and stops tracking it.
fn mark_gone(server: &mut Server, writers: &mut HashMap<ClientId, ClientHandle>, client: ClientId) {
    warn!(target: "runtime", client = client.raw(), "client backpressured for over 1s, marking GONE");
    server.drop_client(client);
    close_client(writers, client);
    writers.remove(&client);
}

/// The single loop task: every mutation to `Server` happens here, and here
/// only, satisfying §5's single-threaded-semantics requirement.
async fn event_loop(
    server: &mut Server,
    table: &CommandTable,
    mut rx: mpsc::Receiver<ServerEvent>,
    renderer: &mut Renderer,
    mut render_params: RenderParams,
) {
    let mut writers: HashMap<ClientId, ClientHandle> = HashMap::new();

    while let Some(event) = rx.recv().await {
        match event {
            ServerEvent::Connected { client, writer, close } => {
                server.clients.insert(client, lcdd_model::Client::new(client, CLIENT_OUT_CAPACITY));
                writers.insert(
                    client,
                    ClientHandle { out: writer, close: Some(close), backpressure_since: None },
                );
            }
            ServerEvent::Line { client, text } => {
                let should_close = dispatch_line(server, client, table, &text);
                let gone = flush_client(server, client, &mut writers);
                if should_close {
                    server.drop_client(client);
                    close_client(&mut writers, client);
                    writers.remove(&client);
                } else if gone {
                    mark_gone(server, &mut writers, client);
                }
            }
            ServerEvent::Disconnected { client } => {
                server.drop_client(client);
                writers.remove(&client);
            }
            ServerEvent::Tick => {
                server.frame_counter = server.frame_counter.wrapping_add(1);
                while let Some(key) = server.driver.poll_key() {
                    server.route_key(&key);
                }
                server.tick_scheduler();
                render_params.global_backlight_on = server.global_backlight_on;
                render_params.global_heartbeat_on = server.global_heartbeat_on;

                let menu_screen = if server.menu.is_open() {
                    Some(server.menu.render_screen(server.driver.width(), server.driver.height()))
                } else {
                    None
                };
                let current = if let Some(ref m) = menu_screen {
                    Some(m)
                } else {
                    server
                        .screen_list
                        .current()
                        .and_then(|(c, s)| server.clients.get(&c).and_then(|cl| cl.screen(&s)))
                };
                if let Err(e) = renderer.render_frame(current, server.driver.as_mut(), &render_params) {
                    warn!(target: "render", error = %e, "render_frame failed");
                }
                for id in flush_all(server, &mut writers) {
                    mark_gone(server, &mut writers, id);
                }
            }
            ServerEvent::Shutdown => {
                info!(target: "runtime", "shutdown requested");
                let ids: Vec<ClientId> = server.clients.keys().cloned().collect();
                for id in &ids {
                    server.enqueue(*id, "bye");
                }
                flush_all(server, &mut writers);
                for id in ids {
                    close_client(&mut writers, id);
                }
                break;
            }
        }
    }
}
