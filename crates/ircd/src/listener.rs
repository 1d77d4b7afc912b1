//! The listener and the per-connection tasks: accepting sockets, feeding
//! inbound bytes to the manager, draining outbound queues and sweeping idle
//! sessions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, timeout};

use crate::config::ServerOptions;
use crate::constants::{MAX_INBOUND_BUFFER, READ_BUFFER_SIZE};
use crate::errors::InternalIrcError;
use crate::message_models::OutboundLine;
use crate::replies::IrcReply;
use crate::server_state::ServerState;
use crate::session::{ClientId, LineBuffer, Session, next_client_id};

// Size of the personal outbound queue drained by the writer task.
const OUTBOUND_CHANNEL_SIZE: usize = 32;

// The reader wakes up at this cadence even without traffic so it can notice
// that the session was removed elsewhere (idle expiry, kick of the socket).
const READ_POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Binds the listening socket and runs the accept loop until SIGINT.
pub async fn run(options: ServerOptions) -> Result<(), InternalIrcError> {
    let listener =
        TcpListener::bind((options.config.bind_address.as_str(), options.port)).await?;
    info!(
        "Server initialized on {}:{}",
        options.config.bind_address, options.port
    );

    let state = Arc::new(ServerState::new(options.password.clone()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    tokio::spawn(idle_sweeper(
        state.clone(),
        Duration::from_secs(options.config.client_time_to_live_secs),
        options.config.ping_at_half_time,
        shutdown_rx.clone(),
    ));

    let mut shutdown = shutdown_rx;
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((socket, addr)) => handle_client(socket, addr, state.clone()).await,
                Err(e) => warn!("failed to accept connection: {e}"),
            }
        }
    }

    info!("shutting down, disconnecting all clients");
    let ids: Vec<ClientId> = state.clients.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        state.remove_client(id).await;
    }
    info!("Server shut down");
    Ok(())
}

/// Registers a fresh session for an accepted socket and spawns its reader
/// and writer tasks. The client map holds the only long-lived session
/// handle; when the manager removes it, both tasks wind down.
async fn handle_client(socket: TcpStream, addr: SocketAddr, state: Arc<ServerState>) {
    info!("Client connected: {addr:?}");
    let (tx_outbound, rx_outbound) = mpsc::channel::<OutboundLine>(OUTBOUND_CHANNEL_SIZE);
    let client_id = next_client_id();
    let session = Session::new(client_id, addr.ip().to_string(), tx_outbound);
    state.add_client(session.clone());
    session.reply(IrcReply::Banner).await;
    drop(session);

    let (read_half, write_half) = socket.into_split();
    tokio::spawn(client_reader_task(read_half, client_id, state.clone()));
    tokio::spawn(client_writer_task(write_half, client_id, rx_outbound, state));
}

async fn client_reader_task(
    mut reader: OwnedReadHalf,
    client_id: ClientId,
    state: Arc<ServerState>,
) {
    let mut buffer = LineBuffer::new(MAX_INBOUND_BUFFER);
    let mut chunk = [0u8; READ_BUFFER_SIZE];
    loop {
        let read = match timeout(READ_POLL_TIMEOUT, reader.read(&mut chunk)).await {
            Err(_elapsed) => {
                if state.session(client_id).is_none() {
                    break;
                }
                continue;
            }
            Ok(Ok(0)) => {
                info!("[{client_id}] peer closed the connection");
                state.remove_client(client_id).await;
                break;
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                error!("[{client_id}] read failed: {e}");
                state.remove_client(client_id).await;
                break;
            }
        };
        let Some(session) = state.session(client_id) else {
            break;
        };
        if buffer.append(&chunk[..read]).is_err() {
            let snapshot = session.snapshot().await;
            session
                .reply(IrcReply::InputTooLong {
                    nick: snapshot.nick(),
                })
                .await;
            continue;
        }
        while let Some(line) = buffer.next_message() {
            state.handle_line(client_id, &line).await;
        }
    }
}

async fn client_writer_task(
    mut writer: OwnedWriteHalf,
    client_id: ClientId,
    mut rx_outbound: mpsc::Receiver<OutboundLine>,
    state: Arc<ServerState>,
) {
    while let Some(message) = rx_outbound.recv().await {
        if let Err(e) = writer.write_all(message.as_bytes()).await {
            error!("[{client_id}] write failed: {e}");
            state.remove_client(client_id).await;
            break;
        }
    }
    let _ = writer.shutdown().await;
}

/// Periodic liveness sweep: a server PING once a session is idle past half
/// the deadline, removal (after a courtesy notice) once the deadline is
/// reached.
async fn idle_sweeper(
    state: Arc<ServerState>,
    time_to_live: Duration,
    ping_at_half_time: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }
        let sessions: Vec<Session> = state
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for session in sessions {
            let idle = session.idle_for().await;
            if idle >= time_to_live {
                info!("[{}] idle deadline reached, removing", session.id);
                session.reply(IrcReply::ConnectionClosed).await;
                state.remove_client(session.id).await;
            } else if ping_at_half_time && idle >= time_to_live / 2 {
                session.reply(IrcReply::PingToClient).await;
            }
        }
    }
}
