//! Per-connection session state: identity, registration flags, the inbound
//! line buffer and the outbound send primitive.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use log::warn;
use tokio::sync::RwLock;
use tokio::sync::mpsc::Sender;

use crate::channel::ChannelName;
use crate::message_models::OutboundLine;
use crate::replies::IrcReply;

/// Stable connection handle. Used as the key of the client map and as the
/// identity stored in channel member lists.
pub type ClientId = usize;

static NEXT_CLIENT_ID: AtomicUsize = AtomicUsize::new(1);

pub fn next_client_id() -> ClientId {
    NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Raised by [`LineBuffer::append`] when the soft cap is hit. The buffer has
/// already been discarded; the caller owes the peer one "too long" reply.
#[derive(Debug, PartialEq)]
pub struct BufferOverflow;

/// Inbound byte accumulator. Bytes arrive in arbitrary chunks; a message is
/// complete once the buffer holds a CRLF.
#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    cap: usize,
}

impl LineBuffer {
    pub fn new(cap: usize) -> Self {
        LineBuffer {
            buf: Vec::new(),
            cap,
        }
    }

    /// Appends one read's worth of bytes. If the buffer would grow past the
    /// cap it is cleared instead and the overflow is reported.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), BufferOverflow> {
        if self.buf.len() + chunk.len() > self.cap {
            self.buf.clear();
            return Err(BufferOverflow);
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Consumes and returns the next complete line, CRLF included. `None`
    /// means no complete line is pending.
    pub fn next_message(&mut self) -> Option<String> {
        let pos = self
            .buf
            .windows(2)
            .position(|window| window == b"\r\n")?;
        let line: Vec<u8> = self.buf.drain(..pos + 2).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug)]
struct SessionData {
    nickname: Option<String>,
    username: Option<String>,
    realname: Option<String>,
    hostname: String,
    authenticated: bool,
    registered: bool,
    cap_negotiating: bool,
    joined: HashSet<ChannelName>,
    last_activity: Instant,
}

/// Identity fields copied out under one lock acquisition, for reply
/// formatting without holding the session lock across sends.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub nickname: Option<String>,
    pub username: Option<String>,
    pub realname: Option<String>,
    pub hostname: String,
    pub registered: bool,
}

impl SessionSnapshot {
    /// Nickname for numeric addressing; `*` before one is set.
    pub fn nick(&self) -> &str {
        self.nickname.as_deref().unwrap_or("*")
    }

    /// `nick!user@host` source prefix for relayed lines.
    pub fn prefix(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nick(),
            self.username.as_deref().unwrap_or("*"),
            self.hostname
        )
    }
}

/// Shared handle to one client session. Cheap to clone; all clones observe
/// the same state and the same outbound queue.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: ClientId,
    data: Arc<RwLock<SessionData>>,
    tx_outbound: Sender<OutboundLine>,
}

impl Session {
    pub fn new(id: ClientId, hostname: String, tx_outbound: Sender<OutboundLine>) -> Self {
        Session {
            id,
            data: Arc::new(RwLock::new(SessionData {
                nickname: None,
                username: None,
                realname: None,
                hostname,
                authenticated: false,
                registered: false,
                cap_negotiating: false,
                joined: HashSet::new(),
                last_activity: Instant::now(),
            })),
            tx_outbound,
        }
    }

    /// Enqueues one protocol line on the connection's outbound queue. A
    /// failed send means the writer task is gone: the line is dropped with a
    /// warning and the removal path cleans the session up.
    pub async fn send(&self, line: String) {
        if self.tx_outbound.send(OutboundLine::new(line)).await.is_err() {
            warn!("[{}] outbound queue closed, dropped a reply", self.id);
        }
    }

    pub async fn reply(&self, reply: IrcReply<'_>) {
        self.send(reply.format()).await;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let data = self.data.read().await;
        SessionSnapshot {
            nickname: data.nickname.clone(),
            username: data.username.clone(),
            realname: data.realname.clone(),
            hostname: data.hostname.clone(),
            registered: data.registered,
        }
    }

    pub async fn nickname(&self) -> Option<String> {
        self.data.read().await.nickname.clone()
    }

    pub async fn set_nickname(&self, nickname: String) {
        self.data.write().await.nickname = Some(nickname);
    }

    pub async fn set_user(&self, username: String, realname: String) {
        let mut data = self.data.write().await;
        data.username = Some(username);
        data.realname = Some(realname);
    }

    pub async fn set_authenticated(&self) {
        self.data.write().await.authenticated = true;
    }

    pub async fn set_cap_negotiating(&self, negotiating: bool) {
        self.data.write().await.cap_negotiating = negotiating;
    }

    pub async fn is_registered(&self) -> bool {
        self.data.read().await.registered
    }

    /// Flips the registered flag exactly when authenticated, nick and user
    /// are set and no CAP negotiation is pending. Returns true only on the
    /// transition, so the caller sends the 001 welcome once.
    pub async fn try_complete_registration(&self) -> bool {
        let mut data = self.data.write().await;
        if data.registered {
            return false;
        }
        if data.authenticated
            && data.nickname.is_some()
            && data.username.is_some()
            && !data.cap_negotiating
        {
            data.registered = true;
            return true;
        }
        false
    }

    pub async fn touch(&self) {
        self.data.write().await.last_activity = Instant::now();
    }

    pub async fn idle_for(&self) -> Duration {
        self.data.read().await.last_activity.elapsed()
    }

    pub async fn add_joined(&self, channel: &ChannelName) {
        self.data.write().await.joined.insert(channel.clone());
    }

    pub async fn remove_joined(&self, channel: &str) {
        self.data.write().await.joined.remove(channel);
    }

    pub async fn joined_channels(&self) -> Vec<ChannelName> {
        self.data.read().await.joined.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn buffer_waits_for_crlf() {
        let mut buf = LineBuffer::new(64);
        buf.append(b"NICK te").unwrap();
        assert_eq!(buf.next_message(), None);
        buf.append(b"stuser\r\n").unwrap();
        assert_eq!(buf.next_message(), Some("NICK testuser\r\n".to_owned()));
        assert_eq!(buf.next_message(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn buffer_yields_lines_in_order() {
        let mut buf = LineBuffer::new(128);
        buf.append(b"PASS pw\r\nNICK a\r\nUSER a 0 * :A\r\n").unwrap();
        assert_eq!(buf.next_message(), Some("PASS pw\r\n".to_owned()));
        assert_eq!(buf.next_message(), Some("NICK a\r\n".to_owned()));
        assert_eq!(buf.next_message(), Some("USER a 0 * :A\r\n".to_owned()));
        assert_eq!(buf.next_message(), None);
    }

    #[test]
    fn buffer_overflow_discards_pending_bytes() {
        let mut buf = LineBuffer::new(8);
        buf.append(b"12345").unwrap();
        assert_eq!(buf.append(b"67890"), Err(BufferOverflow));
        assert!(buf.is_empty());
        // the connection survives and can buffer again
        buf.append(b"PING x\r\n").unwrap();
        assert_eq!(buf.next_message(), Some("PING x\r\n".to_owned()));
    }

    #[tokio::test]
    async fn registration_needs_all_three_flags() {
        let (tx, _rx) = mpsc::channel(8);
        let session = Session::new(1, "127.0.0.1".to_owned(), tx);

        session.set_nickname("alice".to_owned()).await;
        session.set_user("alice".to_owned(), "Alice".to_owned()).await;
        assert!(!session.try_complete_registration().await);

        session.set_authenticated().await;
        assert!(session.try_complete_registration().await);
        assert!(session.is_registered().await);
        // only the transition reports true
        assert!(!session.try_complete_registration().await);
    }

    #[tokio::test]
    async fn cap_negotiation_blocks_registration() {
        let (tx, _rx) = mpsc::channel(8);
        let session = Session::new(2, "127.0.0.1".to_owned(), tx);

        session.set_authenticated().await;
        session.set_nickname("bob".to_owned()).await;
        session.set_user("bob".to_owned(), "Bob".to_owned()).await;
        session.set_cap_negotiating(true).await;
        assert!(!session.try_complete_registration().await);

        session.set_cap_negotiating(false).await;
        assert!(session.try_complete_registration().await);
    }

    #[tokio::test]
    async fn snapshot_prefix_uses_star_placeholders() {
        let (tx, _rx) = mpsc::channel(8);
        let session = Session::new(3, "10.0.0.1".to_owned(), tx);
        assert_eq!(session.snapshot().await.prefix(), "*!*@10.0.0.1");

        session.set_nickname("carol".to_owned()).await;
        session.set_user("carol".to_owned(), "Carol".to_owned()).await;
        assert_eq!(session.snapshot().await.prefix(), "carol!carol@10.0.0.1");
    }
}
