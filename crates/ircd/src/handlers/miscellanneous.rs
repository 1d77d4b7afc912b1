//! Liveness probes and user queries: PING, PONG, WHOIS.

use crate::replies::IrcReply;
use crate::server_state::ServerState;
use crate::session::Session;

//    Command: PING
// Parameters: <token>
//
// The reply is the bare `PONG <token>` line, no server prefix.
pub async fn handle_ping(session: &Session, token: &str) {
    session.reply(IrcReply::Pong { token }).await;
}

//    Command: WHOIS
// Parameters: <nickname>
//
// Emits the 311/312/318 triple for the target.
pub async fn handle_whois(state: &ServerState, session: &Session, target_nick: &str) {
    let snapshot = session.snapshot().await;
    let nick = snapshot.nick();
    let Some(target) = state.session_by_nick(target_nick).await else {
        session
            .reply(IrcReply::NoSuchNick {
                nick,
                target: target_nick,
            })
            .await;
        return;
    };
    let target_snapshot = target.snapshot().await;
    session
        .reply(IrcReply::WhoisUser {
            nick,
            target: target_snapshot.nick(),
            username: target_snapshot.username.as_deref().unwrap_or("*"),
            host: &target_snapshot.hostname,
            realname: target_snapshot.realname.as_deref().unwrap_or(""),
        })
        .await;
    session
        .reply(IrcReply::WhoisServer {
            nick,
            target: target_snapshot.nick(),
        })
        .await;
    session
        .reply(IrcReply::EndOfWhois {
            nick,
            target: target_snapshot.nick(),
        })
        .await;
}
