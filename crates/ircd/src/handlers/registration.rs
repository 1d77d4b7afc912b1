//! The registration handshake: PASS, NICK, USER and the CAP acknowledgement
//! dance. A session becomes registered exactly when it is authenticated, has
//! a nickname and a username, and is not negotiating capabilities.

use crate::replies::IrcReply;
use crate::server_state::ServerState;
use crate::session::Session;

//    Command: PASS
// Parameters: <password>
//
// The password must match the server password given on the command line.
// A mismatch keeps the session alive but unauthenticated.
pub async fn handle_pass(state: &ServerState, session: &Session, password: &str) {
    if password != state.password() {
        session.reply(IrcReply::PasswordMismatch).await;
        return;
    }
    session.set_authenticated().await;
    complete_registration_if_ready(session).await;
}

//    Command: NICK
// Parameters: <nickname>
//
// Also serves post-registration renames; those share the uniqueness check
// and are not broadcast.
pub async fn handle_nick(state: &ServerState, session: &Session, nickname: String) {
    if state.nick_in_use(&nickname).await {
        session
            .reply(IrcReply::NicknameInUse { nick: &nickname })
            .await;
        return;
    }
    session.set_nickname(nickname).await;
    complete_registration_if_ready(session).await;
}

//    Command: USER
// Parameters: <username> <mode> <unused> :<realname>
pub async fn handle_user(session: &Session, username: String, realname: String) {
    session.set_user(username, realname).await;
    complete_registration_if_ready(session).await;
}

//    Command: CAP
// Parameters: <subcommand> [params]
//
// This server offers no capabilities: LS/REQ/ACK are acknowledged with an
// empty list while holding registration open, END releases it.
pub async fn handle_cap(session: &Session, subcommand: &str) {
    match subcommand {
        "LS" => {
            session.reply(IrcReply::CapAck { subcommand: "LS" }).await;
            session.set_cap_negotiating(true).await;
        }
        "REQ" | "ACK" => {
            session.reply(IrcReply::CapAck { subcommand: "ACK" }).await;
            session.set_cap_negotiating(true).await;
        }
        "END" => {
            session.set_cap_negotiating(false).await;
        }
        _ => {
            let snapshot = session.snapshot().await;
            session
                .reply(IrcReply::UnknownCommand {
                    nick: snapshot.nick(),
                    command: "CAP",
                })
                .await;
            return;
        }
    }
    complete_registration_if_ready(session).await;
}

async fn complete_registration_if_ready(session: &Session) {
    if session.try_complete_registration().await {
        let snapshot = session.snapshot().await;
        session
            .reply(IrcReply::Welcome {
                nick: snapshot.nick(),
            })
            .await;
    }
}
