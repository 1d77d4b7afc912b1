//! PRIVMSG delivery to channels and to single users.

use crate::replies::IrcReply;
use crate::server_state::ServerState;
use crate::session::Session;

//    Command: PRIVMSG
// Parameters: <target> :<text>
//
// A `#`/`&` target is a channel: it must exist and the sender must be a
// member; the line fans out to every other member. Anything else is treated
// as a nickname and delivered directly.
pub async fn handle_privmsg(state: &ServerState, session: &Session, target: &str, text: &str) {
    let snapshot = session.snapshot().await;
    let nick = snapshot.nick();
    let prefix = snapshot.prefix();
    let relay = IrcReply::PrivmsgRelay {
        prefix: &prefix,
        target,
        text,
    }
    .format();

    if target.starts_with('#') || target.starts_with('&') {
        let Some(channel) = state.channel(target) else {
            session
                .reply(IrcReply::NoSuchChannel {
                    nick,
                    channel: target,
                })
                .await;
            return;
        };
        if !channel.is_member(session.id) {
            session
                .reply(IrcReply::NoChannelAccess {
                    nick,
                    channel: target,
                })
                .await;
            return;
        }
        channel
            .broadcast(&state.clients, &relay, Some(session.id))
            .await;
    } else {
        let Some(peer) = state.session_by_nick(target).await else {
            session.reply(IrcReply::NoSuchNick { nick, target }).await;
            return;
        };
        peer.send(relay).await;
    }
}
