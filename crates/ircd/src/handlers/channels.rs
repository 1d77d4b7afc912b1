//! Channel operations: JOIN, TOPIC, KICK, INVITE and channel MODE.

use crate::channel::JoinDenied;
use crate::commands::ModeChange;
use crate::parsers::is_valid_channel_name;
use crate::replies::IrcReply;
use crate::server_state::ServerState;
use crate::session::Session;

const DEFAULT_KICK_REASON: &str = "No specific reason";

//    Command: JOIN
// Parameters: <channel>{,<channel>} [<key>{,<key>}]
//
// Channels are created implicitly on the first JOIN and the creator becomes
// the sole operator. Keys align positionally with the channel list. On
// success the joiner gets a channel welcome plus the topic (or the unset
// placeholder) and the other members see the JOIN line.
pub async fn handle_join(
    state: &ServerState,
    session: &Session,
    channels: Vec<String>,
    keys: Vec<String>,
) {
    let snapshot = session.snapshot().await;
    let prefix = snapshot.prefix();
    for (position, channel_name) in channels.iter().enumerate() {
        let key = keys.get(position).map(String::as_str);
        if !is_valid_channel_name(channel_name) {
            session
                .reply(IrcReply::NoSuchChannel {
                    nick: snapshot.nick(),
                    channel: channel_name,
                })
                .await;
            continue;
        }
        let (channel, created) = state.get_or_create_channel(channel_name);
        if created {
            channel.add_operator(session.id);
        } else {
            match channel.check_admission(session.id, key).await {
                Ok(()) => {
                    channel.add_member(session.id);
                }
                Err(JoinDenied::AlreadyMember) => {
                    session.reply(IrcReply::AlreadyInChannel).await;
                    continue;
                }
                Err(JoinDenied::InviteOnly) => {
                    session
                        .reply(IrcReply::InviteOnlyChan {
                            nick: snapshot.nick(),
                            channel: channel_name,
                        })
                        .await;
                    continue;
                }
                Err(JoinDenied::BadKey) => {
                    session
                        .reply(IrcReply::BadChannelKey {
                            nick: snapshot.nick(),
                            channel: channel_name,
                        })
                        .await;
                    continue;
                }
                Err(JoinDenied::ChannelFull) => {
                    session
                        .reply(IrcReply::ChannelIsFull {
                            nick: snapshot.nick(),
                            channel: channel_name,
                        })
                        .await;
                    continue;
                }
            }
        }
        session.add_joined(channel_name).await;
        session
            .reply(IrcReply::ChannelWelcome {
                channel: channel_name,
            })
            .await;
        let join_line = IrcReply::JoinRelay {
            prefix: &prefix,
            channel: channel_name,
        }
        .format();
        channel
            .broadcast(&state.clients, &join_line, Some(session.id))
            .await;
        match channel.topic().await {
            Some(topic) => {
                session
                    .reply(IrcReply::Topic {
                        nick: snapshot.nick(),
                        channel: channel_name,
                        topic: &topic,
                    })
                    .await;
            }
            None => {
                session
                    .reply(IrcReply::NoTopic {
                        nick: snapshot.nick(),
                        channel: channel_name,
                    })
                    .await;
            }
        }
    }
}

//    Command: TOPIC
// Parameters: <channel> [:<topic>]
//
// Querying needs membership; setting additionally needs operator status
// when the channel is +t.
pub async fn handle_topic(
    state: &ServerState,
    session: &Session,
    channel_name: &str,
    topic: Option<String>,
) {
    let snapshot = session.snapshot().await;
    let nick = snapshot.nick();
    let Some(channel) = state.channel(channel_name) else {
        session
            .reply(IrcReply::NoSuchChannel {
                nick,
                channel: channel_name,
            })
            .await;
        return;
    };
    if !channel.is_member(session.id) {
        session
            .reply(IrcReply::NotOnChannel {
                nick,
                channel: channel_name,
            })
            .await;
        return;
    }
    let Some(new_topic) = topic else {
        match channel.topic().await {
            Some(current) => {
                session
                    .reply(IrcReply::Topic {
                        nick,
                        channel: channel_name,
                        topic: &current,
                    })
                    .await;
            }
            None => {
                session
                    .reply(IrcReply::NoTopic {
                        nick,
                        channel: channel_name,
                    })
                    .await;
            }
        }
        return;
    };
    let modes = channel.modes().await;
    if modes.topic_protected && !channel.is_operator(session.id) {
        session
            .reply(IrcReply::ChanOpPrivsNeeded {
                nick,
                channel: channel_name,
            })
            .await;
        return;
    }
    channel.set_topic(new_topic.clone()).await;
    let line = IrcReply::TopicRelay {
        prefix: &snapshot.prefix(),
        channel: channel_name,
        topic: &new_topic,
    }
    .format();
    channel
        .broadcast(&state.clients, &line, Some(session.id))
        .await;
}

//    Command: KICK
// Parameters: <channel> <nickname> [:<reason>]
pub async fn handle_kick(
    state: &ServerState,
    session: &Session,
    channel_name: &str,
    target_nick: &str,
    reason: Option<String>,
) {
    let snapshot = session.snapshot().await;
    let nick = snapshot.nick();
    let Some(channel) = state.channel(channel_name) else {
        session
            .reply(IrcReply::NoSuchChannel {
                nick,
                channel: channel_name,
            })
            .await;
        return;
    };
    if !channel.is_member(session.id) {
        session
            .reply(IrcReply::NotOnChannel {
                nick,
                channel: channel_name,
            })
            .await;
        return;
    }
    if !channel.is_operator(session.id) {
        session
            .reply(IrcReply::ChanOpPrivsNeeded {
                nick,
                channel: channel_name,
            })
            .await;
        return;
    }
    let Some(target) = state.session_by_nick(target_nick).await else {
        session
            .reply(IrcReply::NoSuchNick {
                nick,
                target: target_nick,
            })
            .await;
        return;
    };
    if !channel.is_member(target.id) {
        session
            .reply(IrcReply::UserNotInChannel {
                nick,
                target: target_nick,
                channel: channel_name,
            })
            .await;
        return;
    }
    channel.remove_member(target.id);
    target.remove_joined(channel_name).await;
    let reason = reason.unwrap_or_else(|| DEFAULT_KICK_REASON.to_owned());
    let line = IrcReply::KickRelay {
        prefix: &snapshot.prefix(),
        channel: channel_name,
        target: target_nick,
        reason: &reason,
    }
    .format();
    channel.broadcast(&state.clients, &line, None).await;
    target.send(line).await;
    state.drop_channel_if_empty(channel_name);
}

//    Command: INVITE
// Parameters: <nickname> <channel>
//
// The invitation lands on the channel's invited list so a later JOIN can
// pass the +i gate.
pub async fn handle_invite(
    state: &ServerState,
    session: &Session,
    target_nick: &str,
    channel_name: &str,
) {
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
    let Some(channel) = state.channel(channel_name) else {
        session
            .reply(IrcReply::NoSuchChannel {
                nick,
                channel: channel_name,
            })
            .await;
        return;
    };
    if !channel.is_member(session.id) {
        session
            .reply(IrcReply::NotOnChannel {
                nick,
                channel: channel_name,
            })
            .await;
        return;
    }
    if channel.is_member(target.id) {
        session
            .reply(IrcReply::UserOnChannel {
                nick,
                target: target_nick,
                channel: channel_name,
            })
            .await;
        return;
    }
    channel.add_invited(target.id);
    let invite_line = IrcReply::InviteRelay {
        prefix: &snapshot.prefix(),
        target: target_nick,
        channel: channel_name,
    }
    .format();
    target.send(invite_line).await;
    session
        .reply(IrcReply::Inviting {
            nick,
            target: target_nick,
            channel: channel_name,
        })
        .await;
}

//    Command: MODE
// Parameters: <target> [<modestring> <mode params>]
//
// Querying a channel needs nothing beyond its existence; changing modes
// needs operator status. Applied changes are echoed to the whole channel as
// a 324 line; an unrecognised flag gets its own 421 while the recognised
// flags in the same modestring still apply. User-mode targets are out of
// scope here: changing another user's modes is refused, self-targeting is
// ignored.
pub async fn handle_mode(
    state: &ServerState,
    session: &Session,
    target: &str,
    changes: Vec<ModeChange>,
) {
    let snapshot = session.snapshot().await;
    let nick = snapshot.nick();
    if !target.starts_with('#') && !target.starts_with('&') {
        if snapshot.nickname.as_deref() != Some(target) {
            session.reply(IrcReply::UsersDontMatch { nick }).await;
        }
        return;
    }
    let Some(channel) = state.channel(target) else {
        session
            .reply(IrcReply::NoSuchChannel {
                nick,
                channel: target,
            })
            .await;
        return;
    };
    if changes.is_empty() {
        let modes = channel.mode_string().await;
        session
            .reply(IrcReply::ChannelModeIs {
                nick,
                channel: target,
                modes: &modes,
            })
            .await;
        return;
    }
    if !channel.is_operator(session.id) {
        session
            .reply(IrcReply::ChanOpPrivsNeeded {
                nick,
                channel: target,
            })
            .await;
        return;
    }

    let mut applied_flags = String::new();
    let mut applied_args: Vec<String> = Vec::new();
    for change in changes {
        match change.flag {
            'i' => channel.set_invite_only(change.add).await,
            't' => channel.set_topic_protected(change.add).await,
            'k' => {
                let key = if change.add { change.arg.clone() } else { None };
                channel.set_key(key).await;
            }
            'l' => {
                if change.add {
                    let Some(limit) = change.arg.as_deref().and_then(|a| a.parse::<usize>().ok())
                    else {
                        continue;
                    };
                    channel.set_user_limit(Some(limit)).await;
                } else {
                    channel.set_user_limit(None).await;
                }
            }
            'o' => {
                let operator_nick = change.arg.clone().unwrap_or_default();
                match state.session_by_nick(&operator_nick).await {
                    Some(member) if channel.is_member(member.id) => {
                        if change.add {
                            channel.add_operator(member.id);
                        } else {
                            channel.remove_operator(member.id);
                        }
                    }
                    _ => {
                        session.reply(IrcReply::UsersDontMatch { nick }).await;
                        continue;
                    }
                }
            }
            _ => {
                session
                    .reply(IrcReply::UnknownCommand {
                        nick,
                        command: "MODE",
                    })
                    .await;
                continue;
            }
        }
        applied_flags.push(if change.add { '+' } else { '-' });
        applied_flags.push(change.flag);
        if let Some(arg) = change.arg {
            applied_args.push(arg);
        }
    }
    if applied_flags.is_empty() {
        return;
    }
    let mut mode_line = applied_flags;
    for arg in applied_args {
        mode_line.push(' ');
        mode_line.push_str(&arg);
    }
    let line = IrcReply::ChannelModeIs {
        nick,
        channel: target,
        modes: &mode_line,
    }
    .format();
    channel.broadcast(&state.clients, &line, None).await;
}
