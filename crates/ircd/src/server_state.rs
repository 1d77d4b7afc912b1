//! The authoritative server model: the client map, the channel map, the
//! registration gate and the post-registration command dispatcher.

use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info};

use crate::channel::{ChannelName, IrcChannel};
use crate::commands::{Command, CommandError, CommandLine};
use crate::handlers;
use crate::replies::IrcReply;
use crate::session::{ClientId, Session};

#[derive(Debug)]
pub struct ServerState {
    pub clients: DashMap<ClientId, Session>,
    pub channels: DashMap<ChannelName, Arc<IrcChannel>>,
    password: String,
}

impl ServerState {
    pub fn new(password: String) -> Self {
        ServerState {
            clients: DashMap::new(),
            channels: DashMap::new(),
            password,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn add_client(&self, session: Session) {
        self.clients.insert(session.id, session);
    }

    /// Cheap clone of the session handle; never holds a map lock beyond the
    /// lookup itself.
    pub fn session(&self, id: ClientId) -> Option<Session> {
        self.clients.get(&id).map(|entry| entry.value().clone())
    }

    pub async fn session_by_nick(&self, nick: &str) -> Option<Session> {
        let candidates: Vec<Session> = self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for session in candidates {
            if session.nickname().await.as_deref() == Some(nick) {
                return Some(session);
            }
        }
        None
    }

    pub async fn nick_in_use(&self, nick: &str) -> bool {
        self.session_by_nick(nick).await.is_some()
    }

    pub fn channel(&self, name: &str) -> Option<Arc<IrcChannel>> {
        self.channels.get(name).map(|entry| entry.value().clone())
    }

    pub fn get_or_create_channel(&self, name: &str) -> (Arc<IrcChannel>, bool) {
        if let Some(existing) = self.channel(name) {
            return (existing, false);
        }
        let channel = Arc::new(IrcChannel::new(name.to_owned()));
        self.channels.insert(name.to_owned(), channel.clone());
        (channel, true)
    }

    /// Channels live only while they have members.
    pub fn drop_channel_if_empty(&self, name: &str) {
        self.channels.remove_if(name, |_, channel| channel.is_empty());
    }

    /// Unlinks the session from every channel it joined, reaps channels that
    /// became empty and drops the session. Safe to call twice; the second
    /// call finds nothing.
    pub async fn remove_client(&self, id: ClientId) {
        let Some((_, session)) = self.clients.remove(&id) else {
            return;
        };
        for name in session.joined_channels().await {
            if let Some(channel) = self.channel(&name) {
                channel.remove_member(id);
                self.drop_channel_if_empty(&name);
            }
        }
        info!("[{id}] session removed");
    }

    /// Entry point for one complete wire line from a client. Invalid lines
    /// produce exactly one error numeric; valid ones refresh the activity
    /// deadline and dispatch on the registration state.
    pub async fn handle_line(&self, id: ClientId, line: &str) {
        let Some(session) = self.session(id) else {
            return;
        };
        // empty messages are silently ignored (RFC 2812 section 2.3.1)
        if line == "\r\n" {
            return;
        }
        debug!("[{id}] >> {}", line.trim_end());
        let command_line = CommandLine::parse(line);
        match command_line.parsed {
            Err(error) => {
                let snapshot = session.snapshot().await;
                let reply = match &error {
                    CommandError::Unknown { command } => IrcReply::UnknownCommand {
                        nick: snapshot.nick(),
                        command,
                    },
                    CommandError::NeedMoreParams { command } => IrcReply::NeedMoreParams {
                        nick: snapshot.nick(),
                        command,
                    },
                };
                session.reply(reply).await;
            }
            Ok(command) => {
                session.touch().await;
                if session.is_registered().await {
                    self.dispatch_registered(&session, command).await;
                } else {
                    self.dispatch_unregistered(&session, command).await;
                }
            }
        }
    }

    // Before registration only the handshake commands are admitted; anything
    // else is answered with 421 and otherwise ignored.
    async fn dispatch_unregistered(&self, session: &Session, command: Command) {
        match command {
            Command::Pass { password } => {
                handlers::registration::handle_pass(self, session, &password).await
            }
            Command::Nick { nickname } => {
                handlers::registration::handle_nick(self, session, nickname).await
            }
            Command::User {
                username, realname, ..
            } => handlers::registration::handle_user(session, username, realname).await,
            Command::Cap { subcommand } => {
                handlers::registration::handle_cap(session, &subcommand).await
            }
            other => {
                let snapshot = session.snapshot().await;
                session
                    .reply(IrcReply::UnknownCommand {
                        nick: snapshot.nick(),
                        command: command_name(&other),
                    })
                    .await;
            }
        }
    }

    async fn dispatch_registered(&self, session: &Session, command: Command) {
        match command {
            Command::Pass { .. } | Command::User { .. } => {
                let snapshot = session.snapshot().await;
                session
                    .reply(IrcReply::AlreadyRegistered {
                        nick: snapshot.nick(),
                    })
                    .await;
            }
            Command::Nick { nickname } => {
                handlers::registration::handle_nick(self, session, nickname).await
            }
            Command::Join { channels, keys } => {
                handlers::channels::handle_join(self, session, channels, keys).await
            }
            Command::Privmsg { target, text } => {
                handlers::messages::handle_privmsg(self, session, &target, &text).await
            }
            Command::Invite { nickname, channel } => {
                handlers::channels::handle_invite(self, session, &nickname, &channel).await
            }
            Command::Topic { channel, topic } => {
                handlers::channels::handle_topic(self, session, &channel, topic).await
            }
            Command::Kick {
                channel,
                nickname,
                reason,
            } => handlers::channels::handle_kick(self, session, &channel, &nickname, reason).await,
            Command::Mode { target, changes } => {
                handlers::channels::handle_mode(self, session, &target, changes).await
            }
            Command::Ping { token } => handlers::miscellanneous::handle_ping(session, &token).await,
            Command::Pong { .. } => {
                // activity deadline already refreshed in handle_line
            }
            Command::Whois { nickname } => {
                handlers::miscellanneous::handle_whois(self, session, &nickname).await
            }
            other @ Command::Cap { .. } => {
                let snapshot = session.snapshot().await;
                session
                    .reply(IrcReply::UnknownCommand {
                        nick: snapshot.nick(),
                        command: command_name(&other),
                    })
                    .await;
            }
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Pass { .. } => "PASS",
        Command::Nick { .. } => "NICK",
        Command::User { .. } => "USER",
        Command::Cap { .. } => "CAP",
        Command::Join { .. } => "JOIN",
        Command::Privmsg { .. } => "PRIVMSG",
        Command::Invite { .. } => "INVITE",
        Command::Kick { .. } => "KICK",
        Command::Topic { .. } => "TOPIC",
        Command::Ping { .. } => "PING",
        Command::Pong { .. } => "PONG",
        Command::Mode { .. } => "MODE",
        Command::Whois { .. } => "WHOIS",
    }
}
