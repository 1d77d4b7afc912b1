use crate::constants::*;

/// The reply catalogue. Every user-visible line the server emits is built
/// here; nothing else formats protocol text.
///
/// Numerics follow the RFC 2812 shape `:<server> <code> <target> :<text>`,
/// command-form lines (PONG, relayed JOIN/PRIVMSG/...) are emitted verbatim.
/// `format` never truncates mid-numeric; oversized trailing text is clipped
/// so the full line stays within the 512-byte wire limit.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum IrcReply<'a> {
    // Connection registration
    Welcome {
        nick: &'a str,
    },
    Banner,
    PasswordMismatch,
    AlreadyRegistered {
        nick: &'a str,
    },
    NicknameInUse {
        nick: &'a str,
    },
    CapAck {
        subcommand: &'a str,
    },

    // Errors
    UnknownCommand {
        nick: &'a str,
        command: &'a str,
    },
    NeedMoreParams {
        nick: &'a str,
        command: &'a str,
    },
    InputTooLong {
        nick: &'a str,
    },
    NoSuchNick {
        nick: &'a str,
        target: &'a str,
    },
    NoSuchChannel {
        nick: &'a str,
        channel: &'a str,
    },
    NoChannelAccess {
        nick: &'a str,
        channel: &'a str,
    },
    NotOnChannel {
        nick: &'a str,
        channel: &'a str,
    },
    UserNotInChannel {
        nick: &'a str,
        target: &'a str,
        channel: &'a str,
    },
    UserOnChannel {
        nick: &'a str,
        target: &'a str,
        channel: &'a str,
    },
    ChanOpPrivsNeeded {
        nick: &'a str,
        channel: &'a str,
    },
    UsersDontMatch {
        nick: &'a str,
    },
    InviteOnlyChan {
        nick: &'a str,
        channel: &'a str,
    },
    BadChannelKey {
        nick: &'a str,
        channel: &'a str,
    },
    ChannelIsFull {
        nick: &'a str,
        channel: &'a str,
    },

    // Channel operations
    ChannelWelcome {
        channel: &'a str,
    },
    AlreadyInChannel,
    Topic {
        nick: &'a str,
        channel: &'a str,
        topic: &'a str,
    },
    NoTopic {
        nick: &'a str,
        channel: &'a str,
    },
    ChannelModeIs {
        nick: &'a str,
        channel: &'a str,
        modes: &'a str,
    },
    Inviting {
        nick: &'a str,
        target: &'a str,
        channel: &'a str,
    },

    // WHOIS
    WhoisUser {
        nick: &'a str,
        target: &'a str,
        username: &'a str,
        host: &'a str,
        realname: &'a str,
    },
    WhoisServer {
        nick: &'a str,
        target: &'a str,
    },
    EndOfWhois {
        nick: &'a str,
        target: &'a str,
    },

    // Liveness
    Pong {
        token: &'a str,
    },
    PingToClient,
    ConnectionClosed,

    // Command-form relays, prefixed with the originating user
    JoinRelay {
        prefix: &'a str,
        channel: &'a str,
    },
    PrivmsgRelay {
        prefix: &'a str,
        target: &'a str,
        text: &'a str,
    },
    TopicRelay {
        prefix: &'a str,
        channel: &'a str,
        topic: &'a str,
    },
    KickRelay {
        prefix: &'a str,
        channel: &'a str,
        target: &'a str,
        reason: &'a str,
    },
    InviteRelay {
        prefix: &'a str,
        target: &'a str,
        channel: &'a str,
    },
}

impl<'a> IrcReply<'a> {
    pub fn format(&self) -> String {
        let line = match self {
            // registration replies & errors
            IrcReply::Welcome { nick } => {
                format!(":{SERVER_NAME} {RPL_WELCOME_NB:03} {nick} :{RPL_WELCOME_STR}")
            }
            IrcReply::Banner => {
                format!(":{SERVER_NAME} NOTICE * :{RPL_WELCOME_STR}")
            }
            IrcReply::PasswordMismatch => {
                format!(":{SERVER_NAME} {ERR_PASSWDMISMATCH_NB:03} * :{ERR_PASSWDMISMATCH_STR}")
            }
            IrcReply::AlreadyRegistered { nick } => format!(
                ":{SERVER_NAME} {ERR_ALREADYREGISTRED_NB:03} {nick} :{ERR_ALREADYREGISTRED_STR}"
            ),
            IrcReply::NicknameInUse { nick } => format!(
                ":{SERVER_NAME} {ERR_NICKNAMEINUSE_NB:03} * :{nick} {ERR_NICKNAMEINUSE_STR}"
            ),
            IrcReply::CapAck { subcommand } => {
                format!("{SERVER_NAME} CAP * {subcommand} :")
            }

            // generic errors
            IrcReply::UnknownCommand { nick, command } => format!(
                ":{SERVER_NAME} {ERR_UNKNOWNCOMMAND_NB:03} {nick} :{command} {ERR_UNKNOWNCOMMAND_STR}"
            ),
            IrcReply::NeedMoreParams { nick, command } => format!(
                ":{SERVER_NAME} {ERR_NEEDMOREPARAMS_NB:03} {nick} :{command} {ERR_NEEDMOREPARAMS_STR}"
            ),
            IrcReply::InputTooLong { nick } => {
                format!(":{SERVER_NAME} {ERR_INPUTTOOLONG_NB:03} {nick} :{ERR_INPUTTOOLONG_STR}")
            }
            IrcReply::NoSuchNick { nick, target } => {
                format!(":{SERVER_NAME} {ERR_NOSUCHNICK_NB:03} {nick} {target} :{ERR_NOSUCHNICK_STR}")
            }
            IrcReply::NoSuchChannel { nick, channel } => format!(
                ":{SERVER_NAME} {ERR_NOSUCHCHANNEL_NB:03} {nick} {channel} :{ERR_NOSUCHCHANNEL_STR}"
            ),
            // Free-form 404 equivalent kept from the historical test suite.
            IrcReply::NoChannelAccess { nick, channel } => {
                format!("server 404: {nick} doesn't have access to this channel - {channel}")
            }
            IrcReply::NotOnChannel { nick, channel } => format!(
                ":{SERVER_NAME} {ERR_NOTONCHANNEL_NB:03} {nick} {channel} :{ERR_NOTONCHANNEL_STR}"
            ),
            IrcReply::UserNotInChannel {
                nick,
                target,
                channel,
            } => format!(
                ":{SERVER_NAME} {ERR_USERNOTINCHANNEL_NB:03} {nick} {target} {channel} :{ERR_USERNOTINCHANNEL_STR}"
            ),
            IrcReply::UserOnChannel {
                nick,
                target,
                channel,
            } => format!(
                ":{SERVER_NAME} {ERR_USERONCHANNEL_NB:03} {nick} {target} {channel} :{ERR_USERONCHANNEL_STR}"
            ),
            IrcReply::ChanOpPrivsNeeded { nick, channel } => format!(
                ":{SERVER_NAME} {ERR_CHANOPRIVSNEEDED_NB:03} {nick} {channel} :{ERR_CHANOPRIVSNEEDED_STR}"
            ),
            IrcReply::UsersDontMatch { nick } => format!(
                ":{SERVER_NAME} {ERR_USERSDONTMATCH_NB:03} {nick} :{ERR_USERSDONTMATCH_STR}"
            ),
            IrcReply::InviteOnlyChan { nick, channel } => format!(
                ":{SERVER_NAME} {ERR_INVITEONLYCHAN_NB:03} {nick} {channel} :{ERR_INVITEONLYCHAN_STR}"
            ),
            IrcReply::BadChannelKey { nick, channel } => format!(
                ":{SERVER_NAME} {ERR_BADCHANNELKEY_NB:03} {nick} {channel} :{ERR_BADCHANNELKEY_STR}"
            ),
            IrcReply::ChannelIsFull { nick, channel } => format!(
                ":{SERVER_NAME} {ERR_CHANNELISFULL_NB:03} {nick} {channel} :{ERR_CHANNELISFULL_STR}"
            ),

            // channel replies
            IrcReply::ChannelWelcome { channel } => {
                format!("Welcome to {channel} channel!")
            }
            IrcReply::AlreadyInChannel => "You're already in this channel".to_owned(),
            IrcReply::Topic {
                nick,
                channel,
                topic,
            } => format!(":{SERVER_NAME} {RPL_TOPIC_NB:03} {nick} {channel} :{topic}"),
            IrcReply::NoTopic { nick, channel } => {
                format!(":{SERVER_NAME} {RPL_NOTOPIC_NB:03} {nick} {channel} :{RPL_NOTOPIC_STR}")
            }
            IrcReply::ChannelModeIs {
                nick,
                channel,
                modes,
            } => format!(":{SERVER_NAME} {RPL_CHANNELMODEIS_NB:03} {nick} {channel} {modes}"),
            IrcReply::Inviting {
                nick,
                target,
                channel,
            } => format!(":{SERVER_NAME} {RPL_INVITING_NB:03} {nick} {target} {channel}"),

            // WHOIS
            IrcReply::WhoisUser {
                nick,
                target,
                username,
                host,
                realname,
            } => format!(
                ":{SERVER_NAME} {RPL_WHOISUSER_NB:03} {nick} {target} {username} {host} * :{realname}"
            ),
            IrcReply::WhoisServer { nick, target } => format!(
                ":{SERVER_NAME} {RPL_WHOISSERVER_NB:03} {nick} {target} {SERVER_NAME} :{SERVER_INFO}"
            ),
            IrcReply::EndOfWhois { nick, target } => format!(
                ":{SERVER_NAME} {RPL_ENDOFWHOIS_NB:03} {nick} {target} :{RPL_ENDOFWHOIS_STR}"
            ),

            // liveness
            IrcReply::Pong { token } => format!("PONG {token}"),
            IrcReply::PingToClient => format!("PING :{SERVER_NAME}"),
            IrcReply::ConnectionClosed => "Connection closed".to_owned(),

            // relays
            IrcReply::JoinRelay { prefix, channel } => format!(":{prefix} JOIN {channel}"),
            IrcReply::PrivmsgRelay {
                prefix,
                target,
                text,
            } => format!(":{prefix} PRIVMSG {target} :{text}"),
            IrcReply::TopicRelay {
                prefix,
                channel,
                topic,
            } => format!(":{prefix} TOPIC {channel} :{topic}"),
            IrcReply::KickRelay {
                prefix,
                channel,
                target,
                reason,
            } => format!(":{prefix} KICK {channel} {target} :{reason}"),
            IrcReply::InviteRelay {
                prefix,
                target,
                channel,
            } => format!(":{prefix} INVITE {target} {channel}"),
        };
        clip_to_line_limit(line)
    }
}

// Keeps the numeric prefix intact and clips only the trailing text when a
// formatted reply would exceed the 512-byte wire limit (CRLF included).
fn clip_to_line_limit(mut line: String) -> String {
    const MAX_WITHOUT_CRLF: usize = MAX_LINE_LEN - 2;
    if line.len() <= MAX_WITHOUT_CRLF {
        return line;
    }
    let mut cut = MAX_WITHOUT_CRLF;
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    line.truncate(cut);
    line
}
