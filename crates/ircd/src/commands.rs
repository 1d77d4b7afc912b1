//! Command values: one CRLF-terminated wire line parsed into a validated,
//! immutable value. Syntax is handled by the nom grammar in `parsers`;
//! this module applies the per-command shape rules.

use crate::parsers::{RawMessage, key_parser, message_parser, nickname_parser};

/// A single channel-mode change, sign applied.
///
/// Flags are the channel modes this server enforces: `i`, `t`, `k`, `l` and
/// the per-member `o`. `arg` is filled for `+k`, `+l`, `+o` and `-o` by
/// consuming positional parameters left-to-right. Unrecognised flag letters
/// pass through with no argument; the dispatcher reports them per flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeChange {
    pub add: bool,
    pub flag: char,
    pub arg: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    //    Command: PASS
    // Parameters: <password>
    Pass { password: String },
    //    Command: NICK
    // Parameters: <nickname>
    Nick { nickname: String },
    //    Command: USER
    // Parameters: <username> <mode> <unused> :<realname>
    User { username: String, realname: String },
    //    Command: CAP
    // Parameters: <subcommand> [params]
    Cap { subcommand: String },
    //    Command: JOIN
    // Parameters: <channel>{,<channel>} [<key>{,<key>}]
    Join {
        channels: Vec<String>,
        keys: Vec<String>,
    },
    //    Command: PRIVMSG
    // Parameters: <target> :<text>
    Privmsg { target: String, text: String },
    //    Command: INVITE
    // Parameters: <nickname> <channel>
    Invite { nickname: String, channel: String },
    //    Command: KICK
    // Parameters: <channel> <nickname> [:<reason>]
    Kick {
        channel: String,
        nickname: String,
        reason: Option<String>,
    },
    //    Command: TOPIC
    // Parameters: <channel> [:<topic>]
    Topic {
        channel: String,
        topic: Option<String>,
    },
    //    Command: PING / PONG
    // Parameters: <token>
    Ping { token: String },
    Pong { token: String },
    //    Command: MODE
    // Parameters: <target> [<modestring> <mode params>]
    Mode {
        target: String,
        changes: Vec<ModeChange>,
    },
    //    Command: WHOIS
    // Parameters: <nickname>
    Whois { nickname: String },
}

/// The error tag of an invalid command value.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Shape or arity violation, reported as 461.
    NeedMoreParams { command: String },
    /// Unrecognised command name, reported as 421.
    Unknown { command: String },
}

impl CommandError {
    pub fn command(&self) -> &str {
        match self {
            CommandError::NeedMoreParams { command } => command,
            CommandError::Unknown { command } => command,
        }
    }
}

/// The immutable value produced from one wire line: retained prefix plus
/// either the validated command or its error tag.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandLine {
    pub prefix: Option<String>,
    pub parsed: Result<Command, CommandError>,
}

impl CommandLine {
    /// Parses one line. The line must end in CRLF; anything else is invalid
    /// with the need-more-params tag, mirroring the wire contract.
    pub fn parse(line: &str) -> CommandLine {
        let raw = match message_parser(line) {
            Ok(("", raw)) => raw,
            _ => {
                let command = line
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .to_ascii_uppercase();
                return CommandLine {
                    prefix: None,
                    parsed: Err(CommandError::NeedMoreParams { command }),
                };
            }
        };
        let prefix = raw.prefix.map(str::to_owned);
        let parsed = validate(&raw);
        CommandLine { prefix, parsed }
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_ok()
    }
}

fn validate(raw: &RawMessage<'_>) -> Result<Command, CommandError> {
    let name = raw.command.to_ascii_uppercase();
    let invalid = || CommandError::NeedMoreParams {
        command: name.clone(),
    };
    let middles = &raw.middles;
    match name.as_str() {
        // exactly one bare token; extras are a shape violation
        "PASS" => match (middles.as_slice(), raw.trailing) {
            ([password], None) => Ok(Command::Pass {
                password: (*password).to_owned(),
            }),
            _ => Err(invalid()),
        },
        "NICK" => match (middles.as_slice(), raw.trailing) {
            ([nickname], None) if matches!(nickname_parser(nickname), Ok(("", _))) => {
                Ok(Command::Nick {
                    nickname: (*nickname).to_owned(),
                })
            }
            _ => Err(invalid()),
        },
        // username, mode bits, unused token, then a non-empty trailing realname
        "USER" => match (middles.as_slice(), raw.trailing) {
            ([username, _mode, _unused], Some(realname)) if !realname.is_empty() => {
                Ok(Command::User {
                    username: (*username).to_owned(),
                    realname: realname.to_owned(),
                })
            }
            _ => Err(invalid()),
        },
        "CAP" => match middles.as_slice() {
            [subcommand, ..] => Ok(Command::Cap {
                subcommand: subcommand.to_ascii_uppercase(),
            }),
            [] => Err(invalid()),
        },
        // comma-separated channel list with a positionally aligned key list
        "JOIN" => {
            let (channels, keys) = match (middles.as_slice(), raw.trailing) {
                ([channels], None) => (*channels, ""),
                ([channels, keys], None) => (*channels, *keys),
                _ => return Err(invalid()),
            };
            Ok(Command::Join {
                channels: channels.split(',').map(str::to_owned).collect(),
                keys: if keys.is_empty() {
                    Vec::new()
                } else {
                    keys.split(',').map(str::to_owned).collect()
                },
            })
        }
        "PRIVMSG" => match (middles.as_slice(), raw.trailing) {
            ([target], Some(text)) if !text.is_empty() => Ok(Command::Privmsg {
                target: (*target).to_owned(),
                text: text.to_owned(),
            }),
            _ => Err(invalid()),
        },
        "INVITE" => match (middles.as_slice(), raw.trailing) {
            ([nickname, channel], None) => Ok(Command::Invite {
                nickname: (*nickname).to_owned(),
                channel: (*channel).to_owned(),
            }),
            _ => Err(invalid()),
        },
        "KICK" => match middles.as_slice() {
            [channel, nickname] => Ok(Command::Kick {
                channel: (*channel).to_owned(),
                nickname: (*nickname).to_owned(),
                reason: raw.trailing.filter(|r| !r.is_empty()).map(str::to_owned),
            }),
            _ => Err(invalid()),
        },
        "TOPIC" => match middles.as_slice() {
            [channel] => Ok(Command::Topic {
                channel: (*channel).to_owned(),
                topic: raw.trailing.map(str::to_owned),
            }),
            _ => Err(invalid()),
        },
        "PING" | "PONG" => match (middles.as_slice(), raw.trailing) {
            ([token], None) => {
                let token = (*token).to_owned();
                Ok(if name == "PING" {
                    Command::Ping { token }
                } else {
                    Command::Pong { token }
                })
            }
            _ => Err(invalid()),
        },
        "MODE" => {
            if raw.trailing.is_some() {
                return Err(invalid());
            }
            let (target, rest) = match middles.split_first() {
                Some(pair) => pair,
                None => return Err(invalid()),
            };
            let changes = match rest.split_first() {
                None => Vec::new(),
                Some((modestring, params)) => {
                    parse_mode_changes(modestring, params).ok_or_else(invalid)?
                }
            };
            Ok(Command::Mode {
                target: (*target).to_owned(),
                changes,
            })
        }
        "WHOIS" => match (middles.as_slice(), raw.trailing) {
            ([nickname], None) => Ok(Command::Whois {
                nickname: (*nickname).to_owned(),
            }),
            _ => Err(invalid()),
        },
        _ => Err(CommandError::Unknown { command: name }),
    }
}

// Walks the mode string left-to-right. `k` (when setting), `l` (when
// setting, digits only) and `o` (both signs) consume the next positional
// parameter; running out of parameters invalidates the whole command.
// Unrecognised flag letters consume nothing and are kept so the dispatcher
// can reject each one individually.
fn parse_mode_changes(modestring: &str, params: &[&str]) -> Option<Vec<ModeChange>> {
    let mut add = true;
    let mut changes = Vec::new();
    let mut next_param = 0usize;
    let take_param = |next_param: &mut usize| -> Option<String> {
        let param = params.get(*next_param)?;
        *next_param += 1;
        Some((*param).to_owned())
    };

    for flag in modestring.chars() {
        match flag {
            '+' => add = true,
            '-' => add = false,
            'i' | 't' => changes.push(ModeChange {
                add,
                flag,
                arg: None,
            }),
            'k' => {
                let arg = if add {
                    let key = take_param(&mut next_param)?;
                    match key_parser(&key) {
                        Ok(("", _)) => Some(key),
                        _ => return None,
                    }
                } else {
                    None
                };
                changes.push(ModeChange {
                    add,
                    flag,
                    arg,
                });
            }
            'l' => {
                let arg = if add {
                    let limit = take_param(&mut next_param)?;
                    if limit.is_empty() || !limit.chars().all(|c| c.is_ascii_digit()) {
                        return None;
                    }
                    Some(limit)
                } else {
                    None
                };
                changes.push(ModeChange {
                    add,
                    flag,
                    arg,
                });
            }
            'o' => {
                let arg = Some(take_param(&mut next_param)?);
                changes.push(ModeChange {
                    add,
                    flag,
                    arg,
                });
            }
            _ => changes.push(ModeChange {
                add,
                flag,
                arg: None,
            }),
        }
    }
    if changes.is_empty() {
        return None;
    }
    Some(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(line: &str) -> Command {
        let parsed = CommandLine::parse(line);
        parsed.parsed.expect(&format!("should parse: {line:?}"))
    }

    fn parse_err(line: &str) -> CommandError {
        let parsed = CommandLine::parse(line);
        parsed
            .parsed
            .expect_err(&format!("should be invalid: {line:?}"))
    }

    #[test]
    fn pass_takes_exactly_one_token() {
        assert_eq!(
            parse_ok("PASS secretpasswordhere\r\n"),
            Command::Pass {
                password: "secretpasswordhere".to_owned()
            }
        );
        assert!(matches!(
            parse_err("PASS one two\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
        assert!(matches!(
            parse_err("PASS\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
    }

    #[test]
    fn nick_requires_valid_nickname() {
        assert_eq!(
            parse_ok("NICK Wiz\r\n"),
            Command::Nick {
                nickname: "Wiz".to_owned()
            }
        );
        assert!(matches!(
            parse_err("NICK\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
        assert!(matches!(
            parse_err("NICK 1badnick\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
    }

    #[test]
    fn user_needs_four_params_with_trailing_realname() {
        assert_eq!(
            parse_ok("USER guest 0 * :Ronnie Reagan\r\n"),
            Command::User {
                username: "guest".to_owned(),
                realname: "Ronnie Reagan".to_owned()
            }
        );
        assert!(matches!(
            parse_err("USER guest 0 *\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
        // realname must be non-empty after the colon
        assert!(matches!(
            parse_err("USER guest 0 * :\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
    }

    #[test]
    fn join_aligns_keys_with_channels() {
        assert_eq!(
            parse_ok("JOIN #a,#b key1,key2\r\n"),
            Command::Join {
                channels: vec!["#a".to_owned(), "#b".to_owned()],
                keys: vec!["key1".to_owned(), "key2".to_owned()],
            }
        );
        assert_eq!(
            parse_ok("JOIN #solo\r\n"),
            Command::Join {
                channels: vec!["#solo".to_owned()],
                keys: vec![],
            }
        );
        assert!(matches!(
            parse_err("JOIN\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
    }

    #[test]
    fn privmsg_rejects_empty_text() {
        assert_eq!(
            parse_ok("PRIVMSG #rust :hello there\r\n"),
            Command::Privmsg {
                target: "#rust".to_owned(),
                text: "hello there".to_owned()
            }
        );
        assert!(matches!(
            parse_err("PRIVMSG #rust :\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
        assert!(matches!(
            parse_err("PRIVMSG #rust\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
    }

    #[test]
    fn kick_reason_is_optional_trailing() {
        assert_eq!(
            parse_ok("KICK #rust bob :flooding\r\n"),
            Command::Kick {
                channel: "#rust".to_owned(),
                nickname: "bob".to_owned(),
                reason: Some("flooding".to_owned()),
            }
        );
        assert_eq!(
            parse_ok("KICK #rust bob\r\n"),
            Command::Kick {
                channel: "#rust".to_owned(),
                nickname: "bob".to_owned(),
                reason: None,
            }
        );
        assert!(matches!(
            parse_err("KICK #rust\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
    }

    #[test]
    fn ping_takes_a_single_bare_token() {
        assert_eq!(
            parse_ok("PING token42\r\n"),
            Command::Ping {
                token: "token42".to_owned()
            }
        );
        assert!(matches!(
            parse_err("PING :token42\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
        assert!(matches!(
            parse_err("PING\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
    }

    #[test]
    fn mode_query_has_no_changes() {
        assert_eq!(
            parse_ok("MODE #rust\r\n"),
            Command::Mode {
                target: "#rust".to_owned(),
                changes: vec![],
            }
        );
    }

    #[test]
    fn mode_compact_form_consumes_params_in_order() {
        assert_eq!(
            parse_ok("MODE #rust +lk 20 secret\r\n"),
            Command::Mode {
                target: "#rust".to_owned(),
                changes: vec![
                    ModeChange {
                        add: true,
                        flag: 'l',
                        arg: Some("20".to_owned())
                    },
                    ModeChange {
                        add: true,
                        flag: 'k',
                        arg: Some("secret".to_owned())
                    },
                ],
            }
        );
    }

    #[test]
    fn mode_signs_can_interleave() {
        assert_eq!(
            parse_ok("MODE #rust +i-t\r\n"),
            Command::Mode {
                target: "#rust".to_owned(),
                changes: vec![
                    ModeChange {
                        add: true,
                        flag: 'i',
                        arg: None
                    },
                    ModeChange {
                        add: false,
                        flag: 't',
                        arg: None
                    },
                ],
            }
        );
    }

    #[test]
    fn mode_limit_must_be_decimal() {
        assert!(matches!(
            parse_err("MODE #rust +l twenty\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
        assert!(matches!(
            parse_err("MODE #rust +l\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
    }

    #[test]
    fn mode_unset_key_and_limit_take_no_param() {
        assert_eq!(
            parse_ok("MODE #rust -kl\r\n"),
            Command::Mode {
                target: "#rust".to_owned(),
                changes: vec![
                    ModeChange {
                        add: false,
                        flag: 'k',
                        arg: None
                    },
                    ModeChange {
                        add: false,
                        flag: 'l',
                        arg: None
                    },
                ],
            }
        );
    }

    #[test]
    fn unknown_mode_flags_are_kept_for_dispatch() {
        assert_eq!(
            parse_ok("MODE #rust +ix\r\n"),
            Command::Mode {
                target: "#rust".to_owned(),
                changes: vec![
                    ModeChange {
                        add: true,
                        flag: 'i',
                        arg: None
                    },
                    ModeChange {
                        add: true,
                        flag: 'x',
                        arg: None
                    },
                ],
            }
        );
    }

    #[test]
    fn operator_grant_consumes_nick_param() {
        assert_eq!(
            parse_ok("MODE #rust +o bob\r\n"),
            Command::Mode {
                target: "#rust".to_owned(),
                changes: vec![ModeChange {
                    add: true,
                    flag: 'o',
                    arg: Some("bob".to_owned())
                }],
            }
        );
        assert!(matches!(
            parse_err("MODE #rust +o\r\n"),
            CommandError::NeedMoreParams { .. }
        ));
    }

    #[test]
    fn line_without_crlf_is_invalid() {
        let err = parse_err("NICK Wiz");
        assert_eq!(
            err,
            CommandError::NeedMoreParams {
                command: "NICK".to_owned()
            }
        );
    }

    #[test]
    fn unknown_command_keeps_its_name() {
        let err = parse_err("FLY over the mountains\r\n");
        assert_eq!(
            err,
            CommandError::Unknown {
                command: "FLY".to_owned()
            }
        );
    }

    #[test]
    fn prefix_is_retained_as_metadata() {
        let line = CommandLine::parse(":alice NICK bob\r\n");
        assert_eq!(line.prefix.as_deref(), Some("alice"));
        assert!(line.is_valid());
    }

    #[test]
    fn command_names_match_case_insensitively() {
        assert_eq!(
            parse_ok("nick Wiz\r\n"),
            Command::Nick {
                nickname: "Wiz".to_owned()
            }
        );
    }
}
