use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while_m_n, take_while1},
    character::complete::{char, satisfy, space1},
    combinator::{opt, recognize, verify},
    multi::many0,
    sequence::{pair, preceded, terminated},
};

// 2.3.1 Message format in Augmented BNF
//
//     message    =  [ ":" prefix SPACE ] command [ params ] crlf
//     prefix     =  servername / ( nickname [ [ "!" user ] "@" host ] )
//     command    =  1*letter / 3digit
//     params     =  *14( SPACE middle ) [ SPACE ":" trailing ]
//
//     nospcrlfcl =  %x01-09 / %x0B-0C / %x0E-1F / %x21-39 / %x3B-FF
//                     ; any octet except NUL, CR, LF, " " and ":"
//     middle     =  nospcrlfcl *( ":" / nospcrlfcl )
//     trailing   =  *( ":" / " " / nospcrlfcl )
//
//     SPACE      =  %x20        ; space character
//     crlf       =  %x0D %x0A   ; "carriage return" "linefeed"
fn is_nospcrlfcl(c: u8) -> bool {
    matches!(c, 0x01..=0x09 | 0x0B..=0x0C | 0x0E..=0x1F | 0x21..=0x39 | 0x3B..=0xFF)
}

//     middle     =  nospcrlfcl *( ":" / nospcrlfcl )
pub fn middle_parser(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| is_nospcrlfcl(c as u8)),
        many0(alt((
            tag(":"), // literal colon allowed after first char
            take_while1(|c: char| is_nospcrlfcl(c as u8)),
        ))),
    ))
    .parse(input)
}

//     trailing   =  *( ":" / " " / nospcrlfcl )
pub fn trailing_parser(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c == ':' || c == ' ' || is_nospcrlfcl(c as u8)).parse(input)
}

//     command    =  1*letter / 3digit
pub fn command_parser(input: &str) -> IResult<&str, &str> {
    alt((
        take_while1(|c: char| c.is_ascii_alphabetic()),
        take_while_m_n(3, 3, |c: char| c.is_ascii_digit()),
    ))
    .parse(input)
}

//     nickname   =  ( letter / special ) *8( letter / digit / special / "-" )
//     special    =  %x5B-60 / %x7B-7D
//                    ; "[", "]", "\", "`", "_", "^", "{", "|", "}"
fn is_nickname_tail_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-[]\\`^{}_|".contains(c)
}

fn is_nickname_first_char(c: char) -> bool {
    c.is_ascii_alphabetic() || "[]\\`^{}_|".contains(c)
}

pub fn nickname_parser(input: &str) -> IResult<&str, &str> {
    let first = satisfy(is_nickname_first_char);
    let tail = take_while(is_nickname_tail_char);
    let parser = recognize(pair(first, tail));

    // max length 9, first char rules out the empty string
    verify(parser, |s: &str| s.len() <= 9).parse(input)
}

//     channel    =  ( "#" / "&" ) chanstring
//     chanstring =  any octet except NUL, BELL, CR, LF, " ", "," and ":"
fn is_chan_char(c: char) -> bool {
    match c {
        '\u{0000}' | '\u{0007}' | '\r' | '\n' | ' ' | ',' | ':' => false,
        _ => (c as u32) <= 0xFF,
    }
}

fn chanstring_parser(input: &str) -> IResult<&str, &str> {
    take_while1(is_chan_char).parse(input)
}

pub fn channel_parser(input: &str) -> IResult<&str, &str> {
    recognize(pair(alt((tag("#"), tag("&"))), chanstring_parser)).parse(input)
}

/// Full-token channel name check used by the command handlers.
pub fn is_valid_channel_name(name: &str) -> bool {
    matches!(channel_parser(name), Ok(("", parsed)) if parsed.len() >= 2)
}

//     key        =  1*23( %x01-05 / %x07-08 / %x0C / %x0E-1F / %x21-7F )
//                   ; any 7-bit US_ASCII character,
//                   ; except NUL, CR, LF, FF, h/v TABs, and " "
fn is_key_char(c: char) -> bool {
    if !c.is_ascii() {
        return false;
    }
    let b = c as u8;
    matches!(b,
        0x01..=0x05 |
        0x07..=0x08 |
        0x0C |
        0x0E..=0x1F |
        0x21..=0x7F
    )
}

pub fn key_parser(input: &str) -> IResult<&str, &str> {
    verify(take_while1(is_key_char), |s: &str| s.len() <= 23).parse(input)
}

/// One wire line split into its syntactic parts. Parameter semantics are
/// applied later, per command.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage<'a> {
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub middles: Vec<&'a str>,
    pub trailing: Option<&'a str>,
}

/// Parses one CRLF-terminated line into prefix, command, middle parameters
/// and the optional colon-introduced trailing parameter.
pub fn message_parser(input: &str) -> IResult<&str, RawMessage<'_>> {
    let (rem, (prefix, command, middles, trailing, _crlf)) = (
        opt(terminated(preceded(char(':'), middle_parser), space1)),
        command_parser,
        many0(preceded(space1, middle_parser)),
        opt(preceded(tag(" :"), trailing_parser)),
        tag("\r\n"),
    )
        .parse(input)?;
    Ok((
        rem,
        RawMessage {
            prefix,
            command,
            middles,
            trailing,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_nicknames() {
        let cases = [
            "a",
            "a1",
            "abc123",
            "Z9",
            "x-y",
            "t[est]",
            "g{ood}",
            "h\\i", // backslash
            "j`k",  // backtick
            "m^n",
        ];

        for &case in &cases {
            let (rest, out) = nickname_parser(case).expect(&format!("Should parse: {case}"));
            assert_eq!(rest, "");
            assert_eq!(out, case);
        }
    }

    #[test]
    fn invalid_nicknames() {
        let cases = [
            "1abc", // cannot start with digit
            "",     // empty
            "waytoolongnick",
        ];

        for &case in &cases {
            assert!(nickname_parser(case).is_err(), "Should fail: {case}");
        }
    }

    #[test]
    fn channel_names_need_prefix_and_body() {
        assert!(is_valid_channel_name("#rust"));
        assert!(is_valid_channel_name("&local"));
        assert!(!is_valid_channel_name("#"));
        assert!(!is_valid_channel_name("rust"));
        assert!(!is_valid_channel_name("#bad channel"));
        assert!(!is_valid_channel_name("#bad,channel"));
    }

    #[test]
    fn key_rejects_spaces_and_length() {
        assert_eq!(key_parser("secret"), Ok(("", "secret")));
        assert_eq!(key_parser("sec ret"), Ok((" ret", "sec")));
        assert!(key_parser(&"k".repeat(24)).is_err());
    }

    #[test]
    fn message_without_prefix() {
        let (rem, msg) = message_parser("NICK testuser\r\n").unwrap();
        assert_eq!(rem, "");
        assert_eq!(msg.prefix, None);
        assert_eq!(msg.command, "NICK");
        assert_eq!(msg.middles, vec!["testuser"]);
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn message_with_prefix_and_trailing() {
        let (rem, msg) = message_parser(":alice PRIVMSG #rust :hello world\r\n").unwrap();
        assert_eq!(rem, "");
        assert_eq!(msg.prefix, Some("alice"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.middles, vec!["#rust"]);
        assert_eq!(msg.trailing, Some("hello world"));
    }

    #[test]
    fn trailing_may_be_empty() {
        let (_, msg) = message_parser("PRIVMSG #rust :\r\n").unwrap();
        assert_eq!(msg.trailing, Some(""));
    }

    #[test]
    fn message_requires_crlf() {
        assert!(message_parser("NICK testuser").is_err());
        assert!(message_parser("NICK testuser\n").is_err());
    }

    #[test]
    fn numeric_command_form() {
        let (_, msg) = message_parser("001 welcome\r\n").unwrap();
        assert_eq!(msg.command, "001");
    }
}
