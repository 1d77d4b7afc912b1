//! Server-wide constants: the server name, the numeric reply catalogue and
//! the buffer/liveness limits enforced by the event loop.

/// Compile-time server name used as the prefix of every numeric reply.
pub const SERVER_NAME: &str = "ft_irc.42.de";

/// Info text sent in RPL_WHOISSERVER.
pub const SERVER_INFO: &str = "ft_irc Server";

/// Maximum IRC line length including CRLF (RFC 2812 section 2.3).
pub const MAX_LINE_LEN: usize = 512;

/// Size of the per-read scratch buffer used by the reader task.
pub const READ_BUFFER_SIZE: usize = 512;

/// Soft cap on a client's inbound line buffer. Appending past this clears
/// the buffer and produces a single "input line too long" reply.
pub const MAX_INBOUND_BUFFER: usize = 2048;

//    001    RPL_WELCOME
//           "Welcome to the Internet Relay Network <nick>!<user>@<host>"
pub const RPL_WELCOME_NB: u16 = 1;
pub const RPL_WELCOME_STR: &str = "Welcome to the ft_IRC Network";

//    311    RPL_WHOISUSER
//           "<nick> <user> <host> * :<real name>"
pub const RPL_WHOISUSER_NB: u16 = 311;

//    312    RPL_WHOISSERVER
//           "<nick> <server> :<server info>"
pub const RPL_WHOISSERVER_NB: u16 = 312;

//    318    RPL_ENDOFWHOIS
//           "<nick> :End of WHOIS list"
pub const RPL_ENDOFWHOIS_NB: u16 = 318;
pub const RPL_ENDOFWHOIS_STR: &str = "End of WHOIS list";

//    324    RPL_CHANNELMODEIS
//           "<channel> <mode> <mode params>"
pub const RPL_CHANNELMODEIS_NB: u16 = 324;

//    331    RPL_NOTOPIC
//           "<channel> :No topic is set"
pub const RPL_NOTOPIC_NB: u16 = 331;
pub const RPL_NOTOPIC_STR: &str = "Topic of this channel is not set yet";

//    332    RPL_TOPIC
//           "<channel> :<topic>"
pub const RPL_TOPIC_NB: u16 = 332;

//    341    RPL_INVITING
//           "<channel> <nick>"
pub const RPL_INVITING_NB: u16 = 341;

//    401    ERR_NOSUCHNICK
//           "<nickname> :No such nick/channel"
pub const ERR_NOSUCHNICK_NB: u16 = 401;
pub const ERR_NOSUCHNICK_STR: &str = "No such nick";

//    403    ERR_NOSUCHCHANNEL
//           "<channel name> :No such channel"
pub const ERR_NOSUCHCHANNEL_NB: u16 = 403;
pub const ERR_NOSUCHCHANNEL_STR: &str = "No such channel";

//    417    ERR_INPUTTOOLONG
//           ":Input line was too long"
pub const ERR_INPUTTOOLONG_NB: u16 = 417;
pub const ERR_INPUTTOOLONG_STR: &str = "Input line was too long";

//    421    ERR_UNKNOWNCOMMAND
//           "<command> :Unknown command"
pub const ERR_UNKNOWNCOMMAND_NB: u16 = 421;
pub const ERR_UNKNOWNCOMMAND_STR: &str = "Unknown command";

//    433    ERR_NICKNAMEINUSE
//           "<nick> :Nickname is already in use"
pub const ERR_NICKNAMEINUSE_NB: u16 = 433;
pub const ERR_NICKNAMEINUSE_STR: &str = "Nickname is already in use";

//    441    ERR_USERNOTINCHANNEL
//           "<nick> <channel> :They aren't on that channel"
pub const ERR_USERNOTINCHANNEL_NB: u16 = 441;
pub const ERR_USERNOTINCHANNEL_STR: &str = "They aren't on that channel";

//    442    ERR_NOTONCHANNEL
//           "<channel> :You're not on that channel"
pub const ERR_NOTONCHANNEL_NB: u16 = 442;
pub const ERR_NOTONCHANNEL_STR: &str = "You're not on that channel";

//    443    ERR_USERONCHANNEL
//           "<user> <channel> :is already on channel"
pub const ERR_USERONCHANNEL_NB: u16 = 443;
pub const ERR_USERONCHANNEL_STR: &str = "is already on channel";

//    461    ERR_NEEDMOREPARAMS
//           "<command> :Not enough parameters"
//
//          - Returned by the server by numerous commands to
//            indicate to the client that it didn't supply enough
//            parameters.
pub const ERR_NEEDMOREPARAMS_NB: u16 = 461;
pub const ERR_NEEDMOREPARAMS_STR: &str = "Not enough parameters";

//    462    ERR_ALREADYREGISTRED
//           ":You may not reregister"
pub const ERR_ALREADYREGISTRED_NB: u16 = 462;
pub const ERR_ALREADYREGISTRED_STR: &str = "You may not reregister";

//    464    ERR_PASSWDMISMATCH
//           ":Password incorrect"
pub const ERR_PASSWDMISMATCH_NB: u16 = 464;
pub const ERR_PASSWDMISMATCH_STR: &str = "Password incorrect. Usage: PASS <password>";

//    471    ERR_CHANNELISFULL
//           "<channel> :Cannot join channel (+l)"
pub const ERR_CHANNELISFULL_NB: u16 = 471;
pub const ERR_CHANNELISFULL_STR: &str = "Cannot join channel (+l)";

//    473    ERR_INVITEONLYCHAN
//           "<channel> :Cannot join channel (+i)"
pub const ERR_INVITEONLYCHAN_NB: u16 = 473;
pub const ERR_INVITEONLYCHAN_STR: &str = "Cannot join channel (+i)";

//    475    ERR_BADCHANNELKEY
//           "<channel> :Cannot join channel (+k)"
pub const ERR_BADCHANNELKEY_NB: u16 = 475;
pub const ERR_BADCHANNELKEY_STR: &str = "Cannot join channel (+k)";

//    482    ERR_CHANOPRIVSNEEDED
//           "<channel> :You're not channel operator"
pub const ERR_CHANOPRIVSNEEDED_NB: u16 = 482;
pub const ERR_CHANOPRIVSNEEDED_STR: &str = "You're not channel operator";

//    502    ERR_USERSDONTMATCH
//           ":Cannot change mode for other users"
pub const ERR_USERSDONTMATCH_NB: u16 = 502;
pub const ERR_USERSDONTMATCH_STR: &str = "Cannot change mode for other users";
