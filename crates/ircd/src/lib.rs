//! An RFC 1459 style IRC daemon: password-gated registration, in-memory
//! channels with `+i`/`+t`/`+k`/`+l` access policies and message relay
//! between users and channels.
//!
//! Layering, leaves first: `replies` builds protocol lines, `parsers` and
//! `commands` turn wire lines into validated command values, `session` and
//! `channel` hold the per-connection and per-channel state, `server_state`
//! with `handlers` dispatches commands and mutates that state, `listener`
//! owns the sockets.

pub mod channel;
pub mod commands;
pub mod config;
pub mod constants;
pub mod errors;
pub mod handlers;
pub mod listener;
pub mod message_models;
pub mod parsers;
pub mod replies;
pub mod server_state;
pub mod session;
