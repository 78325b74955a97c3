pub mod channel;
pub mod config;
pub mod control;
pub mod duel;
pub mod io;
pub mod messages;
pub mod runtime;
