//! The request/notification state machine: `coordinator` issues the request,
//! `session` decides which events apply to it.

pub mod coordinator;
pub mod session;
