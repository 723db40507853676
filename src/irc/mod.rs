//! Thin IRC wire layer: line codec and TLS transport.
//!
//! Produces a stream of parsed [`message::Message`]s and accepts outbound
//! ones. Everything above this module works with structured messages only;
//! everything below is replaceable plumbing.

pub mod message;
pub mod transport;

pub use message::Message;
