//! External delivery channels.
//!
//! The push channel hands notifications to an external gateway over HTTP;
//! transport internals past that POST are out of scope.

pub mod push;
