//! External delivery channels for completion notifications.

pub mod webhook;
