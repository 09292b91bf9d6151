//! Event handling and user interactions for welcome-bot.
//!
//! This module provides functionality for handling chat events:
//! - Dispatching events from the real-time stream
//! - Greeting users who join a channel
//! - Answering `help` mentions

pub mod dispatcher;
pub mod join;
pub mod mention;
