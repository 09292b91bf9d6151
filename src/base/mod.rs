//! Core components, types, and utilities for the welcome-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - The static response table.
//! - Common types, chat events, and result handling.

pub mod config;
pub mod responses;
pub mod types;
