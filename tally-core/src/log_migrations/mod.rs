//! Event log migrations - embedded SQL files
//!
//! Same mechanism as `migrations`, for the separate logs database.

pub const LOG_MIGRATIONS: &[(&str, &str)] = &[("000_events.sql", include_str!("000_events.sql"))];
