//! Server and game configuration
//!
//! `GameConfig` holds the rule constants every session is created with;
//! `ServerConfig` holds the process-level settings read at startup.

use std::env;
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::ConfigError;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Rule constants shared by all sessions.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Seconds a player has to call a number before an automatic call.
    pub turn_seconds: u32,
    /// Period of the turn countdown.
    pub tick_interval: Duration,
    /// Completed lines needed to win, independent of grid size.
    pub winning_lines: usize,
    /// Score awarded to the winner.
    pub win_bonus: u32,
    /// Accepted board dimensions.
    pub grid_sizes: RangeInclusive<usize>,
    /// Characters in a generated room code.
    pub room_code_len: usize,
    /// Generate-and-check attempts before giving up on a free code.
    pub room_code_attempts: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_seconds: 15,
            tick_interval: Duration::from_secs(1),
            winning_lines: 5,
            win_bonus: 100,
            grid_sizes: 5..=8,
            room_code_len: 6,
            room_code_attempts: 32,
        }
    }
}

/// Process-level configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the TCP listener binds to.
    pub bind_addr: String,
    /// Capacity of the coordinator's command mailbox.
    pub command_buffer: usize,
    /// Capacity of each connection's outbound event queue.
    pub outbound_buffer: usize,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            command_buffer: 256,
            outbound_buffer: 64,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build the configuration from the command line and environment.
    ///
    /// Bind address: first CLI argument, then `BINGO_ADDR`, then `PORT`
    /// (bound on all interfaces), else [`DEFAULT_ADDR`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let arg = env::args().nth(1);
        let addr = env::var("BINGO_ADDR").ok();
        let port = env::var("PORT").ok();
        Self::resolve(arg, addr, port)
    }

    fn resolve(
        arg: Option<String>,
        addr: Option<String>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind_addr = match (arg, addr, port) {
            (Some(arg), _, _) => arg,
            (None, Some(addr), _) => addr,
            (None, None, Some(port)) => {
                let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    name: "PORT",
                    value: port.clone(),
                })?;
                format!("0.0.0.0:{}", port)
            }
            (None, None, None) => DEFAULT_ADDR.to_string(),
        };

        Ok(Self {
            bind_addr,
            ..Self::default()
        })
    }
}
