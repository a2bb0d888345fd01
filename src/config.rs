use clap::ValueEnum;

/// Number of participants the exercise is pinned to.
pub const REQUIRED_GROUP_SIZE: usize = 5;

/// How participants move their value around the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExchangeMode {
    /// Announce rank and value, then finish without exchanging
    Announce,
    /// One paired send/receive per participant
    #[default]
    Paired,
    /// Even ranks send first, odd ranks receive first
    Staggered,
}

#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Group size every participant checks against at startup
    pub group_size: usize,
    pub mode: ExchangeMode,
    /// Pin each participant thread to a CPU core
    pub pin_cores: bool,
    /// Program name used in the usage line
    pub program: String,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            group_size: REQUIRED_GROUP_SIZE,
            mode: ExchangeMode::default(),
            pin_cores: false,
            program: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl RingConfig {
    pub fn with_mode(mut self, mode: ExchangeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size;
        self
    }

    pub fn usage(&self) -> String {
        format!("usage: {} <{} numbers>", self.program, self.group_size)
    }

    pub fn group_size_error(&self) -> String {
        format!("error: must run with exactly {} processes", self.group_size)
    }
}
