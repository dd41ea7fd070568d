// paircache - color-pair slot allocation for terminal renderers
// Fixed-capacity (fg, bg) → pair id cache with LRU reuse

#![warn(rust_2018_idioms)]

pub mod config;
pub mod pairs;
pub mod script;

// Re-exports for convenience
pub use crate::config::PairCacheConfig;
pub use pairs::{
    ActivePair, CapacitySource, ColorId, ColorKey, PairAllocator, PairId, PairObserver, PairStats,
    SharedPairCache, SlotMode,
};

/// paircache error types
pub mod error {
    use crate::pairs::PairId;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid pair: {0}")]
        InvalidSlot(PairId),

        #[error("Pair {0} is not in use")]
        AlreadyFree(PairId),

        #[error("No free pair available")]
        NoFreeSlot,

        #[error("Pair list corrupted: {0}")]
        ConsistencyViolation(String),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Script error at line {line}: {message}")]
        Script { line: usize, message: String },
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
