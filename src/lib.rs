// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod records;
pub mod runtime;
pub mod scorer;
pub mod session;
pub mod stimulus;
pub mod storage;
pub mod util;

pub use error::{Error, Result};
