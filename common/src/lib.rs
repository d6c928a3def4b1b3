pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod utils;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use storage::*;
pub use utils::*;
