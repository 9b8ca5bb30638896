pub mod bcrypt64;
pub mod compare;
pub mod config;
pub mod driver;
pub mod hash;
pub mod kdf;
pub mod manager;
pub mod phc;
pub mod validate;

mod error;

pub use config::{DriverOptions, HashConfig};
pub use driver::HashDriver;
pub use error::Error;
pub use hash::{AssertionError, Hash};
pub use manager::HashManager;
