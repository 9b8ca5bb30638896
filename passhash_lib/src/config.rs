//! Serializable description of a [`HashManager`](crate::manager::HashManager).
//!
//! ```toml
//! default = "argon"
//!
//! [hashers.argon]
//! driver = "argon2"
//! memory = 19456
//! iterations = 2
//!
//! [hashers.legacy]
//! driver = "bcrypt"
//! rounds = 12
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::driver::{
    ArgonDriver, ArgonOptions, BcryptDriver, BcryptOptions, HashDriver, ScryptDriver,
    ScryptOptions,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum DriverOptions {
    Scrypt(ScryptOptions),
    Bcrypt(BcryptOptions),
    Argon2(ArgonOptions),
}

impl DriverOptions {
    /// Builds the driver with the default primitives.
    pub fn build(&self) -> Result<Box<dyn HashDriver>, Error> {
        let driver: Box<dyn HashDriver> = match self {
            Self::Scrypt(options) => Box::new(ScryptDriver::new(options.clone())?),
            Self::Bcrypt(options) => Box::new(BcryptDriver::new(options.clone())?),
            Self::Argon2(options) => Box::new(ArgonDriver::new(options.clone())?),
        };

        Ok(driver)
    }

    #[must_use]
    pub const fn driver_name(&self) -> &'static str {
        match self {
            Self::Scrypt(_) => "scrypt",
            Self::Bcrypt(_) => "bcrypt",
            Self::Argon2(_) => "argon2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HashConfig {
    pub default: String,
    #[serde(default)]
    pub hashers: BTreeMap<String, DriverOptions>,
}

impl Default for HashConfig {
    fn default() -> Self {
        let hashers = [
            ("argon".to_owned(), DriverOptions::Argon2(ArgonOptions::default())),
            ("bcrypt".to_owned(), DriverOptions::Bcrypt(BcryptOptions::default())),
            ("scrypt".to_owned(), DriverOptions::Scrypt(ScryptOptions::default())),
        ];

        Self {
            default: "argon".to_owned(),
            hashers: hashers.into_iter().collect(),
        }
    }
}
