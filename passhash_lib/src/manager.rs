use std::collections::BTreeMap;

use crate::Error;
use crate::config::HashConfig;
use crate::driver::HashDriver;
use crate::hash::Hash;

pub type DynHash = Hash<Box<dyn HashDriver>>;

/// Named collection of hashers with a default.
pub struct HashManager {
    default: String,
    hashers: BTreeMap<String, DynHash>,
}

impl HashManager {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            hashers: BTreeMap::new(),
        }
    }

    /// Adds or replaces the hasher called `name`.
    pub fn register(&mut self, name: impl Into<String>, driver: impl HashDriver + 'static) {
        let driver: Box<dyn HashDriver> = Box::new(driver);

        self.hashers.insert(name.into(), Hash::new(driver));
    }

    /// Looks up `name`, or the default hasher when `None`.
    pub fn use_hasher(&self, name: Option<&str>) -> Result<&DynHash, Error> {
        let name = name.unwrap_or(&self.default);

        self.hashers
            .get(name)
            .ok_or_else(|| Error::UnknownHasher(name.to_owned()))
    }

    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hashers.keys().map(String::as_str)
    }

    /// Name of the hasher able to verify `value`, trying the default first.
    ///
    /// Formats a hasher reads but never writes count, so a native bcrypt string routes to
    /// a bcrypt hasher.
    #[must_use]
    pub fn identify(&self, value: &str) -> Option<&str> {
        let default = self
            .hashers
            .get_key_value(self.default.as_str())
            .into_iter();

        let others = self
            .hashers
            .iter()
            .filter(|(name, _)| **name != self.default);

        default
            .chain(others)
            .find(|(_, hash)| hash.can_verify(value))
            .map(|(name, _)| name.as_str())
    }
}

impl TryFrom<&HashConfig> for HashManager {
    type Error = Error;

    fn try_from(config: &HashConfig) -> Result<Self, Self::Error> {
        let mut manager = Self::new(config.default.clone());

        for (name, options) in &config.hashers {
            let driver = options.build().inspect_err(|e| {
                log::debug!("Hasher {name} ({}) rejected: {e}", options.driver_name());
            })?;

            manager.hashers.insert(name.clone(), Hash::new(driver));
        }

        manager.use_hasher(None)?;

        Ok(manager)
    }
}

#[cfg(all(test, feature = "full"))]
mod test {
    use super::*;
    use crate::config::DriverOptions;
    use crate::driver::{
        ArgonDriver, ArgonOptions, BcryptDriver, BcryptOptions, ScryptDriver, ScryptOptions,
    };

    fn manager() -> Result<HashManager, Error> {
        let mut manager = HashManager::new("scrypt");

        manager.register(
            "scrypt",
            ScryptDriver::new(ScryptOptions {
                cost: Some(1024),
                ..ScryptOptions::default()
            })?,
        );
        manager.register(
            "bcrypt",
            BcryptDriver::new(BcryptOptions {
                rounds: Some(4),
                ..BcryptOptions::default()
            })?,
        );
        manager.register(
            "argon",
            ArgonDriver::new(ArgonOptions {
                memory: Some(256),
                iterations: Some(1),
                parallelism: Some(1),
                ..ArgonOptions::default()
            })?,
        );

        Ok(manager)
    }

    #[test]
    fn default_and_named_hashers() -> Result<(), Box<dyn std::error::Error>> {
        let manager = manager()?;

        let hashed = manager.use_hasher(None)?.make(b"secret")?;
        assert!(hashed.starts_with("$scrypt$"));

        let hashed = manager.use_hasher(Some("bcrypt"))?.make(b"secret")?;
        assert!(hashed.starts_with("$bcrypt$"));

        assert_eq!(manager.names().collect::<Vec<_>>(), ["argon", "bcrypt", "scrypt"]);
        assert_eq!(manager.default_name(), "scrypt");

        Ok(())
    }

    #[test]
    fn unknown_hasher() -> Result<(), Box<dyn std::error::Error>> {
        let manager = manager()?;

        assert!(matches!(
            manager.use_hasher(Some("md5")),
            Err(Error::UnknownHasher(name)) if name == "md5"
        ));

        Ok(())
    }

    #[test]
    fn identify_routes_to_producer() -> Result<(), Box<dyn std::error::Error>> {
        let manager = manager()?;

        for name in ["scrypt", "bcrypt", "argon"] {
            let hashed = manager.use_hasher(Some(name))?.make(b"secret")?;

            assert_eq!(manager.identify(&hashed), Some(name));
        }

        assert_eq!(manager.identify("not a hash"), None);

        Ok(())
    }

    #[test]
    fn native_bcrypt_routes_to_bcrypt() -> Result<(), Box<dyn std::error::Error>> {
        let manager = HashManager::try_from(&HashConfig::default())?;
        let native = ::bcrypt::hash("secret", 4)?;

        let name = manager.identify(&native);
        assert_eq!(name, Some("bcrypt"));

        let hash = manager.use_hasher(name)?;
        assert!(hash.verify(&native, b"secret")?);
        assert!(!hash.verify(&native, b"wrong")?);
        assert!(hash.needs_rehash(&native));

        Ok(())
    }

    #[test]
    fn built_from_config() -> Result<(), Box<dyn std::error::Error>> {
        let mut config = HashConfig {
            default: "fast".to_owned(),
            hashers: BTreeMap::new(),
        };
        config.hashers.insert(
            "fast".to_owned(),
            DriverOptions::Bcrypt(BcryptOptions {
                rounds: Some(4),
                ..BcryptOptions::default()
            }),
        );

        let manager = HashManager::try_from(&config)?;
        let hash = manager.use_hasher(None)?;
        let hashed = hash.make(b"secret")?;

        assert!(hash.verify(&hashed, b"secret")?);

        Ok(())
    }

    #[test]
    fn config_errors_surface_at_construction() {
        let mut config = HashConfig {
            default: "fast".to_owned(),
            hashers: BTreeMap::new(),
        };

        assert!(matches!(
            HashManager::try_from(&config),
            Err(Error::UnknownHasher(_))
        ));

        config.hashers.insert(
            "fast".to_owned(),
            DriverOptions::Bcrypt(BcryptOptions {
                rounds: Some(3),
                ..BcryptOptions::default()
            }),
        );

        assert!(matches!(
            HashManager::try_from(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn default_config_builds() -> Result<(), Box<dyn std::error::Error>> {
        let manager = HashManager::try_from(&HashConfig::default())?;

        assert_eq!(manager.default_name(), "argon");
        assert_eq!(manager.names().count(), 3);

        Ok(())
    }
}
