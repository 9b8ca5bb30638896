use serde::{Deserialize, Serialize};

use super::HashDriver;
use crate::Error;
use crate::compare;
use crate::kdf::random::{OsRandom, RandomSource};
use crate::kdf::{Backend, ScryptCost, ScryptKdf};
use crate::phc::{self, Params, Record};
use crate::validate;

pub const ID: &str = "scrypt";

const DEFAULT_COST: u64 = 16384;
const DEFAULT_BLOCK_SIZE: u32 = 8;
const DEFAULT_PARALLELIZATION: u32 = 1;
const DEFAULT_SALT_SIZE: usize = 16;
const DEFAULT_KEY_LENGTH: usize = 64;
const DEFAULT_MAX_MEMORY: u64 = 32 * 1024 * 1024;
const DEFAULT_MAX_PARALLELIZATION: u32 = 16;

/// Caller supplied overrides, unset fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScryptOptions {
    pub cost: Option<u64>,
    pub block_size: Option<u32>,
    pub parallelization: Option<u32>,
    pub salt_size: Option<usize>,
    pub key_length: Option<usize>,
    pub max_memory: Option<u64>,
    pub max_parallelization: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptConfig {
    cost: u64,
    block_size: u32,
    parallelization: u32,
    salt_size: usize,
    key_length: usize,
    max_memory: u64,
    max_parallelization: u32,
    kdf: ScryptCost,
}

/// Limits applied to a cost triple besides the RFC 7914 bounds.
#[derive(Debug, Clone, Copy)]
struct Limits {
    max_memory: u64,
    max_parallelization: u32,
}

/// Validates a cost triple against RFC 7914 and the configured limits.
fn check_cost(
    cost: u64,
    block_size: u32,
    parallelization: u32,
    limits: Limits,
) -> Result<ScryptCost, validate::Error> {
    validate::range("cost", cost, 2, u64::from(u32::MAX))?;
    validate::power_of_two("cost", cost)?;
    validate::range("blockSize", block_size, 1, u32::MAX)?;

    let rfc_bound = (u64::from(u32::MAX) * 32) / (128 * u64::from(block_size));
    validate::range(
        "parallelization",
        u64::from(parallelization),
        1,
        rfc_bound.min(u64::from(limits.max_parallelization)),
    )?;

    if u64::from(block_size) * u64::from(parallelization) >= 1 << 30 {
        return Err(validate::Error::new(
            "parallelization",
            "times blockSize must be below 2^30",
        ));
    }

    let log_n = validate::narrow::<u8>("cost", u64::from(cost.trailing_zeros()))?;

    if u64::from(log_n) >= 16 * u64::from(block_size) {
        return Err(validate::Error::new(
            "cost",
            format!("must be below 2^(16 * blockSize), got {cost}"),
        ));
    }

    let required = 128 * u128::from(cost) * u128::from(block_size);
    if required >= u128::from(limits.max_memory) {
        return Err(validate::Error::new(
            "maxMemory",
            format!(
                "must exceed 128 * cost * blockSize = {required}, got {}",
                limits.max_memory
            ),
        ));
    }

    Ok(ScryptCost {
        log_n,
        block_size,
        parallelization,
    })
}

fn check_salt(length: usize) -> Result<usize, validate::Error> {
    validate::range("saltSize", length, 8, 1024)
}

fn check_key(length: usize) -> Result<usize, validate::Error> {
    validate::range("keyLength", length, 64, 128)
}

impl TryFrom<ScryptOptions> for ScryptConfig {
    type Error = validate::Error;

    fn try_from(options: ScryptOptions) -> Result<Self, Self::Error> {
        let cost = options.cost.unwrap_or(DEFAULT_COST);
        let block_size = options.block_size.unwrap_or(DEFAULT_BLOCK_SIZE);
        let parallelization = options.parallelization.unwrap_or(DEFAULT_PARALLELIZATION);
        let limits = Limits {
            max_memory: options.max_memory.unwrap_or(DEFAULT_MAX_MEMORY),
            max_parallelization: validate::range(
                "maxParallelization",
                options
                    .max_parallelization
                    .unwrap_or(DEFAULT_MAX_PARALLELIZATION),
                1,
                u32::MAX,
            )?,
        };

        Ok(Self {
            cost,
            block_size,
            parallelization,
            salt_size: check_salt(options.salt_size.unwrap_or(DEFAULT_SALT_SIZE))?,
            key_length: check_key(options.key_length.unwrap_or(DEFAULT_KEY_LENGTH))?,
            max_memory: limits.max_memory,
            max_parallelization: limits.max_parallelization,
            kdf: check_cost(cost, block_size, parallelization, limits)?,
        })
    }
}

impl ScryptConfig {
    #[must_use]
    pub const fn cost(&self) -> u64 {
        self.cost
    }

    #[must_use]
    pub const fn block_size(&self) -> u32 {
        self.block_size
    }

    #[must_use]
    pub const fn parallelization(&self) -> u32 {
        self.parallelization
    }

    #[must_use]
    pub const fn salt_size(&self) -> usize {
        self.salt_size
    }

    #[must_use]
    pub const fn key_length(&self) -> usize {
        self.key_length
    }

    #[must_use]
    pub const fn max_memory(&self) -> u64 {
        self.max_memory
    }

    #[must_use]
    pub const fn max_parallelization(&self) -> u32 {
        self.max_parallelization
    }

    const fn limits(&self) -> Limits {
        Limits {
            max_memory: self.max_memory,
            max_parallelization: self.max_parallelization,
        }
    }
}

/// Fields of a stored scrypt hash that passed validation.
#[derive(Debug)]
struct Stored {
    cost: u64,
    kdf: ScryptCost,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

pub struct ScryptDriver<K = Backend, R = OsRandom> {
    config: ScryptConfig,
    kdf: K,
    random: R,
}

impl ScryptDriver {
    pub fn new(options: ScryptOptions) -> Result<Self, Error> {
        Self::with_primitives(options, Backend, OsRandom)
    }
}

impl<K: ScryptKdf, R: RandomSource> ScryptDriver<K, R> {
    pub fn with_primitives(options: ScryptOptions, kdf: K, random: R) -> Result<Self, Error> {
        let config = ScryptConfig::try_from(options)?;

        Ok(Self {
            config,
            kdf,
            random,
        })
    }

    #[must_use]
    pub fn with_random<S: RandomSource>(self, random: S) -> ScryptDriver<K, S> {
        ScryptDriver {
            config: self.config,
            kdf: self.kdf,
            random,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ScryptConfig {
        &self.config
    }

    fn decode(&self, value: &str) -> Result<Stored, Error> {
        let record = phc::deserialize(value)?;

        if record.id != ID {
            return Err(Error::Decoding("hash was not produced by scrypt"));
        }

        if record.version.is_some() {
            return Err(Error::Decoding("scrypt hashes carry no version"));
        }

        let [n, r, p] = super::params(&record, ["n", "r", "p"])?;

        let block_size = validate::narrow("blockSize", r).map_err(Error::Parameter)?;
        let parallelization = validate::narrow("parallelization", p).map_err(Error::Parameter)?;

        let kdf = check_cost(n, block_size, parallelization, self.config.limits())
            .map_err(Error::Parameter)?;

        check_salt(record.salt.len()).map_err(Error::Parameter)?;
        check_key(record.hash.len()).map_err(Error::Parameter)?;

        Ok(Stored {
            cost: n,
            kdf,
            salt: record.salt,
            hash: record.hash,
        })
    }
}

impl<K: ScryptKdf, R: RandomSource> HashDriver for ScryptDriver<K, R> {
    fn is_valid_hash(&self, value: &str) -> bool {
        super::is_valid(self.decode(value))
    }

    fn make(&self, plaintext: &[u8]) -> Result<String, Error> {
        let salt = self.random.bytes(self.config.salt_size)?;

        let mut hash = vec![0; self.config.key_length];
        self.kdf
            .derive(plaintext, &salt, self.config.kdf, &mut hash)?;

        let params = Params::new()
            .with("n", self.config.cost)
            .with("r", u64::from(self.config.block_size))
            .with("p", u64::from(self.config.parallelization));

        phc::serialize(&Record::new(ID, salt, hash).params(params))
    }

    fn verify(&self, hashed: &str, plaintext: &[u8]) -> Result<bool, Error> {
        super::fail_closed(self.decode(hashed).and_then(|stored| {
            let mut derived = vec![0; stored.hash.len()];
            self.kdf
                .derive(plaintext, &stored.salt, stored.kdf, &mut derived)?;

            Ok(compare::compare_bytes(&stored.hash, &derived))
        }))
    }

    fn needs_rehash(&self, hashed: &str) -> bool {
        let Ok(stored) = self.decode(hashed) else {
            return true;
        };

        stored.cost != self.config.cost
            || stored.kdf.block_size != self.config.block_size
            || stored.kdf.parallelization != self.config.parallelization
            || stored.salt.len() != self.config.salt_size
            || stored.hash.len() != self.config.key_length
    }
}

#[cfg(all(test, feature = "scrypt"))]
mod test {
    use super::*;
    use crate::driver::test::driver_contract;

    fn fast() -> ScryptDriver {
        ScryptDriver::new(ScryptOptions {
            cost: Some(1024),
            ..ScryptOptions::default()
        })
        .expect("valid options")
    }

    driver_contract!(scrypt, fast());

    #[test]
    fn default_scenario() -> Result<(), Box<dyn std::error::Error>> {
        let driver = ScryptDriver::new(ScryptOptions::default())?;

        let hashed = driver.make(b"secret")?;

        assert!(hashed.starts_with("$scrypt$n=16384,r=8,p=1$"));
        assert!(driver.verify(&hashed, b"secret")?);
        assert!(!driver.verify(&hashed, b"wrong")?);

        let record = phc::deserialize(&hashed)?;
        assert_eq!(record.salt.len(), 16);
        assert_eq!(record.hash.len(), 64);

        Ok(())
    }

    #[test]
    fn non_integer_parameter() {
        let driver = fast();

        assert!(!driver.is_valid_hash("$scrypt$n=abc$salt$hash"));
        assert!(driver.needs_rehash("$scrypt$n=abc$salt$hash"));
    }

    #[test]
    fn defaults() -> Result<(), Box<dyn std::error::Error>> {
        let config = ScryptConfig::try_from(ScryptOptions::default())?;

        assert_eq!(config.cost(), 16384);
        assert_eq!(config.block_size(), 8);
        assert_eq!(config.parallelization(), 1);
        assert_eq!(config.salt_size(), 16);
        assert_eq!(config.key_length(), 64);
        assert_eq!(config.max_memory(), 32 * 1024 * 1024);
        assert_eq!(config.max_parallelization(), 16);

        Ok(())
    }

    #[test]
    fn invalid_options_are_rejected() {
        let invalid = [
            ScryptOptions {
                cost: Some(1),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                cost: Some(1000),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                block_size: Some(0),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                parallelization: Some(0),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                salt_size: Some(7),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                salt_size: Some(1025),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                key_length: Some(63),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                key_length: Some(129),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                max_memory: Some(128 * 16384 * 8),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                cost: Some(1 << 16),
                block_size: Some(1),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                parallelization: Some(17),
                ..ScryptOptions::default()
            },
            ScryptOptions {
                max_parallelization: Some(0),
                ..ScryptOptions::default()
            },
        ];

        for options in invalid {
            assert!(
                matches!(ScryptDriver::new(options.clone()), Err(Error::Config(_))),
                "{options:?}"
            );
        }
    }

    #[test]
    fn parallelization_bound_depends_on_block_size() {
        let single = ScryptOptions {
            cost: Some(1024),
            block_size: Some(1 << 29),
            parallelization: Some(1),
            max_memory: Some(u64::MAX),
            ..ScryptOptions::default()
        };

        let double = ScryptOptions {
            parallelization: Some(2),
            ..single.clone()
        };

        assert!(ScryptConfig::try_from(single).is_ok());
        assert!(ScryptConfig::try_from(double).is_err());
    }

    #[test]
    fn config_change_requires_rehash() -> Result<(), Box<dyn std::error::Error>> {
        let old = fast();
        let hashed = old.make(b"secret")?;

        let new = ScryptDriver::new(ScryptOptions {
            cost: Some(2048),
            ..ScryptOptions::default()
        })?;

        assert!(new.needs_rehash(&hashed));
        assert!(new.verify(&hashed, b"secret")?);
        assert!(!new.needs_rehash(&new.make(b"secret")?));

        let longer_key = ScryptDriver::new(ScryptOptions {
            cost: Some(1024),
            key_length: Some(128),
            ..ScryptOptions::default()
        })?;

        assert!(longer_key.needs_rehash(&hashed));

        Ok(())
    }

    #[test]
    fn foreign_ids_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let driver = fast();
        let mut record = phc::deserialize(&driver.make(b"secret")?)?;
        record.id = "bcrypt".to_owned();
        let foreign = phc::serialize(&record)?;

        assert!(!driver.is_valid_hash(&foreign));
        assert!(!driver.verify(&foreign, b"secret")?);
        assert!(driver.needs_rehash(&foreign));

        Ok(())
    }

    #[test]
    fn stored_params_beyond_memory_limit_fail_closed() -> Result<(), Box<dyn std::error::Error>> {
        let driver = fast();
        let mut record = phc::deserialize(&driver.make(b"secret")?)?;
        record.params.insert("n", 1 << 20);
        let expensive = phc::serialize(&record)?;

        assert!(!driver.is_valid_hash(&expensive));
        assert!(!driver.verify(&expensive, b"secret")?);

        Ok(())
    }

    #[test]
    fn oversized_stored_parallelization_fails_closed() -> Result<(), Box<dyn std::error::Error>> {
        let driver = fast();
        let mut record = phc::deserialize(&driver.make(b"secret")?)?;
        record.params = Params::new().with("n", 1024).with("r", 1).with("p", 33_554_431);
        let expensive = phc::serialize(&record)?;

        assert!(!driver.is_valid_hash(&expensive));
        assert!(!driver.verify(&expensive, b"secret")?);
        assert!(driver.needs_rehash(&expensive));

        let wide = ScryptDriver::new(ScryptOptions {
            cost: Some(1024),
            parallelization: Some(32),
            max_parallelization: Some(32),
            ..ScryptOptions::default()
        })?;
        let hashed = wide.make(b"secret")?;

        assert!(wide.verify(&hashed, b"secret")?);
        assert!(!fast().verify(&hashed, b"secret")?);

        Ok(())
    }

    #[test]
    fn extra_or_missing_params_fail_closed() -> Result<(), Box<dyn std::error::Error>> {
        let driver = fast();
        let record = phc::deserialize(&driver.make(b"secret")?)?;

        let mut extra = record.clone();
        extra.params.insert("x", 1);
        let extra = phc::serialize(&extra)?;

        let mut missing = record;
        missing.params = Params::new().with("n", 1024).with("r", 8);
        let missing = phc::serialize(&missing)?;

        for value in [extra, missing] {
            assert!(!driver.is_valid_hash(&value));
            assert!(!driver.verify(&value, b"secret")?);
            assert!(driver.needs_rehash(&value));
        }

        Ok(())
    }

    #[test]
    fn param_order_does_not_matter_for_verification() -> Result<(), Box<dyn std::error::Error>> {
        let driver = fast();
        let mut record = phc::deserialize(&driver.make(b"secret")?)?;
        record.params = Params::new().with("p", 1).with("r", 8).with("n", 1024);
        let reordered = phc::serialize(&record)?;

        assert!(driver.verify(&reordered, b"secret")?);

        Ok(())
    }
}
