use serde::{Deserialize, Serialize};

use super::HashDriver;
use crate::Error;
use crate::compare;
use crate::kdf::random::{OsRandom, RandomSource};
use crate::kdf::{ArgonCost, ArgonKdf, Backend};
use crate::phc::{self, Params, Record};
use crate::validate;

/// Recognized versions, `0x10` and `0x13`.
pub const VERSIONS: [u32; 2] = [16, 19];

/// Version assumed for records that omit it.
const LEGACY_VERSION: u32 = 16;

// NOTE: Bounds from RFC 9106
const MIN_MEMORY: u32 = 8;
const MIN_ITERATIONS: u32 = 1;
const MAX_PARALLELISM: u32 = 0x00ff_ffff;
const MIN_SALT_SIZE: usize = 8;
const MAX_SALT_SIZE: usize = 1024;
const MIN_HASH_LENGTH: usize = 4;
const MAX_HASH_LENGTH: usize = u32::MAX as usize;

const DEFAULT_VERSION: u32 = 19;
const DEFAULT_ITERATIONS: u32 = 3;
const DEFAULT_MEMORY: u32 = 65536;
const DEFAULT_PARALLELISM: u32 = 4;
const DEFAULT_SALT_SIZE: usize = 16;
const DEFAULT_HASH_LENGTH: usize = 32;
const DEFAULT_MAX_MEMORY: u32 = 4 * DEFAULT_MEMORY;
const DEFAULT_MAX_ITERATIONS: u32 = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    D,
    I,
    #[default]
    Id,
}

impl Variant {
    /// PHC identifier of the variant.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::D => "argon2d",
            Self::I => "argon2i",
            Self::Id => "argon2id",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        [Self::D, Self::I, Self::Id]
            .into_iter()
            .find(|variant| variant.id() == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArgonOptions {
    pub variant: Option<Variant>,
    pub version: Option<u32>,
    pub iterations: Option<u32>,
    pub memory: Option<u32>,
    pub parallelism: Option<u32>,
    pub salt_size: Option<usize>,
    pub hash_length: Option<usize>,
    /// Largest memory cost in KiB accepted from a stored hash.
    pub max_memory: Option<u32>,
    /// Largest iteration count accepted from a stored hash.
    pub max_iterations: Option<u32>,
}

/// Upper bounds on the work a single hash may demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Limits {
    max_memory: u32,
    max_iterations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgonConfig {
    cost: ArgonCost,
    salt_size: usize,
    hash_length: usize,
    limits: Limits,
}

fn check_cost(
    variant: Variant,
    version: u32,
    [memory, iterations, parallelism]: [u32; 3],
    limits: Limits,
) -> Result<ArgonCost, validate::Error> {
    validate::one_of("version", version, &VERSIONS)?;
    validate::range("iterations", iterations, MIN_ITERATIONS, limits.max_iterations)?;
    validate::range("parallelism", parallelism, 1, MAX_PARALLELISM)?;

    let min_memory = MIN_MEMORY.max(parallelism.saturating_mul(8));
    validate::range("memory", memory, min_memory, limits.max_memory)?;

    Ok(ArgonCost {
        variant,
        version,
        memory,
        iterations,
        parallelism,
    })
}

fn check_salt(length: usize) -> Result<usize, validate::Error> {
    validate::range("saltSize", length, MIN_SALT_SIZE, MAX_SALT_SIZE)
}

fn check_hash(length: usize) -> Result<usize, validate::Error> {
    validate::range("hashLength", length, MIN_HASH_LENGTH, MAX_HASH_LENGTH)
}

impl TryFrom<ArgonOptions> for ArgonConfig {
    type Error = validate::Error;

    fn try_from(options: ArgonOptions) -> Result<Self, Self::Error> {
        let limits = Limits {
            max_memory: validate::range(
                "maxMemory",
                options.max_memory.unwrap_or(DEFAULT_MAX_MEMORY),
                MIN_MEMORY,
                u32::MAX,
            )?,
            max_iterations: validate::range(
                "maxIterations",
                options.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
                MIN_ITERATIONS,
                u32::MAX,
            )?,
        };

        let cost = [
            options.memory.unwrap_or(DEFAULT_MEMORY),
            options.iterations.unwrap_or(DEFAULT_ITERATIONS),
            options.parallelism.unwrap_or(DEFAULT_PARALLELISM),
        ];

        Ok(Self {
            cost: check_cost(
                options.variant.unwrap_or_default(),
                options.version.unwrap_or(DEFAULT_VERSION),
                cost,
                limits,
            )?,
            salt_size: check_salt(options.salt_size.unwrap_or(DEFAULT_SALT_SIZE))?,
            hash_length: check_hash(options.hash_length.unwrap_or(DEFAULT_HASH_LENGTH))?,
            limits,
        })
    }
}

impl ArgonConfig {
    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.cost.variant
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.cost.version
    }

    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.cost.iterations
    }

    #[must_use]
    pub const fn memory(&self) -> u32 {
        self.cost.memory
    }

    #[must_use]
    pub const fn parallelism(&self) -> u32 {
        self.cost.parallelism
    }

    #[must_use]
    pub const fn salt_size(&self) -> usize {
        self.salt_size
    }

    #[must_use]
    pub const fn hash_length(&self) -> usize {
        self.hash_length
    }

    #[must_use]
    pub const fn max_memory(&self) -> u32 {
        self.limits.max_memory
    }

    #[must_use]
    pub const fn max_iterations(&self) -> u32 {
        self.limits.max_iterations
    }
}

#[derive(Debug)]
struct Stored {
    cost: ArgonCost,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

pub struct ArgonDriver<K = Backend, R = OsRandom> {
    config: ArgonConfig,
    kdf: K,
    random: R,
}

impl ArgonDriver {
    pub fn new(options: ArgonOptions) -> Result<Self, Error> {
        Self::with_primitives(options, Backend, OsRandom)
    }
}

impl<K: ArgonKdf, R: RandomSource> ArgonDriver<K, R> {
    pub fn with_primitives(options: ArgonOptions, kdf: K, random: R) -> Result<Self, Error> {
        let config = ArgonConfig::try_from(options)?;

        Ok(Self {
            config,
            kdf,
            random,
        })
    }

    #[must_use]
    pub fn with_random<S: RandomSource>(self, random: S) -> ArgonDriver<K, S> {
        ArgonDriver {
            config: self.config,
            kdf: self.kdf,
            random,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ArgonConfig {
        &self.config
    }

    fn decode(&self, value: &str) -> Result<Stored, Error> {
        let record = phc::deserialize(value)?;

        let variant =
            Variant::from_id(&record.id).ok_or(Error::Decoding("hash was not produced by argon2"))?;

        let [m, t, p] = super::params(&record, ["m", "t", "p"])?;

        let cost = validate::narrow("memory", m)
            .and_then(|m| {
                let t = validate::narrow("iterations", t)?;
                let p = validate::narrow("parallelism", p)?;
                let version = record.version.unwrap_or(LEGACY_VERSION);

                check_cost(variant, version, [m, t, p], self.config.limits)
            })
            .map_err(Error::Parameter)?;

        check_salt(record.salt.len()).map_err(Error::Parameter)?;
        check_hash(record.hash.len()).map_err(Error::Parameter)?;

        Ok(Stored {
            cost,
            salt: record.salt,
            hash: record.hash,
        })
    }
}

impl<K: ArgonKdf, R: RandomSource> HashDriver for ArgonDriver<K, R> {
    fn is_valid_hash(&self, value: &str) -> bool {
        super::is_valid(self.decode(value))
    }

    fn make(&self, plaintext: &[u8]) -> Result<String, Error> {
        let cost = self.config.cost;
        let salt = self.random.bytes(self.config.salt_size)?;

        let mut hash = vec![0; self.config.hash_length];
        self.kdf.derive(plaintext, &salt, cost, &mut hash)?;

        let params = Params::new()
            .with("m", u64::from(cost.memory))
            .with("t", u64::from(cost.iterations))
            .with("p", u64::from(cost.parallelism));

        let record = Record::new(cost.variant.id(), salt, hash)
            .version(cost.version)
            .params(params);

        phc::serialize(&record)
    }

    fn verify(&self, hashed: &str, plaintext: &[u8]) -> Result<bool, Error> {
        super::fail_closed(self.decode(hashed).and_then(|stored| {
            let mut derived = vec![0; stored.hash.len()];
            self.kdf
                .derive(plaintext, &stored.salt, stored.cost, &mut derived)?;

            Ok(compare::compare_bytes(&stored.hash, &derived))
        }))
    }

    fn needs_rehash(&self, hashed: &str) -> bool {
        let Ok(stored) = self.decode(hashed) else {
            return true;
        };

        stored.cost != self.config.cost
            || stored.salt.len() != self.config.salt_size
            || stored.hash.len() != self.config.hash_length
    }
}
