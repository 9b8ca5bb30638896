use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::HashDriver;
use crate::Error;
use crate::kdf::random::{OsRandom, RandomSource};
use crate::kdf::{BCRYPT_SALT_LENGTH, Backend, BcryptKdf};
use crate::phc::{self, Params, Record};
use crate::{bcrypt64, compare, validate};

pub const ID: &str = "bcrypt";

/// Prefixes of hashes written by the primitive itself, before PHC wrapping.
const NATIVE_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

/// Bytes of the bcrypt output kept in a hash, and their length in bcrypt base64.
const HASH_LENGTH: usize = 23;
const ENCODED_HASH_LENGTH: usize = 31;

const DEFAULT_ROUNDS: u32 = 10;
const DEFAULT_SALT_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Version {
    /// `2a`, tagged 97
    A,
    /// `2b`, tagged 98
    #[default]
    B,
}

impl Version {
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Self::A => 97,
            Self::B => 98,
        }
    }
}

impl TryFrom<u32> for Version {
    type Error = validate::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match validate::one_of("version", value, &[97, 98])? {
            97 => Ok(Self::A),
            _ => Ok(Self::B),
        }
    }
}

impl From<Version> for u32 {
    fn from(value: Version) -> Self {
        value.tag()
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BcryptOptions {
    pub rounds: Option<u32>,
    pub salt_size: Option<usize>,
    pub version: Option<Version>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcryptConfig {
    rounds: u32,
    salt_size: usize,
    version: Version,
}

fn check_rounds(rounds: u32) -> Result<u32, validate::Error> {
    validate::range("rounds", rounds, 4, 31)
}

impl TryFrom<BcryptOptions> for BcryptConfig {
    type Error = validate::Error;

    fn try_from(options: BcryptOptions) -> Result<Self, Self::Error> {
        Ok(Self {
            rounds: check_rounds(options.rounds.unwrap_or(DEFAULT_ROUNDS))?,
            salt_size: validate::range(
                "saltSize",
                options.salt_size.unwrap_or(DEFAULT_SALT_SIZE),
                8,
                1024,
            )?,
            version: options.version.unwrap_or_default(),
        })
    }
}

impl BcryptConfig {
    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.rounds
    }

    #[must_use]
    pub const fn salt_size(&self) -> usize {
        self.salt_size
    }

    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }
}

#[derive(Debug)]
struct Stored {
    version: Version,
    rounds: u32,
    salt: [u8; BCRYPT_SALT_LENGTH],
    hash: Vec<u8>,
}

/// Whether `value` is a hash in the primitive's own format.
#[must_use]
pub fn is_native(value: &str) -> bool {
    NATIVE_PREFIXES.iter().any(|prefix| value.starts_with(prefix))
}

pub struct BcryptDriver<K = Backend, R = OsRandom> {
    config: BcryptConfig,
    kdf: K,
    random: R,
}

impl BcryptDriver {
    pub fn new(options: BcryptOptions) -> Result<Self, Error> {
        Self::with_primitives(options, Backend, OsRandom)
    }
}

impl<K: BcryptKdf, R: RandomSource> BcryptDriver<K, R> {
    pub fn with_primitives(options: BcryptOptions, kdf: K, random: R) -> Result<Self, Error> {
        let config = BcryptConfig::try_from(options)?;

        Ok(Self {
            config,
            kdf,
            random,
        })
    }

    #[must_use]
    pub fn with_random<S: RandomSource>(self, random: S) -> BcryptDriver<K, S> {
        BcryptDriver {
            config: self.config,
            kdf: self.kdf,
            random,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BcryptConfig {
        &self.config
    }

    /// Runs the primitive and extracts the hash bytes from its native output.
    fn derive(
        &self,
        plaintext: &[u8],
        rounds: u32,
        salt: [u8; BCRYPT_SALT_LENGTH],
        version: Version,
    ) -> Result<Vec<u8>, Error> {
        let native = self.kdf.hash(plaintext, rounds, salt, version)?;

        let encoded = native
            .len()
            .checked_sub(ENCODED_HASH_LENGTH)
            .and_then(|start| native.get(start..))
            .ok_or_else(|| Error::Primitive("bcrypt output is too short".to_owned()))?;

        let hash = bcrypt64::decode(encoded, HASH_LENGTH);

        if hash.len() != HASH_LENGTH {
            return Err(Error::Primitive("bcrypt output is malformed".to_owned()));
        }

        Ok(hash)
    }

    fn decode(value: &str) -> Result<Stored, Error> {
        let record = phc::deserialize(value)?;

        if record.id != ID {
            return Err(Error::Decoding("hash was not produced by bcrypt"));
        }

        let version = record
            .version
            .ok_or(Error::Decoding("bcrypt hashes carry a version"))
            .and_then(|v| Version::try_from(v).map_err(Error::Parameter))?;

        let [rounds] = super::params(&record, ["r"])?;
        let rounds = validate::narrow("rounds", rounds)
            .and_then(check_rounds)
            .map_err(Error::Parameter)?;

        let salt = <[u8; BCRYPT_SALT_LENGTH]>::try_from(record.salt.as_slice()).map_err(|_| {
            Error::Parameter(validate::Error::new(
                "salt",
                format!("must be {BCRYPT_SALT_LENGTH} bytes"),
            ))
        })?;

        if record.hash.len() != HASH_LENGTH {
            return Err(Error::Parameter(validate::Error::new(
                "hash",
                format!("must be {HASH_LENGTH} bytes"),
            )));
        }

        Ok(Stored {
            version,
            rounds,
            salt,
            hash: record.hash,
        })
    }
}

impl<K: BcryptKdf, R: RandomSource> HashDriver for BcryptDriver<K, R> {
    fn is_valid_hash(&self, value: &str) -> bool {
        super::is_valid(Self::decode(value))
    }

    fn make(&self, plaintext: &[u8]) -> Result<String, Error> {
        let drawn = self
            .random
            .bytes(self.config.salt_size.max(BCRYPT_SALT_LENGTH))?;

        let salt = drawn
            .get(..BCRYPT_SALT_LENGTH)
            .and_then(|s| <[u8; BCRYPT_SALT_LENGTH]>::try_from(s).ok())
            .ok_or_else(|| Error::Primitive("random source returned too few bytes".to_owned()))?;

        let hash = self.derive(plaintext, self.config.rounds, salt, self.config.version)?;

        let record = Record::new(ID, salt.to_vec(), hash)
            .version(self.config.version.tag())
            .params(Params::new().with("r", u64::from(self.config.rounds)));

        phc::serialize(&record)
    }

    fn verify(&self, hashed: &str, plaintext: &[u8]) -> Result<bool, Error> {
        if is_native(hashed) {
            log::debug!("Verifying native bcrypt hash");
            return super::fail_closed(self.kdf.verify_native(plaintext, hashed));
        }

        super::fail_closed(Self::decode(hashed).and_then(|stored| {
            let derived = self.derive(plaintext, stored.rounds, stored.salt, stored.version)?;

            Ok(compare::compare_bytes(&stored.hash, &derived))
        }))
    }

    fn needs_rehash(&self, hashed: &str) -> bool {
        if is_native(hashed) {
            return true;
        }

        let Ok(stored) = Self::decode(hashed) else {
            return true;
        };

        stored.version != self.config.version || stored.rounds != self.config.rounds
    }

    fn can_verify(&self, value: &str) -> bool {
        is_native(value) || self.is_valid_hash(value)
    }
}
