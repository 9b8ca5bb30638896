//! Key derivation primitives.
//!
//! Drivers never compute a KDF themselves, they call one of the traits below. [`Backend`]
//! wires them to the RustCrypto implementations. Each algorithm sits behind the cargo
//! feature of the same name; without it the backend still builds and fails on first use.

use crate::Error;
use crate::driver::argon::Variant;
use crate::driver::bcrypt::Version;

pub mod random;

/// Number of salt bytes the bcrypt primitive consumes.
pub const BCRYPT_SALT_LENGTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptCost {
    pub log_n: u8,
    pub block_size: u32,
    pub parallelization: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgonCost {
    pub variant: Variant,
    pub version: u32,
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

pub trait ScryptKdf: Send + Sync {
    fn derive(
        &self,
        password: &[u8],
        salt: &[u8],
        cost: ScryptCost,
        output: &mut [u8],
    ) -> Result<(), Error>;
}

pub trait BcryptKdf: Send + Sync {
    /// Produces the native `$2b$<cost>$<salt><hash>` string.
    fn hash(
        &self,
        password: &[u8],
        cost: u32,
        salt: [u8; BCRYPT_SALT_LENGTH],
        version: Version,
    ) -> Result<String, Error>;

    /// Checks a password against a native bcrypt string with the primitive's own comparison.
    fn verify_native(&self, password: &[u8], native: &str) -> Result<bool, Error>;
}

pub trait ArgonKdf: Send + Sync {
    fn derive(
        &self,
        password: &[u8],
        salt: &[u8],
        cost: ArgonCost,
        output: &mut [u8],
    ) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Backend;

#[allow(dead_code)]
fn unavailable(algorithm: &str) -> Error {
    Error::Primitive(format!("{algorithm} support is not compiled in"))
}

impl ScryptKdf for Backend {
    #[cfg(feature = "scrypt")]
    fn derive(
        &self,
        password: &[u8],
        salt: &[u8],
        cost: ScryptCost,
        output: &mut [u8],
    ) -> Result<(), Error> {
        let params = ::scrypt::Params::new(
            cost.log_n,
            cost.block_size,
            cost.parallelization,
            ::scrypt::Params::RECOMMENDED_LEN,
        )
        .map_err(|e| Error::Primitive(format!("scrypt rejected parameters: {e}")))?;

        ::scrypt::scrypt(password, salt, &params, output)
            .map_err(|e| Error::Primitive(format!("scrypt failed: {e}")))
    }

    #[cfg(not(feature = "scrypt"))]
    fn derive(
        &self,
        _password: &[u8],
        _salt: &[u8],
        _cost: ScryptCost,
        _output: &mut [u8],
    ) -> Result<(), Error> {
        Err(unavailable("scrypt"))
    }
}

impl BcryptKdf for Backend {
    #[cfg(feature = "bcrypt")]
    fn hash(
        &self,
        password: &[u8],
        cost: u32,
        salt: [u8; BCRYPT_SALT_LENGTH],
        version: Version,
    ) -> Result<String, Error> {
        let version = match version {
            Version::A => ::bcrypt::Version::TwoA,
            Version::B => ::bcrypt::Version::TwoB,
        };

        ::bcrypt::hash_with_salt(password, cost, salt)
            .map(|parts| parts.format_for_version(version))
            .map_err(|e| Error::Primitive(format!("bcrypt failed: {e}")))
    }

    #[cfg(feature = "bcrypt")]
    fn verify_native(&self, password: &[u8], native: &str) -> Result<bool, Error> {
        ::bcrypt::verify(password, native).map_err(|e| {
            log::debug!("Native bcrypt hash rejected: {e}");
            Error::Decoding("invalid native bcrypt hash")
        })
    }

    #[cfg(not(feature = "bcrypt"))]
    fn hash(
        &self,
        _password: &[u8],
        _cost: u32,
        _salt: [u8; BCRYPT_SALT_LENGTH],
        _version: Version,
    ) -> Result<String, Error> {
        Err(unavailable("bcrypt"))
    }

    #[cfg(not(feature = "bcrypt"))]
    fn verify_native(&self, _password: &[u8], _native: &str) -> Result<bool, Error> {
        Err(unavailable("bcrypt"))
    }
}

impl ArgonKdf for Backend {
    #[cfg(feature = "argon2")]
    fn derive(
        &self,
        password: &[u8],
        salt: &[u8],
        cost: ArgonCost,
        output: &mut [u8],
    ) -> Result<(), Error> {
        let params = ::argon2::Params::new(
            cost.memory,
            cost.iterations,
            cost.parallelism,
            Some(output.len()),
        )
        .map_err(|e| Error::Primitive(format!("argon2 rejected parameters: {e}")))?;

        let algorithm = match cost.variant {
            Variant::D => ::argon2::Algorithm::Argon2d,
            Variant::I => ::argon2::Algorithm::Argon2i,
            Variant::Id => ::argon2::Algorithm::Argon2id,
        };

        let version = ::argon2::Version::try_from(cost.version)
            .map_err(|e| Error::Primitive(format!("argon2 rejected version: {e}")))?;

        ::argon2::Argon2::new(algorithm, version, params)
            .hash_password_into(password, salt, output)
            .map_err(|e| Error::Primitive(format!("argon2 failed: {e}")))
    }

    #[cfg(not(feature = "argon2"))]
    fn derive(
        &self,
        _password: &[u8],
        _salt: &[u8],
        _cost: ArgonCost,
        _output: &mut [u8],
    ) -> Result<(), Error> {
        Err(unavailable("argon2"))
    }
}
