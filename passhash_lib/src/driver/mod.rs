use crate::Error;
use crate::phc::Record;

pub mod argon;
pub mod bcrypt;
pub mod scrypt;

pub use argon::{ArgonConfig, ArgonDriver, ArgonOptions};
pub use bcrypt::{BcryptConfig, BcryptDriver, BcryptOptions};
pub use scrypt::{ScryptConfig, ScryptDriver, ScryptOptions};

/// Operations every hashing algorithm provides.
///
/// `is_valid_hash`, `verify` and `needs_rehash` never fail because of what is stored: a
/// value that cannot be decoded is invalid, does not verify and needs a rehash. Only
/// failures of the underlying primitive are returned as errors.
pub trait HashDriver: Send + Sync {
    fn is_valid_hash(&self, value: &str) -> bool;

    fn make(&self, plaintext: &[u8]) -> Result<String, Error>;

    fn verify(&self, hashed: &str, plaintext: &[u8]) -> Result<bool, Error>;

    fn needs_rehash(&self, hashed: &str) -> bool;

    /// Whether `verify` understands `value`, including formats `make` never writes.
    fn can_verify(&self, value: &str) -> bool {
        self.is_valid_hash(value)
    }
}

impl<D: HashDriver + ?Sized> HashDriver for Box<D> {
    fn is_valid_hash(&self, value: &str) -> bool {
        (**self).is_valid_hash(value)
    }

    fn make(&self, plaintext: &[u8]) -> Result<String, Error> {
        (**self).make(plaintext)
    }

    fn verify(&self, hashed: &str, plaintext: &[u8]) -> Result<bool, Error> {
        (**self).verify(hashed, plaintext)
    }

    fn needs_rehash(&self, hashed: &str) -> bool {
        (**self).needs_rehash(hashed)
    }

    fn can_verify(&self, value: &str) -> bool {
        (**self).can_verify(value)
    }
}

/// Reads exactly the parameters in `names`, in any order.
pub(crate) fn params<const N: usize>(
    record: &Record,
    names: [&'static str; N],
) -> Result<[u64; N], Error> {
    if record.params.len() != N {
        return Err(Error::Decoding("unexpected parameters"));
    }

    let mut values = [0; N];

    for (value, name) in values.iter_mut().zip(names) {
        *value = record
            .params
            .get(name)
            .ok_or(Error::Decoding("missing parameter"))?;
    }

    Ok(values)
}

/// Turns problems with the stored value into a failed verification.
pub(crate) fn fail_closed(result: Result<bool, Error>) -> Result<bool, Error> {
    match result {
        Err(e) if e.is_input() => {
            log::debug!("Stored hash rejected: {e}");
            Ok(false)
        }
        other => other,
    }
}

pub(crate) fn is_valid<T>(decoded: Result<T, Error>) -> bool {
    decoded
        .inspect_err(|e| log::debug!("Invalid hash: {e}"))
        .is_ok()
}

#[cfg(test)]
pub(crate) mod test {
    use crate::Error;
    use crate::kdf::random::RandomSource;

    /// Random source that always fails.
    pub struct Exhausted;

    impl RandomSource for Exhausted {
        fn fill(&self, _buffer: &mut [u8]) -> Result<(), Error> {
            Err(Error::Primitive("entropy exhausted".to_owned()))
        }
    }

    /// Generates the shared behaviour tests for a driver built by `$driver`.
    macro_rules! driver_contract {
        ($name:ident, $driver:expr) => {
            paste::paste! {
                #[test]
                fn [<$name _verifies_own_hash>]() -> Result<(), Box<dyn std::error::Error>> {
                    let driver = $driver;

                    let hashed = driver.make(b"secret")?;

                    assert!(driver.verify(&hashed, b"secret")?);
                    assert!(!driver.verify(&hashed, b"wrong")?);
                    assert!(!driver.verify(&hashed, b"")?);

                    Ok(())
                }

                #[test]
                fn [<$name _own_hash_is_valid_and_current>]() -> Result<(), Box<dyn std::error::Error>> {
                    let driver = $driver;

                    let hashed = driver.make(b"secret")?;

                    assert!(driver.is_valid_hash(&hashed));
                    assert!(driver.can_verify(&hashed));
                    assert!(!driver.needs_rehash(&hashed));

                    Ok(())
                }

                #[test]
                fn [<$name _salts_are_fresh>]() -> Result<(), Box<dyn std::error::Error>> {
                    let driver = $driver;

                    let first = driver.make(b"secret")?;
                    let second = driver.make(b"secret")?;

                    assert_ne!(first, second);

                    Ok(())
                }

                #[test]
                fn [<$name _rejects_garbage>]() -> Result<(), Box<dyn std::error::Error>> {
                    let driver = $driver;

                    for value in ["", "not a phc string", "$", "$$$$", "$argon2id$v=19$m=abc$salt$hash"] {
                        assert!(!driver.is_valid_hash(value), "{value}");
                        assert!(!driver.can_verify(value), "{value}");
                        assert!(!driver.verify(value, b"secret")?, "{value}");
                        assert!(driver.needs_rehash(value), "{value}");
                    }

                    Ok(())
                }

                #[test]
                fn [<$name _rejects_tampered_hash>]() -> Result<(), Box<dyn std::error::Error>> {
                    let driver = $driver;

                    let hashed = driver.make(b"secret")?;
                    let mut record = crate::phc::deserialize(&hashed)?;
                    record.hash[0] ^= 0x01;
                    let tampered = crate::phc::serialize(&record)?;

                    assert!(driver.is_valid_hash(&tampered));
                    assert!(!driver.verify(&tampered, b"secret")?);

                    Ok(())
                }

                #[test]
                fn [<$name _rejects_truncated_hash>]() -> Result<(), Box<dyn std::error::Error>> {
                    let driver = $driver;

                    let hashed = driver.make(b"secret")?;
                    let truncated = &hashed[..hashed.len() - 4];

                    assert!(!driver.verify(truncated, b"secret")?);

                    Ok(())
                }

                #[test]
                fn [<$name _random_failure_is_fatal>]() {
                    let driver = $driver.with_random(crate::driver::test::Exhausted);

                    assert!(matches!(driver.make(b"secret"), Err(crate::Error::Primitive(_))));
                }
            }
        };
    }

    pub(crate) use driver_contract;
}
