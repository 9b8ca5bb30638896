use std::sync::Arc;

use thiserror::Error;

use crate::Error;
use crate::driver::HashDriver;

#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("Password does not match the stored hash")]
    ExpectedMatch,

    #[error("Password unexpectedly matches the stored hash")]
    ExpectedMismatch,

    #[error(transparent)]
    Hash(#[from] Error),
}

/// Shareable handle over a driver.
///
/// Cloning is cheap, every clone uses the same driver and configuration.
pub struct Hash<D: ?Sized> {
    driver: Arc<D>,
}

impl<D: ?Sized> Clone for Hash<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
        }
    }
}

impl<D: HashDriver> Hash<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver: Arc::new(driver),
        }
    }
}

impl<D: HashDriver + ?Sized> Hash<D> {
    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub fn is_valid_hash(&self, value: &str) -> bool {
        self.driver.is_valid_hash(value)
    }

    pub fn make(&self, plaintext: &[u8]) -> Result<String, Error> {
        self.driver.make(plaintext)
    }

    pub fn verify(&self, hashed: &str, plaintext: &[u8]) -> Result<bool, Error> {
        self.driver.verify(hashed, plaintext)
    }

    #[must_use]
    pub fn needs_rehash(&self, hashed: &str) -> bool {
        self.driver.needs_rehash(hashed)
    }

    #[must_use]
    pub fn can_verify(&self, value: &str) -> bool {
        self.driver.can_verify(value)
    }

    pub fn assert_equals(&self, hashed: &str, plaintext: &[u8]) -> Result<(), AssertionError> {
        if self.verify(hashed, plaintext)? {
            Ok(())
        } else {
            Err(AssertionError::ExpectedMatch)
        }
    }

    pub fn assert_not_equals(&self, hashed: &str, plaintext: &[u8]) -> Result<(), AssertionError> {
        if self.verify(hashed, plaintext)? {
            Err(AssertionError::ExpectedMismatch)
        } else {
            Ok(())
        }
    }
}

impl<D: HashDriver + ?Sized + 'static> Hash<D> {
    /// Runs [`Hash::make`] on the blocking thread pool.
    pub async fn make_async(&self, plaintext: Vec<u8>) -> Result<String, Error> {
        let driver = Arc::clone(&self.driver);

        tokio::task::spawn_blocking(move || driver.make(&plaintext)).await?
    }

    /// Runs [`Hash::verify`] on the blocking thread pool.
    pub async fn verify_async(&self, hashed: String, plaintext: Vec<u8>) -> Result<bool, Error> {
        let driver = Arc::clone(&self.driver);

        tokio::task::spawn_blocking(move || driver.verify(&hashed, &plaintext)).await?
    }
}

impl<D: HashDriver + ?Sized> From<Arc<D>> for Hash<D> {
    fn from(driver: Arc<D>) -> Self {
        Self { driver }
    }
}
