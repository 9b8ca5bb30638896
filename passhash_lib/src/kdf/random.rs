use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::Error;

/// Source of salt bytes. Implementations must be cryptographically secure and report
/// failure instead of falling back to a weaker generator.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buffer: &mut [u8]) -> Result<(), Error>;

    fn bytes(&self, size: usize) -> Result<Vec<u8>, Error> {
        let mut buffer = vec![0; size];
        self.fill(&mut buffer)?;
        Ok(buffer)
    }
}

/// Operating system randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buffer: &mut [u8]) -> Result<(), Error> {
        OsRng.try_fill_bytes(buffer).map_err(|e| {
            log::error!("Secure random source failed: {e}");
            Error::Primitive(format!("secure random source failed: {e}"))
        })
    }
}
