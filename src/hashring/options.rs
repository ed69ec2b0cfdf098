use std::hash::Hasher;
use std::str::FromStr;

#[cfg(feature = "derive")]
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher;

use super::MIN_REPLICAS;
use crate::Error;

/// Hash function used to place virtual nodes and keys on the ring.
///
/// Implementations must be deterministic and safe to call from several threads at once.
/// Any `Fn(&[u8]) -> u64 + Send + Sync` closure is a `HashFunc`.
pub trait HashFunc: Send + Sync {
    fn hash(&self, data: &[u8]) -> u64;
}

impl<F> HashFunc for F
where
    F: Fn(&[u8]) -> u64 + Send + Sync,
{
    fn hash(&self, data: &[u8]) -> u64 {
        self(data)
    }
}

/// Built-in hash functions
///
/// * `Crc32` - IEEE CRC32 checksum widened to 64 bits (default)
/// * `SipHash` - SipHash 2-4 with zero keys
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "derive", serde(rename_all = "lowercase"))]
pub enum HashAlgorithm {
    #[default]
    Crc32,
    SipHash,
}

impl HashFunc for HashAlgorithm {
    fn hash(&self, data: &[u8]) -> u64 {
        match self {
            HashAlgorithm::Crc32 => u64::from(crc32fast::hash(data)),
            HashAlgorithm::SipHash => {
                let mut hasher = SipHasher::new();
                hasher.write(data);
                hasher.finish()
            }
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crc32" => Ok(HashAlgorithm::Crc32),
            "siphash" | "sip" => Ok(HashAlgorithm::SipHash),
            _ => Err(Error::UnknownHashAlgorithm(s.to_string())),
        }
    }
}

/// Construction options for a [`ConsistentHash`](crate::ConsistentHash)
///
/// * `replicas` - number of virtual nodes per real node, values below [`MIN_REPLICAS`] are raised to it
/// * `hash_func` - hash function placing virtual nodes and keys on the ring
///
/// # Examples
///
/// ```
/// use consistent_hashring::{ConsistentHash, Options};
///
/// let options = Options::new()
///     .replicas(200)
///     .hash_func(|data: &[u8]| data.iter().fold(0xcbf29ce484222325_u64, |h, b| {
///         (h ^ u64::from(*b)).wrapping_mul(0x100000001b3)
///     }));
///
/// let ring: ConsistentHash<&str, _> = ConsistentHash::with_options(options);
/// assert_eq!(200, ring.replicas());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
pub struct Options<H = HashAlgorithm> {
    #[cfg_attr(feature = "derive", serde(default))]
    replicas: usize,
    #[cfg_attr(feature = "derive", serde(default))]
    hash_func: H,
}

impl<H: Default> Default for Options<H> {
    fn default() -> Self {
        Options {
            replicas: MIN_REPLICAS,
            hash_func: H::default(),
        }
    }
}

impl Options {
    pub fn new() -> Options {
        Options::default()
    }
}

impl<H> Options<H> {
    /// Set the number of virtual nodes per real node.
    pub fn replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    /// Replace the hash function.
    pub fn hash_func<G: HashFunc>(self, hash_func: G) -> Options<G> {
        Options {
            replicas: self.replicas,
            hash_func,
        }
    }

    pub(crate) fn into_parts(self) -> (usize, H) {
        (self.replicas.max(MIN_REPLICAS), self.hash_func)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{HashAlgorithm, HashFunc, Options};
    use crate::{Error, MIN_REPLICAS};

    #[test]
    fn replicas_are_raised_to_the_floor() {
        let (replicas, _) = Options::new().replicas(3).into_parts();
        assert_eq!(MIN_REPLICAS, replicas);

        let (replicas, _) = Options::new().replicas(0).into_parts();
        assert_eq!(MIN_REPLICAS, replicas);

        let (replicas, _) = Options::new().replicas(500).into_parts();
        assert_eq!(500, replicas);
    }

    #[test]
    fn default_uses_crc32() {
        let (replicas, hash_func) = Options::new().into_parts();
        assert_eq!(MIN_REPLICAS, replicas);
        assert_eq!(HashAlgorithm::Crc32, hash_func);
    }

    #[test]
    fn crc32_is_widened_to_64_bits() {
        // IEEE CRC32 check value
        assert_eq!(0xCBF43926, HashAlgorithm::Crc32.hash(b"123456789"));
        assert!(HashAlgorithm::Crc32.hash(b"any key") <= u64::from(u32::MAX));
    }

    #[test]
    fn siphash_is_deterministic() {
        let first = HashAlgorithm::SipHash.hash(b"node1");
        assert_eq!(first, HashAlgorithm::SipHash.hash(b"node1"));
        assert_ne!(first, HashAlgorithm::SipHash.hash(b"node2"));
    }

    #[test]
    fn closures_are_hash_funcs() {
        let (_, hash_func) = Options::new()
            .hash_func(|data: &[u8]| data.len() as u64)
            .into_parts();
        assert_eq!(5, hash_func.hash(b"hello"));
    }

    #[test]
    fn parse_hash_algorithm() {
        assert_eq!(Ok(HashAlgorithm::Crc32), "crc32".parse());
        assert_eq!(Ok(HashAlgorithm::Crc32), "CRC32".parse());
        assert_eq!(Ok(HashAlgorithm::SipHash), "siphash".parse());
        assert_eq!(Ok(HashAlgorithm::SipHash), "sip".parse());
        assert_eq!(
            Err(Error::UnknownHashAlgorithm("md5".to_string())),
            "md5".parse::<HashAlgorithm>()
        );
    }
}
