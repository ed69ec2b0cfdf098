//! A thread-safe consistent hash ring for sharding, request routing and cache placement
//!
//! Keys are mapped to a mutable set of member nodes such that
//!     the same key always maps to the same node while membership is unchanged
//!     adding or removing a node only remaps roughly 1/N of all keys
//!
//! Every physical node is placed on the ring as a number of virtual nodes (replicas),
//! derived from the node's label. Nodes only need to provide a stable label, see [`Node`].
//! The hash function is pluggable, see [`HashFunc`] and [`HashAlgorithm`].
//!
//! All ring state sits behind a single reader-writer lock:
//! lookups run in parallel, membership changes are serialized and never observed half applied.
//!
//! ```
//! use consistent_hashring::ConsistentHash;
//!
//! let ring: ConsistentHash<String> = ConsistentHash::new();
//! ring.add(["10.0.0.1:6379".to_string(), "10.0.0.2:6379".to_string()]);
//!
//! let owner = ring.get("user:1234").unwrap();
//! assert_eq!(Some(owner), ring.get("user:1234"));
//!
//! ring.remove_labels(["10.0.0.1:6379", "10.0.0.2:6379"]);
//! assert_eq!(None, ring.get("user:1234"));
//! ```

mod hashring;

pub use hashring::iterator::ConsistentHashIterator;
pub use hashring::options::{HashAlgorithm, HashFunc, Options};
pub use hashring::{ConsistentHash, MIN_REPLICAS, Node};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown hash algorithm `{0}`, expected one of: crc32, siphash")]
    UnknownHashAlgorithm(String),
}

pub type Result<T> = std::result::Result<T, Error>;
