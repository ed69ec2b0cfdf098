use parking_lot::RwLock;
use std::borrow::Cow;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

mod crud;
pub mod iterator;
pub mod options;

use options::{HashAlgorithm, HashFunc, Options};

/// Lower bound for the number of virtual nodes per real node.
/// Fewer virtual nodes spread keys too unevenly.
pub const MIN_REPLICAS: usize = 101;

// prefixed to every virtual node key, changing it moves every virtual node
const SALT: &str = "16777619";

/// A member of the hash ring.
///
/// The label is the node's identity: two values with the same label are the same member.
/// It must be stable for as long as the node is part of a ring,
/// otherwise its virtual nodes cannot be found again on removal.
pub trait Node {
    fn label(&self) -> Cow<'_, str>;
}

impl Node for str {
    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Node for String {
    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl Node for IpAddr {
    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl Node for SocketAddr {
    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl Node for u64 {
    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl<N: Node + ?Sized> Node for &N {
    fn label(&self) -> Cow<'_, str> {
        (**self).label()
    }
}

impl<N: Node + ?Sized> Node for Box<N> {
    fn label(&self) -> Cow<'_, str> {
        (**self).label()
    }
}

impl<N: Node + ?Sized> Node for Arc<N> {
    fn label(&self) -> Cow<'_, str> {
        (**self).label()
    }
}

// Member is an internal record of a real node and the number of virtual nodes
// it was placed with, so that removal regenerates exactly those
#[derive(Clone, Debug)]
struct Member<T> {
    node: T,
    replicas: usize,
}

// Ring holds everything guarded by the lock of `ConsistentHash`
#[derive(Clone, Debug)]
struct Ring<T> {
    // sorted hashes of all virtual nodes, may contain duplicates after hash collisions
    circle: Vec<u64>,
    // owner of each virtual node hash, last writer wins on collisions
    ring: HashMap<u64, T>,
    nodes: HashMap<String, Member<T>>,
}

impl<T> Default for Ring<T> {
    fn default() -> Self {
        Ring {
            circle: Vec::new(),
            ring: HashMap::new(),
            nodes: HashMap::new(),
        }
    }
}

impl<T> Ring<T> {
    /// returns the owner of the first virtual node at or after `hash`,
    /// wrapping around to the start of the circle
    fn owner(&self, hash: u64) -> Option<&T> {
        if self.circle.is_empty() {
            return None;
        }

        let index = self.circle.partition_point(|&vnode| vnode < hash) % self.circle.len();

        self.ring.get(&self.circle[index])
    }
}

/// ConsistentHash maps keys to a changing set of nodes using consistent hashing
///
/// Each real node is represented by `replicas` virtual nodes on the ring.
/// A key belongs to the node owning the first virtual node at or after the key's hash.
///
/// All methods take `&self`: the ring state is guarded by a reader-writer lock,
/// so a ring can be shared between threads (e.g. in an `Arc`) without further synchronization.
#[derive(Debug)]
pub struct ConsistentHash<T, H = HashAlgorithm> {
    hash_func: H,
    replicas: usize,
    state: RwLock<Ring<T>>,
}

impl<T> Default for ConsistentHash<T> {
    fn default() -> Self {
        ConsistentHash::with_options(Options::new())
    }
}

impl<T> ConsistentHash<T> {
    /// Create an empty `ConsistentHash` with [`MIN_REPLICAS`] virtual nodes per node and CRC32 hashing.
    pub fn new() -> ConsistentHash<T> {
        Default::default()
    }
}

impl<T, H: HashFunc> ConsistentHash<T, H> {
    /// Create an empty `ConsistentHash`.
    ///
    /// # Arguments
    ///
    /// * `options` - number of virtual nodes per node and hash function, see [`Options`]
    pub fn with_options(options: Options<H>) -> ConsistentHash<T, H> {
        let (replicas, hash_func) = options.into_parts();

        ConsistentHash {
            hash_func,
            replicas,
            state: RwLock::new(Ring::default()),
        }
    }

    /// Create a `ConsistentHash` and add `nodes` with the configured number of virtual nodes.
    pub fn with_nodes<I>(nodes: I, options: Options<H>) -> ConsistentHash<T, H>
    where
        I: IntoIterator<Item = T>,
        T: Node + Clone,
    {
        let ring = ConsistentHash::with_options(options);
        ring.add(nodes);
        ring
    }

    // hashes of the first `replicas` virtual nodes of the node labeled `label`
    fn vnode_hashes(&self, label: &str, replicas: usize) -> Vec<u64> {
        (0..replicas)
            .map(|id| self.hash_func.hash(vnode_key(label, id).as_bytes()))
            .collect()
    }
}

impl<T, H> ConsistentHash<T, H> {
    /// Get the configured number of virtual nodes per real node.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Get the number of real nodes in the ring.
    pub fn len(&self) -> usize {
        self.state.read().nodes.len()
    }

    /// Get the number of virtual nodes in the ring.
    pub fn vlen(&self) -> usize {
        self.state.read().circle.len()
    }

    /// Returns true if the ring has no nodes.
    pub fn is_empty(&self) -> bool {
        self.state.read().nodes.is_empty()
    }

    /// Returns true if a node labeled `label` is a member of the ring.
    pub fn contains(&self, label: &str) -> bool {
        self.state.read().nodes.contains_key(label)
    }
}

impl<T: Clone, H: Clone> Clone for ConsistentHash<T, H> {
    fn clone(&self) -> Self {
        ConsistentHash {
            hash_func: self.hash_func.clone(),
            replicas: self.replicas,
            state: RwLock::new(self.state.read().clone()),
        }
    }
}

fn vnode_key(label: &str, id: usize) -> String {
    format!("{SALT}{label}{id}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::sync::Arc;

    use super::{ConsistentHash, MIN_REPLICAS, Node, Options, vnode_key};

    #[test]
    fn new_ring_is_empty() {
        let ring: ConsistentHash<String> = ConsistentHash::new();

        assert_eq!(MIN_REPLICAS, ring.replicas());
        assert_eq!(0, ring.len());
        assert_eq!(0, ring.vlen());
        assert!(ring.is_empty());
        assert_eq!(None, ring.get("x"));
    }

    #[test]
    fn with_nodes_adds_all_nodes() {
        let ring = ConsistentHash::with_nodes(["a", "b", "c"], Options::new().replicas(150));

        assert_eq!(150, ring.replicas());
        assert_eq!(3, ring.len());
        assert_eq!(450, ring.vlen());
        assert!(ring.contains("b"));
        assert!(!ring.contains("d"));
    }

    #[test]
    fn vnode_key_is_salt_label_and_id() {
        assert_eq!("16777619node10", vnode_key("node1", 0));
        assert_eq!("16777619node1100", vnode_key("node1", 100));
    }

    #[test]
    fn labels_of_builtin_nodes() {
        let ip = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
        let addr = SocketAddr::new(ip, 6379);

        assert_eq!("127.0.0.1", ip.label());
        assert_eq!("127.0.0.1:6379", addr.label());
        assert_eq!("42", 42_u64.label());
        assert_eq!("node", "node".label());
        assert_eq!("node", Arc::<str>::from("node").label());
        assert_eq!("node", Box::new("node".to_string()).label());
    }

    #[test]
    fn clone_is_independent() {
        let ring = ConsistentHash::with_nodes(["a", "b"], Options::new());
        let other = ring.clone();

        other.remove_labels(["a"]);

        assert_eq!(2, ring.len());
        assert_eq!(1, other.len());
    }

    #[test]
    fn ring_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<ConsistentHash<String>>();
        assert_send_sync::<ConsistentHash<SocketAddr>>();
    }
}
