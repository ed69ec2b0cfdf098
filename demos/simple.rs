//! basic example to showcase the main functions of ConsistentHash

use consistent_hashring::{ConsistentHash, Options};
use std::borrow::Cow;
use std::collections::HashMap;
use std::net::IpAddr;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
struct Backend {
    ip: IpAddr,
    port: u16,
}

impl Backend {
    fn new(ip: &str, port: u16) -> Self {
        Backend {
            ip: IpAddr::from_str(ip).unwrap(),
            port,
        }
    }
}

impl consistent_hashring::Node for Backend {
    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{}:{}", self.ip, self.port))
    }
}

fn distribution(ring: &ConsistentHash<Backend>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for i in 0..10_000 {
        if let Some(label) = ring.get_label(format!("user:{i}")) {
            *counts.entry(label).or_insert(0) += 1;
        }
    }
    counts
}

fn main() {
    let ring = ConsistentHash::with_nodes(
        vec![
            Backend::new("127.0.0.1", 6379),
            Backend::new("127.0.0.2", 6379),
            Backend::new("127.0.0.3", 6379),
        ],
        Options::new().replicas(160),
    );

    // return the backend that stores the key 'foo'
    println!("backend for key foo: {:?}", ring.get("foo"));

    println!("distribution of 10000 keys: {:?}", distribution(&ring));

    // a new backend takes over roughly a quarter of all keys
    ring.add([Backend::new("127.0.0.4", 6379)]);
    println!("after 127.0.0.4 joined: {:?}", distribution(&ring));

    ring.remove_labels(["127.0.0.2:6379"]);
    println!("after 127.0.0.2 left: {:?}", distribution(&ring));
}
