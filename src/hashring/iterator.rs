use std::collections::hash_map::IntoValues;

use super::{ConsistentHash, Member};

/// Consumes a ring and yields its real nodes, in no particular order
pub struct ConsistentHashIterator<T> {
    nodes: IntoValues<String, Member<T>>,
}

impl<T> Iterator for ConsistentHashIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(|member| member.node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<T> ExactSizeIterator for ConsistentHashIterator<T> {}

impl<T, H> IntoIterator for ConsistentHash<T, H> {
    type Item = T;

    type IntoIter = ConsistentHashIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        ConsistentHashIterator {
            nodes: self.state.into_inner().nodes.into_values(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    use crate::{ConsistentHash, Options};

    fn addr(ip: [u8; 4], port: u16) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::from(ip), port))
    }

    #[test]
    fn into_iter() {
        let ring: ConsistentHash<SocketAddr> = ConsistentHash::new();

        let node1 = addr([127, 0, 0, 1], 1024);
        let node2 = addr([127, 0, 0, 1], 1025);
        let node3 = addr([127, 0, 0, 2], 1024);

        ring.add([node1, node2, node3]);
        ring.remove([node2]);

        let iter = ring.into_iter();
        assert_eq!(2, iter.len());

        let mut nodes: Vec<SocketAddr> = iter.collect();
        nodes.sort();
        assert_eq!(vec![node1, node3], nodes);
    }

    #[test]
    fn into_iter_of_empty_ring() {
        let ring: ConsistentHash<&str, _> = ConsistentHash::with_options(Options::new());

        assert_eq!(None, ring.into_iter().next());
    }
}
