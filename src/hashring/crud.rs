use tracing::{debug, trace};

use super::{ConsistentHash, Member, Node, Ring};
use crate::HashFunc;

impl<T, H> ConsistentHash<T, H>
where
    T: Node + Clone,
    H: HashFunc,
{
    /// Add `nodes` to the hash ring, each with the configured number of virtual nodes.
    ///
    /// Nodes whose label is already part of the ring are skipped.
    pub fn add<I>(&self, nodes: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.add_with_replicas(self.replicas, nodes);
    }

    /// Add `nodes` to the hash ring with `replicas` virtual nodes each.
    ///
    /// `replicas` is capped at the configured number of virtual nodes.
    /// Nodes whose label is already part of the ring are skipped, whatever their replica count.
    pub fn add_with_replicas<I>(&self, replicas: usize, nodes: I)
    where
        I: IntoIterator<Item = T>,
    {
        let replicas = replicas.min(self.replicas);

        // hash before taking the lock
        let placements: Vec<(String, T, Vec<u64>)> = nodes
            .into_iter()
            .map(|node| {
                let label = node.label().into_owned();
                let hashes = self.vnode_hashes(&label, replicas);
                (label, node, hashes)
            })
            .collect();

        let mut guard = self.state.write();
        let state = &mut *guard;
        let mut added = false;

        for (label, node, hashes) in placements {
            if state.nodes.contains_key(&label) {
                trace!(node = %label, "node is already part of the hash ring");
                continue;
            }

            for hash in hashes {
                state.circle.push(hash);
                state.ring.insert(hash, node.clone());
            }

            debug!(node = %label, vnodes = replicas, "added node to hash ring");
            state.nodes.insert(label, Member { node, replicas });
            added = true;
        }

        if added {
            state.circle.sort_unstable();
        }
    }

    /// Remove `nodes` from the hash ring.
    pub fn remove<I>(&self, nodes: I)
    where
        I: IntoIterator<Item = T>,
    {
        let labels: Vec<String> = nodes
            .into_iter()
            .map(|node| node.label().into_owned())
            .collect();

        self.remove_labels(labels);
    }

    /// Remove the nodes labeled `labels` from the hash ring. Unknown labels are ignored.
    pub fn remove_labels<I, S>(&self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // a member never has more virtual nodes than configured,
        // so these hashes cover whatever it was placed with
        let removals: Vec<(S, Vec<u64>)> = labels
            .into_iter()
            .map(|label| {
                let hashes = self.vnode_hashes(label.as_ref(), self.replicas);
                (label, hashes)
            })
            .collect();

        let mut guard = self.state.write();

        for (label, hashes) in removals {
            self.remove_node(&mut guard, label.as_ref(), &hashes);
        }
    }

    fn remove_node(&self, state: &mut Ring<T>, label: &str, hashes: &[u64]) {
        let member = match state.nodes.remove(label) {
            Some(member) => member,
            None => {
                trace!(node = label, "node is not part of the hash ring");
                return;
            }
        };

        for &hash in &hashes[..member.replicas] {
            let index = state.circle.partition_point(|&vnode| vnode < hash);
            if state.circle.get(index) == Some(&hash) {
                state.circle.remove(index);
            }

            if state.circle.get(index) != Some(&hash) {
                state.ring.remove(&hash);
            } else if state.ring.get(&hash).is_some_and(|owner| owner.label() == label) {
                // another virtual node still sits on this hash
                self.reassign(state, hash);
            }
        }

        debug!(node = label, vnodes = member.replicas, "removed node from hash ring");
    }

    // hands a collided hash over to a remaining member that placed a virtual node on it,
    // leaves it as is if the removed node itself placed it more than once
    fn reassign(&self, state: &mut Ring<T>, hash: u64) {
        let heir = state
            .nodes
            .iter()
            .filter(|(label, member)| self.vnode_hashes(label, member.replicas).contains(&hash))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, member)| member.node.clone());

        if let Some(node) = heir {
            debug!(hash, node = %node.label(), "virtual node hash collision, handing over");
            state.ring.insert(hash, node);
        }
    }

    /// returns the node responsible for `key`
    /// Returns None if the ring is empty
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<T> {
        let hash = self.hash_func.hash(key.as_ref());

        self.state.read().owner(hash).cloned()
    }

    /// returns the label of the node responsible for `key`
    /// Returns None if the ring is empty
    pub fn get_label<K: AsRef<[u8]>>(&self, key: K) -> Option<String> {
        let hash = self.hash_func.hash(key.as_ref());

        self.state
            .read()
            .owner(hash)
            .map(|node| node.label().into_owned())
    }

    /// returns a copy of all nodes of the ring, in no particular order
    pub fn nodes(&self) -> Vec<T> {
        self.state
            .read()
            .nodes
            .values()
            .map(|member| member.node.clone())
            .collect()
    }
}

impl<T, H> ConsistentHash<T, H> {
    /// returns the labels of all nodes of the ring, in no particular order
    pub fn labels(&self) -> Vec<String> {
        self.state.read().nodes.keys().cloned().collect()
    }
}
