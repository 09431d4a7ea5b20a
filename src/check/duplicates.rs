use std::collections::HashMap;

use tracing::debug;

use crate::math::Point3;
use crate::model::{ModelStore, NodeId};

/// Nodes sharing a position with an earlier node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateNodes {
    /// Every node but the first at each shared position, in store order.
    pub removable: Vec<NodeId>,
    /// Removable node to the node it should be merged into.
    pub merge_map: HashMap<NodeId, NodeId>,
}

impl DuplicateNodes {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removable.is_empty()
    }
}

/// Finds nodes at exactly the same resolved position.
#[derive(Debug, Default)]
pub struct FindDuplicateNodes;

/// Bit pattern of a point, with negative zero folded onto zero.
fn key(p: &Point3) -> [u64; 3] {
    [p.x, p.y, p.z].map(|c| (c + 0.0).to_bits())
}

impl FindDuplicateNodes {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Partitions the nodes by exact position. The first node of each
    /// partition is kept. Nodes that cannot be resolved are skipped.
    #[must_use]
    pub fn execute(&self, store: &ModelStore) -> DuplicateNodes {
        let mut seen: HashMap<[u64; 3], NodeId> = HashMap::new();
        let mut out = DuplicateNodes::default();
        for (id, _) in store.nodes() {
            let Some(p) = store.node_point(id) else {
                continue;
            };
            match seen.get(&key(&p)) {
                Some(&kept) => {
                    out.removable.push(id);
                    out.merge_map.insert(id, kept);
                }
                None => {
                    seen.insert(key(&p), id);
                }
            }
        }
        debug!(count = out.removable.len(), "duplicate nodes");
        out
    }
}
