use crate::network::node::AigNode;
use crate::network::signal::Signal;
use crate::Aig;

/// Timing view of an Aig: per-node levels, required times and critical path
///
/// Constants and inputs sit at level 0, an And gate one level above its
/// deepest fanin. The depth of the network is the largest level driving an
/// output. A node is on the critical path when its level equals its required
/// time, i.e. when it lies on a longest input-to-output path.
///
/// The view is a plain snapshot: it must be refreshed with
/// [`DepthView::update_levels`] after the network is mutated, and reports
/// stale values until then.
#[derive(Debug, Clone)]
pub struct DepthView {
    level: Vec<u32>,
    required: Vec<u32>,
    depth: u32,
}

impl DepthView {
    /// Build the view from a network
    pub fn from_aig(aig: &Aig) -> DepthView {
        let mut ret = DepthView {
            level: Vec::new(),
            required: Vec::new(),
            depth: 0,
        };
        ret.update_levels(aig);
        ret
    }

    /// Get the level of a node
    pub fn level(&self, n: u32) -> u32 {
        self.level[n as usize]
    }

    /// Get the depth of the network
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns true if the node lies on a longest input-to-output path
    pub fn is_on_critical_path(&self, n: u32) -> bool {
        self.required[n as usize] != u32::MAX && self.level[n as usize] == self.required[n as usize]
    }

    /// Recompute levels, depth and critical-path membership
    pub fn update_levels(&mut self, aig: &Aig) {
        let nb = aig.nb_nodes();
        self.level = vec![0; nb];
        self.required = vec![u32::MAX; nb];

        // Forward pass: arrival levels, in topological order
        for n in 0..nb as u32 {
            if !aig.is_live(n) {
                continue;
            }
            if let AigNode::And([f0, f1]) = aig.node(n) {
                let l0 = self.level[f0.node() as usize];
                let l1 = self.level[f1.node() as usize];
                self.level[n as usize] = 1 + l0.max(l1);
            }
        }

        self.depth = (0..aig.nb_outputs())
            .map(|o| self.level[aig.output(o).node() as usize])
            .max()
            .unwrap_or(0);

        // Backward pass: required times, from the outputs
        for o in 0..aig.nb_outputs() {
            self.required[aig.output(o).node() as usize] = self.depth;
        }
        for n in (0..nb as u32).rev() {
            if !aig.is_live(n) || self.required[n as usize] == u32::MAX {
                continue;
            }
            if let AigNode::And([f0, f1]) = aig.node(n) {
                let req = self.required[n as usize] - 1;
                for f in [f0, f1] {
                    let r = &mut self.required[f.node() as usize];
                    *r = (*r).min(req);
                }
            }
        }
    }

    /// Level of the node a signal refers to
    pub(crate) fn signal_level(&self, s: Signal) -> u32 {
        self.level(s.node())
    }
}
