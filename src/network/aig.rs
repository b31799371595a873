use core::fmt;

use fxhash::FxHashMap;

use crate::network::node::AigNode;
use crate::network::signal::Signal;

/// Representation of an And-Inverter-Graph, used as the representation for all depth optimizations
///
/// Nodes are referenced by stable indices: the constant node sits at index 0,
/// inputs and And gates fill the remaining indices in topological order, so
/// that the fanins of a gate always have smaller indices than the gate itself.
/// Indices are never reused; a substituted node keeps its index but is dead
/// and skipped by gate iteration.
///
/// And gates are kept canonical at creation: trivial gates are simplified
/// away and structural hashing guarantees that no two live gates share the
/// same fanin pair.
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: Vec<AigNode>,
    live: Vec<bool>,
    inputs: Vec<u32>,
    outputs: Vec<Signal>,
    strash: FxHashMap<[Signal; 2], u32>,
}

impl Aig {
    /// Create a new Aig, holding only the constant node
    pub fn new() -> Self {
        Aig {
            nodes: vec![AigNode::Const],
            live: vec![true],
            inputs: Vec::new(),
            outputs: Vec::new(),
            strash: FxHashMap::default(),
        }
    }

    /// Return the number of nodes, dead ones included
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of live And gates
    pub fn nb_ands(&self) -> usize {
        self.gates().count()
    }

    /// Get the input at index i
    pub fn input(&self, i: usize) -> Signal {
        Signal::from_node(self.inputs[i])
    }

    /// Get the output at index i
    pub fn output(&self, i: usize) -> Signal {
        self.outputs[i]
    }

    /// Get the node at index n
    pub fn node(&self, n: u32) -> &AigNode {
        &self.nodes[n as usize]
    }

    /// Returns true if the node has not been substituted away
    pub fn is_live(&self, n: u32) -> bool {
        self.live[n as usize]
    }

    /// Returns true for the constant node
    pub fn is_constant(&self, n: u32) -> bool {
        self.node(n).is_const()
    }

    /// Returns true for a primary input
    pub fn is_input(&self, n: u32) -> bool {
        self.node(n).is_input()
    }

    /// Returns true for an And gate
    pub fn is_and(&self, n: u32) -> bool {
        self.node(n).is_and()
    }

    /// Return the number of fanins of a node: 0 for constants and inputs, 2 for gates
    pub fn fanin_size(&self, n: u32) -> usize {
        self.node(n).fanins().len()
    }

    /// Add a new primary input
    pub fn add_input(&mut self) -> Signal {
        let n = self.nodes.len() as u32;
        self.nodes.push(AigNode::Input(self.inputs.len() as u32));
        self.live.push(true);
        self.inputs.push(n);
        Signal::from_node(n)
    }

    /// Add a new primary output based on an existing signal
    pub fn add_output(&mut self, s: Signal) {
        assert!(self.is_valid(s), "Invalid output {s}");
        self.outputs.push(s);
    }

    /// Create an And2 gate
    ///
    /// Trivial gates are simplified away, so the result may be one of the
    /// fanins or a constant, with arbitrary polarity. Structural hashing
    /// returns the existing gate when the same fanin pair is already live.
    pub fn and(&mut self, f0: Signal, f1: Signal) -> Signal {
        assert!(self.is_valid(f0), "Invalid fanin {f0}");
        assert!(self.is_valid(f1), "Invalid fanin {f1}");
        if f0 == f1 {
            return f0;
        }
        if f0 == !f1 {
            return Signal::zero();
        }
        if f0.is_constant() {
            return if f0 == Signal::zero() { f0 } else { f1 };
        }
        if f1.is_constant() {
            return if f1 == Signal::zero() { f1 } else { f0 };
        }
        // Canonical fanin order; the nodes are distinct at this point
        let pair = if f0.node() < f1.node() {
            [f0, f1]
        } else {
            [f1, f0]
        };
        if let Some(&n) = self.strash.get(&pair) {
            return Signal::from_node(n);
        }
        let n = self.nodes.len() as u32;
        self.nodes.push(AigNode::And(pair));
        self.live.push(true);
        self.strash.insert(pair, n);
        Signal::from_node(n)
    }

    /// Create an Or2 gate
    pub fn or(&mut self, f0: Signal, f1: Signal) -> Signal {
        !self.and(!f0, !f1)
    }

    /// Iterate over the live And gates, in topological order
    pub fn gates(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.nodes.len() as u32).filter(|n| self.live[*n as usize] && self.is_and(*n))
    }

    /// Replace every use of a node by another signal
    ///
    /// Uses with a complement bit get the complement of the replacement.
    /// The node becomes dead, and the replacement ripples through its fanout:
    /// every user is re-created through [`Aig::and`], so gates that become
    /// trivial or duplicate are substituted away in turn. Indices of live
    /// nodes keep increasing along fanin edges throughout.
    pub fn substitute(&mut self, n: u32, s: Signal) {
        assert!(
            self.is_live(n) && self.is_and(n),
            "Only live And gates can be substituted"
        );
        assert!(self.is_valid(s), "Invalid replacement {s}");
        assert!(s.node() != n, "Cannot substitute a node with itself");
        debug_assert!(
            !self.depends_on(s.node(), n),
            "Replacement {s} depends on the substituted node x{n}"
        );
        let end = self.nodes.len() as u32;
        let mut repl = FxHashMap::default();
        repl.insert(n, s);
        self.kill(n);
        for i in n + 1..end {
            if !self.live[i as usize] {
                continue;
            }
            let AigNode::And([f0, f1]) = self.nodes[i as usize] else {
                continue;
            };
            let r0 = repl.get(&f0.node()).map(|t| t ^ f0.is_inverted());
            let r1 = repl.get(&f1.node()).map(|t| t ^ f1.is_inverted());
            if r0.is_none() && r1.is_none() {
                continue;
            }
            self.kill(i);
            let si = self.and(r0.unwrap_or(f0), r1.unwrap_or(f1));
            repl.insert(i, si);
        }
        for o in self.outputs.iter_mut() {
            if let Some(t) = repl.get(&o.node()) {
                *o = t ^ o.is_inverted();
            }
        }
    }

    /// Mark a gate dead and drop it from the structural hash
    fn kill(&mut self, n: u32) {
        if let AigNode::And(pair) = self.nodes[n as usize] {
            self.strash.remove(&pair);
        }
        self.live[n as usize] = false;
    }

    /// Returns whether a node is in the transitive fanin of another
    fn depends_on(&self, n: u32, dep: u32) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut to_visit = vec![n];
        while let Some(v) = to_visit.pop() {
            if v == dep {
                return true;
            }
            if visited[v as usize] {
                continue;
            }
            visited[v as usize] = true;
            to_visit.extend(self.nodes[v as usize].fanins().iter().map(|f| f.node()));
        }
        false
    }

    /// Returns whether a signal refers to a live node of the network
    pub(crate) fn is_valid(&self, s: Signal) -> bool {
        (s.node() as usize) < self.nodes.len() && self.live[s.node() as usize]
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        assert_eq!(self.nodes[0], AigNode::Const);
        for (i, inp) in self.inputs.iter().enumerate() {
            assert_eq!(
                self.nodes[*inp as usize],
                AigNode::Input(i as u32),
                "Input list out of sync at x{inp}"
            );
        }
        for n in 0..self.nodes.len() as u32 {
            if !self.live[n as usize] {
                continue;
            }
            if let AigNode::And(pair) = self.nodes[n as usize] {
                for f in pair {
                    assert!(f.node() < n, "Fanin {f} of x{n} breaks topological order");
                    assert!(self.is_valid(f), "Dead fanin {f} of x{n}");
                    assert!(!f.is_constant(), "Unsimplified constant fanin of x{n}");
                }
                assert!(pair[0].node() < pair[1].node(), "Non-canonical pair on x{n}");
                assert_eq!(
                    self.strash.get(&pair),
                    Some(&n),
                    "Gate x{n} missing from the structural hash"
                );
            }
        }
        for (pair, n) in self.strash.iter() {
            assert!(
                self.live[*n as usize] && self.nodes[*n as usize] == AigNode::And(*pair),
                "Stale structural hash entry for x{n}"
            );
        }
        for o in self.outputs.iter() {
            assert!(self.is_valid(*o), "Invalid output {o}");
        }
    }
}

impl Default for Aig {
    fn default() -> Self {
        Aig::new()
    }
}

impl fmt::Display for Aig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Aig with {} inputs, {} outputs:",
            self.nb_inputs(),
            self.nb_outputs()
        )?;
        for n in 0..self.nb_nodes() as u32 {
            if self.is_live(n) && !self.is_constant(n) {
                writeln!(f, "\tx{} = {}", n, self.node(n))?;
            }
        }
        for i in 0..self.nb_outputs() {
            writeln!(f, "\to{} = {}", i, self.output(i))?;
        }
        Ok(())
    }
}
