//! Depth optimization of Aigs through algebraic rewriting
//!
//! The pass walks the gates on the critical path and applies three algebraic
//! identities where they shorten the longest input-to-output path:
//!   * associativity, `(c d) b = (b d) c`, moving the deep operand up;
//!   * distributivity, `(p q) + (p r) = p (q + r)`, factoring the shared
//!     literal of an Or of two Ands;
//!   * three-level distributivity, `((g x2) + x3) x4 = (g (x2 x4)) + (x3 x4)`,
//!     pushing a shallow operand below a deep one.
//!
//! Ors only exist through De Morgan in an AIG, so the last two rules match on
//! complemented fanin pairs. Each successful rewrite substitutes the root of
//! the matched cone and refreshes the timing view; the pass runs to a
//! fixpoint and never increases the depth. Gate count may increase: the
//! rewrites trade duplicated logic for a shorter critical path.

use itertools::iproduct;

use crate::{Aig, AigNode, DepthView};

/// Datastructure for the rewriting pass
struct AlgebraicRewriting<'a> {
    aig: &'a mut Aig,
    view: DepthView,
}

impl<'a> AlgebraicRewriting<'a> {
    /// Build the pass and its timing view from a network
    fn from_aig(aig: &'a mut Aig) -> AlgebraicRewriting<'a> {
        let view = DepthView::from_aig(aig);
        AlgebraicRewriting { aig, view }
    }

    /// Run rewriting to fixpoint; return the number of rewrites applied
    fn run(&mut self) -> usize {
        let mut nb_rewrites = 0;
        loop {
            let mut changed = false;
            // Snapshot of the live gates: rewrites only kill gates in the
            // fanout of the substituted node, which are skipped below
            let gates: Vec<u32> = self.aig.gates().collect();
            for n in gates {
                if !self.aig.is_live(n) {
                    continue;
                }
                if self.try_rules(n) {
                    let depth = self.view.depth();
                    self.view.update_levels(self.aig);
                    debug_assert!(
                        self.view.depth() <= depth,
                        "Depth regression on x{n}: {} to {}",
                        depth,
                        self.view.depth()
                    );
                    changed = true;
                    nb_rewrites += 1;
                }
            }
            if !changed {
                break;
            }
        }
        nb_rewrites
    }

    /// Try the algebraic rules on a gate; first match wins
    fn try_rules(&mut self, n: u32) -> bool {
        if self.try_associativity(n) {
            return true;
        }
        if self.try_distributivity(n) {
            return true;
        }
        if self.try_three_level_distributivity(n) {
            return true;
        }
        false
    }

    /// Rebalance `(c d) b` as `(b d) c` when `c` is the deep critical operand
    ///
    /// Only fires when exactly one fanin is an input, and when the critical
    /// fanin is uncomplemented: a complemented fanin cannot be decomposed
    /// without De Morgan.
    fn try_associativity(&mut self, n: u32) -> bool {
        if !self.view.is_on_critical_path(n) {
            return false;
        }
        let AigNode::And([fa, fb]) = *self.aig.node(n) else {
            return false;
        };
        if self.aig.is_input(fa.node()) == self.aig.is_input(fb.node()) {
            return false;
        }
        let (fcrit, fother) = if self.view.is_on_critical_path(fa.node()) && !fa.is_inverted() {
            (fa, fb)
        } else if self.view.is_on_critical_path(fb.node()) && !fb.is_inverted() {
            (fb, fa)
        } else {
            return false;
        };
        let AigNode::And([fc, fd]) = *self.aig.node(fcrit.node()) else {
            return false;
        };
        for (fdeep, fshallow) in [(fc, fd), (fd, fc)] {
            if self.view.is_on_critical_path(fdeep.node())
                && !self.view.is_on_critical_path(fshallow.node())
                && self.view.signal_level(fdeep) >= self.view.signal_level(fother) + 1
                && !self.aig.is_input(fdeep.node())
            {
                let aig1 = self.aig.and(fother, fshallow);
                let aig2 = self.aig.and(fdeep, aig1);
                self.aig.substitute(n, aig2);
                return true;
            }
        }
        false
    }

    /// Factor the shared literal of `(p q) + (p r)` into `p (q + r)`
    ///
    /// The gate must be an Or in disguise, i.e. both fanins complemented, and
    /// the shared literal must match in node and polarity and lie on the
    /// critical path. The four fanin pairings are probed in a fixed order to
    /// keep the pass deterministic.
    fn try_distributivity(&mut self, n: u32) -> bool {
        if !self.view.is_on_critical_path(n) {
            return false;
        }
        let AigNode::And([fa, fb]) = *self.aig.node(n) else {
            return false;
        };
        if self.aig.is_input(fa.node()) || self.aig.is_input(fb.node()) {
            return false;
        }
        if !fa.is_inverted() || !fb.is_inverted() {
            return false;
        }
        let AigNode::And(af) = *self.aig.node(fa.node()) else {
            return false;
        };
        let AigNode::And(bf) = *self.aig.node(fb.node()) else {
            return false;
        };
        for (j, i) in iproduct!(0..2usize, 0..2usize) {
            let shared = af[i];
            if shared != bf[j] || !self.view.is_on_critical_path(shared.node()) {
                continue;
            }
            let aig1 = self.aig.and(!af[1 - i], !bf[1 - j]);
            let aig2 = self.aig.and(shared, !aig1);
            self.aig.substitute(n, !aig2);
            return true;
        }
        false
    }

    /// Rewrite `((g x2) + x3) x4` as `(g (x2 x4)) + (x3 x4)`
    ///
    /// `g` is the deep critical signal three levels down; pushing `x4` below
    /// it saves a level whenever `g` arrives more than two levels after `x4`
    /// (the depth-benefit guard).
    fn try_three_level_distributivity(&mut self, n: u32) -> bool {
        if !self.view.is_on_critical_path(n) {
            return false;
        }
        let AigNode::And([fa, fb]) = *self.aig.node(n) else {
            return false;
        };
        if self.aig.is_input(fa.node()) && self.aig.is_input(fb.node()) {
            return false;
        }
        let (fcrit, fx4) = if self.view.is_on_critical_path(fa.node())
            && fa.is_inverted()
            && !self.view.is_on_critical_path(fb.node())
        {
            (fa, fb)
        } else if self.view.is_on_critical_path(fb.node())
            && fb.is_inverted()
            && !self.view.is_on_critical_path(fa.node())
        {
            (fb, fa)
        } else {
            return false;
        };
        // The critical fanin must be an Or: both fanins complemented
        let AigNode::And([f0, f1]) = *self.aig.node(fcrit.node()) else {
            return false;
        };
        if !f0.is_inverted() || !f1.is_inverted() {
            return false;
        }
        let (fc, fx3) = if self.view.is_on_critical_path(f0.node())
            && !self.view.is_on_critical_path(f1.node())
        {
            (f0, f1)
        } else if self.view.is_on_critical_path(f1.node())
            && !self.view.is_on_critical_path(f0.node())
        {
            (f1, f0)
        } else {
            return false;
        };
        let AigNode::And([c0, c1]) = *self.aig.node(fc.node()) else {
            return false;
        };
        let (g, x2) = if self.view.is_on_critical_path(c0.node())
            && !self.view.is_on_critical_path(c1.node())
        {
            (c0, c1)
        } else if self.view.is_on_critical_path(c1.node())
            && !self.view.is_on_critical_path(c0.node())
        {
            (c1, c0)
        } else {
            return false;
        };
        if self.view.signal_level(g) <= self.view.signal_level(fx4) + 2 {
            // No benefit in terms of depth
            return false;
        }
        let aig1 = self.aig.and(x2, fx4);
        let aig2 = self.aig.and(g, aig1);
        let aig3 = self.aig.and(!fx3, fx4);
        let aig4 = self.aig.and(!aig2, !aig3);
        self.aig.substitute(n, !aig4);
        true
    }
}

/// Reduce the depth of an Aig by algebraic rewriting of its critical path
///
/// The network is mutated in place and keeps its function at every output;
/// the depth never increases, the gate count may. Returns the number of
/// rewrites applied, zero when the network is already a fixpoint of the pass.
pub fn algebraic_rewrite(aig: &mut Aig) -> usize {
    AlgebraicRewriting::from_aig(aig).run()
}

#[cfg(test)]
mod tests {
    use super::algebraic_rewrite;
    use crate::network::generators::{chains, random};
    use crate::sim::exhaustive_equivalent;
    use crate::{Aig, DepthView};

    #[test]
    fn test_associativity_left_deep_chain() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();
        let t1 = aig.and(c, d);
        let t2 = aig.and(t1, b);
        let po = aig.and(t2, a);
        aig.add_output(po);
        assert_eq!(DepthView::from_aig(&aig).depth(), 3);

        let before = aig.clone();
        assert_eq!(algebraic_rewrite(&mut aig), 1);
        aig.check();
        assert!(exhaustive_equivalent(&before, &aig));
        assert_eq!(DepthView::from_aig(&aig).depth(), 2);

        // The deep operand t1 moved up: the output is t1 & (a & b)
        let out = aig.output(0);
        assert!(!out.is_inverted());
        let fanins = aig.node(out.node()).fanins().to_vec();
        assert_eq!(fanins[0], t1);
        assert_eq!(aig.node(fanins[1].node()).fanins(), &[a, b]);
    }

    #[test]
    fn test_associativity_blocked_by_complement() {
        // The critical fanin is complemented: (c d) cannot be decomposed
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();
        let t1 = aig.and(c, d);
        let t2 = aig.and(t1, b);
        let po = aig.and(!t2, a);
        aig.add_output(po);

        let before = aig.clone();
        assert_eq!(algebraic_rewrite(&mut aig), 0);
        assert!(exhaustive_equivalent(&before, &aig));
        assert_eq!(DepthView::from_aig(&aig).depth(), 3);
    }

    #[test]
    fn test_distributivity_shared_literal() {
        let mut aig = Aig::new();
        let p = aig.add_input();
        let q = aig.add_input();
        let r = aig.add_input();
        let x = aig.and(p, q);
        let y = aig.and(p, r);
        let po = aig.or(x, y);
        aig.add_output(po);
        assert_eq!(DepthView::from_aig(&aig).depth(), 2);

        let before = aig.clone();
        assert_eq!(algebraic_rewrite(&mut aig), 1);
        aig.check();
        assert!(exhaustive_equivalent(&before, &aig));
        assert_eq!(DepthView::from_aig(&aig).depth(), 2);

        // The output is now p & (q + r)
        let out = aig.output(0);
        assert!(!out.is_inverted());
        let fanins = aig.node(out.node()).fanins().to_vec();
        assert_eq!(fanins[0], p);
        assert!(fanins[1].is_inverted());
        assert_eq!(aig.node(fanins[1].node()).fanins(), &[!q, !r]);
    }

    #[test]
    fn test_distributivity_no_shared_literal() {
        let mut aig = Aig::new();
        let p = aig.add_input();
        let q = aig.add_input();
        let r = aig.add_input();
        let s = aig.add_input();
        let x = aig.and(p, q);
        let y = aig.and(r, s);
        let po = aig.or(x, y);
        aig.add_output(po);

        let nb_nodes = aig.nb_nodes();
        assert_eq!(algebraic_rewrite(&mut aig), 0);
        assert_eq!(aig.nb_nodes(), nb_nodes);
        assert_eq!(DepthView::from_aig(&aig).depth(), 2);
    }

    #[test]
    fn test_distributivity_polarity_mismatch() {
        // Same node on both sides, but with opposite polarities: no factoring
        let mut aig = Aig::new();
        let p = aig.add_input();
        let q = aig.add_input();
        let r = aig.add_input();
        let x = aig.and(p, q);
        let y = aig.and(!p, r);
        let po = aig.or(x, y);
        aig.add_output(po);

        let before = aig.clone();
        assert_eq!(algebraic_rewrite(&mut aig), 0);
        assert!(exhaustive_equivalent(&before, &aig));
    }

    #[test]
    fn test_three_level_distributivity() {
        let mut aig = Aig::new();
        let leaves: Vec<_> = (0..8).map(|_| aig.add_input()).collect();
        let x2 = aig.add_input();
        let x3 = aig.add_input();
        let x4 = aig.add_input();
        // g is a balanced tree: deep, with no rebalancing opportunity
        let mut stage = leaves;
        while stage.len() > 1 {
            stage = stage.chunks(2).map(|w| aig.and(w[0], w[1])).collect();
        }
        let g = stage[0];
        let c = aig.and(g, x2);
        let o = aig.or(c, x3);
        let po = aig.and(o, x4);
        aig.add_output(po);
        assert_eq!(DepthView::from_aig(&aig).depth(), 6);

        let before = aig.clone();
        assert_eq!(algebraic_rewrite(&mut aig), 1);
        aig.check();
        assert!(exhaustive_equivalent(&before, &aig));
        assert_eq!(DepthView::from_aig(&aig).depth(), 5);

        // x4 was pushed into both terms of the Or
        let out = aig.output(0);
        assert!(out.is_inverted());
        let fanins = aig.node(out.node()).fanins().to_vec();
        assert!(fanins.iter().all(|f| f.is_inverted()));
    }

    #[test]
    fn test_three_level_distributivity_guarded() {
        // Same shape, but g arrives too early for the rewrite to pay off
        let mut aig = Aig::new();
        let g0 = aig.add_input();
        let g1 = aig.add_input();
        let x2 = aig.add_input();
        let x3 = aig.add_input();
        let x4 = aig.add_input();
        let g = aig.and(g0, g1);
        let c = aig.and(g, x2);
        let o = aig.or(c, x3);
        let po = aig.and(o, x4);
        aig.add_output(po);
        assert_eq!(DepthView::from_aig(&aig).depth(), 4);

        assert_eq!(algebraic_rewrite(&mut aig), 0);
        assert_eq!(DepthView::from_aig(&aig).depth(), 4);
    }

    #[test]
    fn test_fixed_point_single_gate() {
        let mut aig = Aig::new();
        let i0 = aig.add_input();
        let i1 = aig.add_input();
        let po = aig.and(i0, i1);
        aig.add_output(po);

        assert_eq!(algebraic_rewrite(&mut aig), 0);
        assert_eq!(aig.output(0), po);
        assert_eq!(DepthView::from_aig(&aig).depth(), 1);
    }

    #[test]
    fn test_non_critical_cone_untouched() {
        let mut aig = Aig::new();
        // Critical cone: a left-deep chain of depth 8
        let mut deep = aig.add_input();
        for _ in 0..8 {
            let i = aig.add_input();
            deep = aig.and(deep, i);
        }
        // Slack cone: a chain of depth 3
        let mut shallow = aig.add_input();
        for _ in 0..3 {
            let i = aig.add_input();
            shallow = aig.and(shallow, i);
        }
        aig.add_output(deep);
        aig.add_output(shallow);
        assert_eq!(DepthView::from_aig(&aig).depth(), 8);

        let slack_gates: Vec<u32> = (0..aig.nb_nodes() as u32)
            .filter(|n| aig.is_and(*n) && aig.node(*n).fanins()[1].node() > deep.node())
            .collect();
        let slack_before: Vec<_> = slack_gates.iter().map(|n| *aig.node(*n)).collect();
        assert_eq!(slack_gates.len(), 3);

        let before = aig.clone();
        assert!(algebraic_rewrite(&mut aig) > 0);
        aig.check();
        assert!(exhaustive_equivalent(&before, &aig));

        let depth = DepthView::from_aig(&aig).depth();
        assert!(depth < 8);
        assert!(depth >= 4);
        assert_eq!(aig.output(1), shallow);
        for (n, node) in slack_gates.iter().zip(slack_before.iter()) {
            assert!(aig.is_live(*n));
            assert_eq!(aig.node(*n), node);
        }
    }

    #[test]
    fn test_chain_rebalances_to_tree() {
        let (mut aig, po) = chains::and_chain(3);
        aig.add_output(po);
        assert_eq!(DepthView::from_aig(&aig).depth(), 3);

        let before = aig.clone();
        assert_eq!(algebraic_rewrite(&mut aig), 1);
        assert!(exhaustive_equivalent(&before, &aig));
        assert_eq!(DepthView::from_aig(&aig).depth(), 2);
    }

    #[test]
    fn test_random_aigs() {
        for seed in 0..25 {
            let mut aig = random::random_aig(6, 25, seed);
            let before = aig.clone();
            let depth_before = DepthView::from_aig(&aig).depth();

            algebraic_rewrite(&mut aig);
            aig.check();

            // Functional equivalence over all assignments
            assert!(exhaustive_equivalent(&before, &aig));
            // Depth monotonicity
            assert!(DepthView::from_aig(&aig).depth() <= depth_before);
            // Weak idempotence: the second run finds nothing
            assert_eq!(algebraic_rewrite(&mut aig), 0);
        }
    }

    #[test]
    fn test_deep_random_aigs() {
        for seed in 0..10 {
            let mut aig = random::random_aig(4, 60, seed);
            let before = aig.clone();
            let depth_before = DepthView::from_aig(&aig).depth();

            algebraic_rewrite(&mut aig);
            aig.check();
            assert!(exhaustive_equivalent(&before, &aig));
            assert!(DepthView::from_aig(&aig).depth() <= depth_before);
            assert_eq!(algebraic_rewrite(&mut aig), 0);
        }
    }
}
