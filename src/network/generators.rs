//! Aig generators and templates

/// Chain generators
pub mod chains {
    use crate::{Aig, Signal};

    /// A left-deep And chain over fresh inputs; depth equals the chain length
    pub fn and_chain(len: usize) -> (Aig, Signal) {
        assert!(len > 0);
        let mut ret = Aig::new();
        let mut acc = ret.add_input();
        for _ in 0..len {
            let i = ret.add_input();
            acc = ret.and(acc, i);
        }
        ret.check();
        (ret, acc)
    }
}

/// Tree generators
pub mod trees {
    use crate::{Aig, Signal};

    /// A balanced And tree over 2^depth fresh inputs
    pub fn and_tree(depth: usize) -> (Aig, Signal) {
        let mut ret = Aig::new();
        let mut stage: Vec<Signal> = (0..1usize << depth).map(|_| ret.add_input()).collect();
        while stage.len() > 1 {
            stage = stage
                .chunks(2)
                .map(|c| ret.and(c[0], c[1]))
                .collect();
        }
        ret.check();
        (ret, stage[0])
    }
}

/// Random generators for property testing
pub mod random {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::{Aig, DepthView, Signal};

    /// Generate a random combinational Aig with a reproducible seed
    ///
    /// Gates pick their fanins uniformly among the signals built so far, with
    /// random polarities; trivial picks are simplified away by the store, so
    /// the number of live gates may be lower than requested. The deepest
    /// signal is always driven to an output so the network has a non-trivial
    /// critical path, and a few random signals are exposed as well.
    pub fn random_aig(nb_inputs: usize, nb_gates: usize, seed: u64) -> Aig {
        assert!(nb_inputs >= 2);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ret = Aig::new();
        let mut signals: Vec<Signal> = (0..nb_inputs).map(|_| ret.add_input()).collect();
        for _ in 0..nb_gates {
            let f0 = signals[rng.gen_range(0..signals.len())] ^ rng.gen_bool(0.5);
            let f1 = signals[rng.gen_range(0..signals.len())] ^ rng.gen_bool(0.5);
            let s = ret.and(f0, f1);
            if !s.is_constant() {
                signals.push(s);
            }
        }
        let view = DepthView::from_aig(&ret);
        let deepest = *signals
            .iter()
            .max_by_key(|s| view.signal_level(**s))
            .unwrap();
        ret.add_output(deepest ^ rng.gen_bool(0.5));
        for _ in 0..2 {
            let s = signals[rng.gen_range(0..signals.len())];
            ret.add_output(s ^ rng.gen_bool(0.5));
        }
        ret.check();
        ret
    }
}
