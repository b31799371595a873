//! Depth optimization of And-Inverter-Graphs (AIG).
//!
//! This crate provides a representation for logic networks based on 2-input And gates with
//! implicit inverters, and an optimization pass that reduces the depth of a network by
//! rewriting its critical path with algebraic identities.
//!
//! It is inspired by the logic synthesis tools ABC and Mockturtle. The function at every
//! output is preserved; the gate count may grow, as the pass trades area for depth.
//!
//! ```
//! use craig::{algebraic_rewrite, Aig, DepthView};
//!
//! // A left-deep chain of And gates
//! let mut aig = Aig::new();
//! let mut acc = aig.add_input();
//! for _ in 0..3 {
//!     let i = aig.add_input();
//!     acc = aig.and(acc, i);
//! }
//! aig.add_output(acc);
//! assert_eq!(DepthView::from_aig(&aig).depth(), 3);
//!
//! // Rebalanced to the optimal depth
//! algebraic_rewrite(&mut aig);
//! assert_eq!(DepthView::from_aig(&aig).depth(), 2);
//! ```

#![warn(missing_docs)]

pub mod network;
pub mod optim;
pub mod sim;

pub use network::{Aig, AigNode, DepthView, Signal};
pub use optim::algebraic_rewrite;
