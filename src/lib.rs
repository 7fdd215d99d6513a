//! Cycle-accurate models of two enable-gated synchronous arithmetic cores:
//! a repeated-subtraction GCD evaluator and a bit-serial Booth multiplier,
//! both driven by the same three-state control sequencer.

pub mod bench;
pub mod booth;
pub mod gcd;
pub mod sequencer;

pub use bench::{Bench, BenchError, RunReport, TraceSample};
pub use booth::{BoothCore, BoothUnit};
pub use gcd::{GcdCore, GcdUnit};
pub use sequencer::{CoreInput, CoreOutput, Datapath, Phase, Sequencer};

/// Width in bits of both cores' operand registers.
pub const OPERAND_BITS: u32 = 32;
