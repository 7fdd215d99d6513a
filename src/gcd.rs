use serde::{Deserialize, Serialize};

use crate::sequencer::{Datapath, Sequencer};

/// Repeated-subtraction GCD datapath.
///
/// Each `Calc` edge compares the working registers and subtracts the
/// smaller from the larger; equality terminates with the common value.
/// A step that observes a zero operand terminates at once with the other
/// operand: subtracting zero makes no progress, so gcd(a, 0) = a and
/// gcd(0, 0) = 0 each complete in a single `Calc` cycle.
///
/// Convergence is linear in operand magnitude (gcd(1, u32::MAX) needs on
/// the order of 2^32 steps), unlike a division-based evaluator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GcdUnit {
    a: u32,
    b: u32,
}

impl Datapath for GcdUnit {
    type Operand = u32;
    type Result = u32;

    fn capture(&mut self, a: u32, b: u32) {
        self.a = a;
        self.b = b;
    }

    fn step(&mut self) -> Option<u32> {
        if self.a == 0 {
            return Some(self.b);
        }
        if self.b == 0 {
            return Some(self.a);
        }
        if self.a == self.b {
            return Some(self.a);
        }
        if self.a > self.b {
            self.a -= self.b;
        } else {
            self.b -= self.a;
        }
        None
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The shared sequencer driving the subtractive datapath.
pub type GcdCore = Sequencer<GcdUnit>;
