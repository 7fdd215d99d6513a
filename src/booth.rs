use serde::{Deserialize, Serialize};

use crate::sequencer::{Datapath, Sequencer};
use crate::OPERAND_BITS;

/// Bit-serial Booth multiplier datapath.
///
/// Registers: the multiplicand, an accumulator holding the running upper
/// half of the product, a low half seeded with the multiplier, and a
/// one-bit history of the last bit shifted out of the low half. Each
/// `Calc` edge examines (low bit, history) to add, subtract, or skip the
/// multiplicand, then shifts the accumulator/low-half pair right one
/// position: the accumulator shifts arithmetically and its outgoing low
/// bit becomes the low half's incoming high bit. After 32 steps the pair
/// holds the full 64-bit signed product.
///
/// The accumulator lives in an `i64` rather than an exactly-32-bit
/// register: `0 - i32::MIN` carries into a 33rd bit, and truncating it
/// corrupts the `i32::MIN * i32::MIN` product.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoothUnit {
    multiplicand: i32,
    acc: i64,
    low: u32,
    history: bool,
    steps: u32,
}

impl Datapath for BoothUnit {
    type Operand = i32;
    type Result = i64;

    fn capture(&mut self, m: i32, q: i32) {
        self.multiplicand = m;
        self.acc = 0;
        self.low = q as u32;
        self.history = false;
        self.steps = 0;
    }

    fn step(&mut self) -> Option<i64> {
        let bit = self.low & 1 != 0;
        match (bit, self.history) {
            (false, true) => self.acc += i64::from(self.multiplicand),
            (true, false) => self.acc -= i64::from(self.multiplicand),
            _ => {}
        }
        self.history = bit;
        self.low = (self.low >> 1) | (((self.acc & 1) as u32) << 31);
        self.acc >>= 1;
        self.steps += 1;
        if self.steps == OPERAND_BITS {
            Some((self.acc << 32) | i64::from(self.low))
        } else {
            None
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The shared sequencer driving the Booth datapath.
pub type BoothCore = Sequencer<BoothUnit>;
