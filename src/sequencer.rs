use std::fmt;

use serde::{Deserialize, Serialize};

/// Control state shared by both cores.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Calc,
    Done,
}

/// Arithmetic unit driven by the sequencer.
///
/// `capture` loads the working registers when a computation is accepted,
/// `step` advances them by one `Calc` edge and yields the final value once
/// the termination condition holds, `clear` returns them to their reset
/// values.
pub trait Datapath {
    type Operand: Copy + Default;
    type Result: Copy + Default + fmt::Debug;

    fn capture(&mut self, a: Self::Operand, b: Self::Operand);
    fn step(&mut self) -> Option<Self::Result>;
    fn clear(&mut self);
}

/// Input pins sampled at each rising clock edge.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct CoreInput<T> {
    pub a: T,
    pub b: T,
    pub enable: bool,
}

impl<T> CoreInput<T> {
    /// Pins held at the given operands with enable asserted.
    pub fn start(a: T, b: T) -> Self {
        Self { a, b, enable: true }
    }

    /// Pins held at the given operands with enable deasserted.
    pub fn hold(a: T, b: T) -> Self {
        Self { a, b, enable: false }
    }
}

/// Registered outputs as visible after a clock edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreOutput<R> {
    pub result: R,
    pub done: bool,
}

/// Enable-gated three-state controller wrapped around a datapath.
///
/// Enable is consulted only to leave `Idle`; once a computation has started
/// it runs to completion whether or not enable stays high, and the input
/// operand pins are never resampled until the next `Idle` capture. The
/// result register is written once, on the `Calc` -> `Done` edge, and holds
/// its value until the next computation overwrites it. `done` is high for
/// exactly the one cycle spent in `Done`. Reset is synchronous and
/// unconditional: it forces `Idle` and clears done, result, and the
/// working registers regardless of the other pins.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "D: Serialize, D::Result: Serialize",
    deserialize = "D: Deserialize<'de>, D::Result: Deserialize<'de>"
))]
pub struct Sequencer<D: Datapath> {
    phase: Phase,
    done: bool,
    result: D::Result,
    unit: D,
}

impl<D: Datapath> Sequencer<D> {
    pub fn new(unit: D) -> Self {
        Self {
            phase: Phase::Idle,
            done: false,
            result: D::Result::default(),
            unit,
        }
    }

    /// Commit one clock edge: sample reset and the input pins, apply a
    /// single transition, and return the registered outputs.
    pub fn rising_edge(
        &mut self,
        reset: bool,
        input: CoreInput<D::Operand>,
    ) -> CoreOutput<D::Result> {
        if reset {
            self.phase = Phase::Idle;
            self.done = false;
            self.result = D::Result::default();
            self.unit.clear();
            return self.output();
        }
        match self.phase {
            Phase::Idle => {
                self.done = false;
                if input.enable {
                    self.unit.capture(input.a, input.b);
                    self.phase = Phase::Calc;
                }
            }
            Phase::Calc => {
                if let Some(value) = self.unit.step() {
                    self.result = value;
                    self.done = true;
                    self.phase = Phase::Done;
                }
            }
            Phase::Done => {
                self.done = false;
                self.phase = Phase::Idle;
            }
        }
        self.output()
    }

    /// Registered outputs without advancing the clock.
    pub fn output(&self) -> CoreOutput<D::Result> {
        CoreOutput {
            result: self.result,
            done: self.done,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl<D: Datapath + Default> Default for Sequencer<D> {
    fn default() -> Self {
        Self::new(D::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Converges after a fixed number of steps, yielding the second operand.
    #[derive(Clone, Debug, Default)]
    struct Countdown {
        remaining: u32,
        value: u32,
    }

    impl Datapath for Countdown {
        type Operand = u32;
        type Result = u32;

        fn capture(&mut self, a: u32, b: u32) {
            self.remaining = a;
            self.value = b;
        }

        fn step(&mut self) -> Option<u32> {
            if self.remaining == 0 {
                return Some(self.value);
            }
            self.remaining -= 1;
            None
        }

        fn clear(&mut self) {
            *self = Self::default();
        }
    }

    fn run_to_done(seq: &mut Sequencer<Countdown>, a: u32, b: u32) -> (u32, u64) {
        seq.rising_edge(false, CoreInput::start(a, b));
        let mut edges = 1u64;
        loop {
            let out = seq.rising_edge(false, CoreInput::hold(a, b));
            edges += 1;
            if out.done {
                return (out.result, edges);
            }
            assert!(edges < 1000, "countdown run never finished");
        }
    }

    #[test]
    fn stays_idle_without_enable() {
        let mut seq = Sequencer::<Countdown>::default();
        for _ in 0..4 {
            let out = seq.rising_edge(false, CoreInput::hold(3, 7));
            assert_eq!(seq.phase(), Phase::Idle);
            assert!(!out.done);
        }
    }

    #[test]
    fn enable_pulse_starts_a_run() {
        let mut seq = Sequencer::<Countdown>::default();
        seq.rising_edge(false, CoreInput::start(2, 9));
        assert_eq!(seq.phase(), Phase::Calc);
        let (result, edges) = {
            let mut edges = 1u64;
            loop {
                let out = seq.rising_edge(false, CoreInput::hold(2, 9));
                edges += 1;
                if out.done {
                    break (out.result, edges);
                }
            }
        };
        assert_eq!(result, 9);
        // capture edge + 2 busy steps + converging step
        assert_eq!(edges, 4);
    }

    #[test]
    fn done_pulses_for_exactly_one_cycle() {
        let mut seq = Sequencer::<Countdown>::default();
        let (_, _) = run_to_done(&mut seq, 1, 5);
        assert_eq!(seq.phase(), Phase::Done);
        let out = seq.rising_edge(false, CoreInput::hold(1, 5));
        assert!(!out.done, "done must drop when Done returns to Idle");
        assert_eq!(seq.phase(), Phase::Idle);
    }

    #[test]
    fn enable_is_ignored_while_in_done() {
        let mut seq = Sequencer::<Countdown>::default();
        run_to_done(&mut seq, 0, 5);
        // Asserting enable on the Done edge must not capture new operands.
        let out = seq.rising_edge(false, CoreInput::start(9, 1));
        assert_eq!(seq.phase(), Phase::Idle);
        assert!(!out.done);
        assert_eq!(out.result, 5, "result register must survive Done -> Idle");
    }

    #[test]
    fn operands_are_not_resampled_mid_run() {
        let mut seq = Sequencer::<Countdown>::default();
        seq.rising_edge(false, CoreInput::start(2, 11));
        // The pins move after capture; the captured values must win.
        seq.rising_edge(false, CoreInput::hold(99, 99));
        seq.rising_edge(false, CoreInput::hold(99, 99));
        let out = seq.rising_edge(false, CoreInput::hold(99, 99));
        assert!(out.done);
        assert_eq!(out.result, 11);
    }

    #[test]
    fn dropping_enable_mid_run_does_not_stall() {
        let mut seq = Sequencer::<Countdown>::default();
        seq.rising_edge(false, CoreInput::start(3, 4));
        let mut edges = 0u64;
        let result = loop {
            let out = seq.rising_edge(false, CoreInput::hold(3, 4));
            edges += 1;
            if out.done {
                break out.result;
            }
            assert!(edges < 10, "run stalled after enable dropped");
        };
        assert_eq!(result, 4);
    }

    #[test]
    fn reset_forces_idle_and_clears_outputs() {
        let mut seq = Sequencer::<Countdown>::default();
        run_to_done(&mut seq, 2, 8);
        seq.rising_edge(false, CoreInput::start(50, 1));
        assert_eq!(seq.phase(), Phase::Calc);
        // Reset wins over enable and over the in-flight computation.
        let out = seq.rising_edge(true, CoreInput::start(50, 1));
        assert_eq!(seq.phase(), Phase::Idle);
        assert!(!out.done);
        assert_eq!(out.result, 0);
    }

    #[test]
    fn result_holds_until_next_run_overwrites_it() {
        let mut seq = Sequencer::<Countdown>::default();
        run_to_done(&mut seq, 1, 21);
        for _ in 0..3 {
            let out = seq.rising_edge(false, CoreInput::hold(0, 0));
            assert_eq!(out.result, 21);
        }
        let (result, _) = run_to_done(&mut seq, 1, 34);
        assert_eq!(result, 34);
    }
}
