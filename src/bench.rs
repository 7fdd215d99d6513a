use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::sequencer::{CoreInput, CoreOutput, Datapath, Phase, Sequencer};

/// Default number of clock edges a run may consume before it is abandoned.
///
/// The subtractive core converges linearly in operand magnitude, so the
/// worst case (gcd(1, u32::MAX)) genuinely needs on the order of 2^32
/// edges; the default leaves slack for the control cycles on top.
pub const DEFAULT_CYCLE_LIMIT: u64 = 1 << 33;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("computation still running after {0} clock edges")]
    CycleLimit(u64),
}

/// Signals recorded after one clock edge.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct TraceSample<R> {
    pub cycle: u64,
    pub phase: Phase,
    pub done: bool,
    pub result: R,
}

/// Summary of a completed run.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct RunReport<R> {
    pub result: R,
    /// Clock edges from the enable pulse through the edge that raised
    /// `done`, exclusive of the edge that returns the core to `Idle`.
    pub cycles: u64,
}

/// Clock driver for a single core: pulses reset, drives complete
/// enable-to-done runs under a cycle cap, and optionally records a
/// per-cycle signal trace.
pub struct Bench<D: Datapath> {
    core: Sequencer<D>,
    cycle: u64,
    limit: u64,
    trace: Option<Vec<TraceSample<D::Result>>>,
}

impl<D: Datapath> Bench<D> {
    pub fn new(core: Sequencer<D>) -> Self {
        Self {
            core,
            cycle: 0,
            limit: DEFAULT_CYCLE_LIMIT,
            trace: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Start recording one `TraceSample` per committed edge.
    pub fn record_trace(&mut self) {
        self.trace = Some(Vec::new());
    }

    pub fn trace(&self) -> Option<&[TraceSample<D::Result>]> {
        self.trace.as_deref()
    }

    /// Total clock edges committed since the bench was created.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn core(&self) -> &Sequencer<D> {
        &self.core
    }

    /// Commit one edge and record it.
    pub fn tick(&mut self, input: CoreInput<D::Operand>) -> CoreOutput<D::Result> {
        let out = self.core.rising_edge(false, input);
        self.cycle += 1;
        trace!(
            cycle = self.cycle,
            phase = ?self.core.phase(),
            done = out.done,
            "edge"
        );
        if let Some(samples) = self.trace.as_mut() {
            samples.push(TraceSample {
                cycle: self.cycle,
                phase: self.core.phase(),
                done: out.done,
                result: out.result,
            });
        }
        out
    }

    /// Hold reset for one edge.
    pub fn pulse_reset(&mut self) {
        self.core
            .rising_edge(true, CoreInput::hold(D::Operand::default(), D::Operand::default()));
        self.cycle += 1;
        debug!(cycle = self.cycle, "reset pulsed");
    }

    /// Drive a complete computation: enable for one edge, then tick until
    /// `done` rises, then return the core to `Idle`.
    pub fn run(
        &mut self,
        a: D::Operand,
        b: D::Operand,
    ) -> Result<RunReport<D::Result>, BenchError> {
        let started = self.cycle;
        self.tick(CoreInput::start(a, b));
        let quiet = CoreInput::hold(a, b);
        let result = loop {
            let out = self.tick(quiet);
            if out.done {
                break out.result;
            }
            if self.cycle - started >= self.limit {
                return Err(BenchError::CycleLimit(self.limit));
            }
        };
        let cycles = self.cycle - started;
        // Done -> Idle, so the next run's enable pulse is sampled in Idle.
        self.tick(quiet);
        debug!(cycles, "run complete");
        Ok(RunReport { result, cycles })
    }
}

impl<D: Datapath + Default> Default for Bench<D> {
    fn default() -> Self {
        Self::new(Sequencer::default())
    }
}
