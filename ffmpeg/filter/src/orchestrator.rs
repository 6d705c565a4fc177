/*!
    Driving two inputs through a filter graph.
*/

use std::ops::ControlFlow;

use tracing::{debug, error, info, warn};

use easy_ffmpeg_types::Result;

use crate::graph::Pull;
use crate::params::InputId;

/**
    The graph side of the orchestrator: two sources and a sink.
*/
pub trait FrameGraph {
    type Frame;

    fn feed(&mut self, input: InputId, frame: &Self::Frame) -> Result<()>;

    fn finish(&mut self, input: InputId) -> Result<()>;

    /**
        Pull one frame. `Err` means the graph is broken and the run must stop.
    */
    fn pull(&mut self, frame: &mut Self::Frame) -> Result<Pull>;
}

/**
    What a [`FrameInput::step`] did.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputStep {
    /// One coded unit was consumed; there may be more.
    Continue,
    /// The input has nothing more to read.
    Finished,
}

/**
    A source of decoded frames, read one coded unit at a time.
*/
pub trait FrameInput {
    type Frame;

    /**
        Read one coded unit and hand every frame it decodes to `on_frame`.

        An `Err` ends this input.
    */
    fn step(&mut self, on_frame: &mut dyn FnMut(&Self::Frame)) -> Result<InputStep>;

    /**
        Hand out frames still buffered after the last coded unit.
    */
    fn flush(&mut self, on_frame: &mut dyn FnMut(&Self::Frame)) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /**
        When an input finishes, flush its decoder into the graph and close
        its source; after both finish, pull until the graph runs dry. Off,
        frames still buffered in decoders or the graph are dropped.
    */
    pub drain_on_finish: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { drain_on_finish: true }
    }
}

/**
    Counters from one run.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Frames fed into `in0` and `in1`.
    pub frames_in: [u64; 2],
    /// Frames handed to the output callback.
    pub frames_out: u64,
    /// Frames the graph refused.
    pub feed_errors: u64,
    /// The output callback asked to stop.
    pub stopped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Reading,
    Finished,
}

/**
    Runs two inputs through a graph until both are finished, the graph
    fails, or the output callback breaks.
*/
#[derive(Clone, Debug, Default)]
pub struct Orchestrator {
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /**
        Run the two inputs to completion.

        Every round steps each input that is still reading by one coded
        unit, feeding the frames it decodes into that input's source, then
        pulls at most one frame from the sink. `output` is the scratch frame
        filtered frames are pulled into.

        Feed errors are logged and the frame dropped. A failed pull aborts
        the run with the graph's error.
    */
    pub fn run<G, I, F>(
        &self,
        graph: &mut G,
        mut inputs: [&mut I; 2],
        output: &mut G::Frame,
        mut on_output: F,
    ) -> Result<RunStats>
    where
        G: FrameGraph,
        I: FrameInput<Frame = G::Frame>,
        F: FnMut(&G::Frame) -> ControlFlow<()>,
    {
        let mut phases = [Phase::Reading; 2];
        let mut stats = RunStats::default();

        while phases.contains(&Phase::Reading) {
            for id in InputId::BOTH {
                let index = id.index();
                if phases[index] != Phase::Reading {
                    continue;
                }

                let input = &mut *inputs[index];
                let step = input.step(&mut |frame| feed(graph, id, frame, &mut stats));
                let finished = match step {
                    Ok(InputStep::Continue) => false,
                    Ok(InputStep::Finished) => true,
                    Err(e) => {
                        warn!(input = %id, error = %e, "input failed, treating it as finished");
                        true
                    }
                };

                if finished {
                    phases[index] = Phase::Finished;
                    self.finish_input(graph, input, id, &mut stats);
                }
            }

            match graph.pull(output) {
                Ok(Pull::Frame) => {
                    stats.frames_out += 1;
                    if on_output(&*output).is_break() {
                        stats.stopped = true;
                        info!(frames_out = stats.frames_out, "stopped by caller");
                        return Ok(stats);
                    }
                }
                Ok(Pull::Pending) | Ok(Pull::Exhausted) => {}
                Err(e) => {
                    error!(error = %e, "filter graph failed");
                    return Err(e);
                }
            }
        }

        if self.config.drain_on_finish {
            self.drain_graph(graph, output, &mut on_output, &mut stats)?;
        }

        info!(
            in0 = stats.frames_in[0],
            in1 = stats.frames_in[1],
            frames_out = stats.frames_out,
            feed_errors = stats.feed_errors,
            "filtering finished"
        );
        Ok(stats)
    }

    fn finish_input<G, I>(&self, graph: &mut G, input: &mut I, id: InputId, stats: &mut RunStats)
    where
        G: FrameGraph,
        I: FrameInput<Frame = G::Frame>,
    {
        debug!(input = %id, "input finished");
        if !self.config.drain_on_finish {
            return;
        }

        if let Err(e) = input.flush(&mut |frame| feed(graph, id, frame, stats)) {
            warn!(input = %id, error = %e, "cannot flush decoder");
        }
        if let Err(e) = graph.finish(id) {
            warn!(input = %id, error = %e, "cannot close filter input");
        }
    }

    fn drain_graph<G, F>(
        &self,
        graph: &mut G,
        output: &mut G::Frame,
        on_output: &mut F,
        stats: &mut RunStats,
    ) -> Result<()>
    where
        G: FrameGraph,
        F: FnMut(&G::Frame) -> ControlFlow<()>,
    {
        loop {
            match graph.pull(output)? {
                Pull::Frame => {
                    stats.frames_out += 1;
                    if on_output(&*output).is_break() {
                        stats.stopped = true;
                        return Ok(());
                    }
                }
                Pull::Pending | Pull::Exhausted => return Ok(()),
            }
        }
    }
}

fn feed<G: FrameGraph>(graph: &mut G, id: InputId, frame: &G::Frame, stats: &mut RunStats) {
    match graph.feed(id, frame) {
        Ok(()) => stats.frames_in[id.index()] += 1,
        Err(e) => {
            stats.feed_errors += 1;
            warn!(input = %id, error = %e, "dropping frame the graph refused");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use easy_ffmpeg_types::Error;

    use super::*;

    /// Emits a fixed number of frames per step for a fixed number of steps,
    /// then a few buffered frames on flush.
    struct ScriptedInput {
        steps: usize,
        frames_per_step: usize,
        buffered: usize,
        next: u32,
        fail_after: Option<usize>,
    }

    impl ScriptedInput {
        fn new(steps: usize, frames_per_step: usize) -> Self {
            Self {
                steps,
                frames_per_step,
                buffered: 0,
                next: 0,
                fail_after: None,
            }
        }
    }

    impl FrameInput for ScriptedInput {
        type Frame = u32;

        fn step(&mut self, on_frame: &mut dyn FnMut(&u32)) -> Result<InputStep> {
            if self.fail_after == Some(0) {
                return Err(Error::demux("broken container"));
            }
            if self.steps == 0 {
                return Ok(InputStep::Finished);
            }
            self.steps -= 1;
            self.fail_after = self.fail_after.map(|n| n - 1);
            for _ in 0..self.frames_per_step {
                self.next += 1;
                on_frame(&self.next);
            }
            Ok(InputStep::Continue)
        }

        fn flush(&mut self, on_frame: &mut dyn FnMut(&u32)) -> Result<()> {
            for _ in 0..std::mem::take(&mut self.buffered) {
                self.next += 1;
                on_frame(&self.next);
            }
            Ok(())
        }
    }

    /// Pairs frames from both inputs and emits their sum, like an overlay.
    #[derive(Default)]
    struct PairingGraph {
        queues: [VecDeque<u32>; 2],
        closed: [bool; 2],
        refuse: Option<u32>,
        fail_pull: bool,
        pulls: usize,
    }

    impl FrameGraph for PairingGraph {
        type Frame = u32;

        fn feed(&mut self, input: InputId, frame: &u32) -> Result<()> {
            if self.refuse == Some(*frame) {
                return Err(Error::filter("refused"));
            }
            self.queues[input.index()].push_back(*frame);
            Ok(())
        }

        fn finish(&mut self, input: InputId) -> Result<()> {
            self.closed[input.index()] = true;
            Ok(())
        }

        fn pull(&mut self, frame: &mut u32) -> Result<Pull> {
            self.pulls += 1;
            if self.fail_pull {
                return Err(Error::filter("graph broke"));
            }
            match (self.queues[0].front(), self.queues[1].front()) {
                (Some(&a), Some(&b)) => {
                    self.queues[0].pop_front();
                    self.queues[1].pop_front();
                    *frame = a + b;
                    Ok(Pull::Frame)
                }
                _ if self.closed == [true, true] => Ok(Pull::Exhausted),
                _ => Ok(Pull::Pending),
            }
        }
    }

    fn run_with(
        config: OrchestratorConfig,
        graph: &mut PairingGraph,
        a: &mut ScriptedInput,
        b: &mut ScriptedInput,
    ) -> (Result<RunStats>, Vec<u32>) {
        let mut seen = Vec::new();
        let mut output = 0;
        let result = Orchestrator::new(config).run(graph, [a, b], &mut output, |frame| {
            seen.push(*frame);
            ControlFlow::Continue(())
        });
        (result, seen)
    }

    #[test]
    fn terminates_when_both_inputs_finish() {
        let mut graph = PairingGraph::default();
        let mut a = ScriptedInput::new(3, 1);
        let mut b = ScriptedInput::new(5, 1);

        let (result, seen) = run_with(OrchestratorConfig::default(), &mut graph, &mut a, &mut b);
        let stats = result.unwrap();

        assert_eq!(stats.frames_in, [3, 5]);
        assert_eq!(seen, vec![2, 4, 6]);
        assert_eq!(graph.closed, [true, true]);
        assert!(!stats.stopped);
    }

    #[test]
    fn terminates_even_if_sink_never_produces() {
        let mut graph = PairingGraph::default();
        let mut a = ScriptedInput::new(4, 1);
        let mut b = ScriptedInput::new(0, 1);

        let (result, seen) = run_with(OrchestratorConfig::default(), &mut graph, &mut a, &mut b);

        assert_eq!(result.unwrap().frames_out, 0);
        assert!(seen.is_empty());
    }

    #[test]
    fn drain_on_finish_recovers_trailing_frames() {
        // Both inputs decode two frames per step, one output per round
        let mut graph = PairingGraph::default();
        let mut a = ScriptedInput::new(2, 2);
        let mut b = ScriptedInput::new(2, 2);
        a.buffered = 1;
        b.buffered = 1;

        let (result, seen) = run_with(OrchestratorConfig::default(), &mut graph, &mut a, &mut b);

        assert_eq!(result.unwrap().frames_out, 5);
        assert_eq!(seen.len(), 5);
        assert!(graph.queues.iter().all(VecDeque::is_empty));
    }

    #[test]
    fn without_drain_trailing_frames_stay_in_graph() {
        let mut graph = PairingGraph::default();
        let mut a = ScriptedInput::new(2, 2);
        let mut b = ScriptedInput::new(2, 2);
        a.buffered = 1;
        b.buffered = 1;

        let config = OrchestratorConfig { drain_on_finish: false };
        let (result, seen) = run_with(config, &mut graph, &mut a, &mut b);
        let stats = result.unwrap();

        // Three rounds: two reading rounds plus the round that finishes both
        assert_eq!(stats.frames_out, 3);
        assert_eq!(seen.len(), 3);
        assert_eq!(graph.queues[0].len(), 1);
        assert_eq!(graph.closed, [false, false]);
        assert_eq!(stats.frames_in, [4, 4]);
    }

    #[test]
    fn read_failure_finishes_input() {
        let mut graph = PairingGraph::default();
        let mut a = ScriptedInput::new(10, 1);
        a.fail_after = Some(2);
        let mut b = ScriptedInput::new(3, 1);

        let (result, _) = run_with(OrchestratorConfig::default(), &mut graph, &mut a, &mut b);
        let stats = result.unwrap();

        assert_eq!(stats.frames_in, [2, 3]);
        assert_eq!(stats.frames_out, 2);
    }

    #[test]
    fn feed_errors_are_skipped() {
        let mut graph = PairingGraph {
            refuse: Some(2),
            ..Default::default()
        };
        let mut a = ScriptedInput::new(3, 1);
        let mut b = ScriptedInput::new(3, 1);

        let (result, _) = run_with(OrchestratorConfig::default(), &mut graph, &mut a, &mut b);
        let stats = result.unwrap();

        // Frame 2 of both inputs is refused
        assert_eq!(stats.feed_errors, 2);
        assert_eq!(stats.frames_in, [2, 2]);
        assert_eq!(stats.frames_out, 2);
    }

    #[test]
    fn pull_failure_aborts() {
        let mut graph = PairingGraph {
            fail_pull: true,
            ..Default::default()
        };
        let mut a = ScriptedInput::new(5, 1);
        let mut b = ScriptedInput::new(5, 1);

        let (result, seen) = run_with(OrchestratorConfig::default(), &mut graph, &mut a, &mut b);

        assert!(matches!(result, Err(Error::Filter(_))));
        assert!(seen.is_empty());
        assert_eq!(graph.pulls, 1);
    }

    #[test]
    fn break_stops_the_run() {
        let mut graph = PairingGraph::default();
        let mut a = ScriptedInput::new(10, 1);
        let mut b = ScriptedInput::new(10, 1);
        let mut output = 0;
        let mut delivered = 0;

        let stats = Orchestrator::default()
            .run(&mut graph, [&mut a, &mut b], &mut output, |_| {
                delivered += 1;
                if delivered == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert!(stats.stopped);
        assert_eq!(stats.frames_out, 2);
        assert_eq!(a.steps, 8);
    }
}
