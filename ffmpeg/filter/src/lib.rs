/*!
    Two-input video filter graphs for the EasyFFmpeg helper crates.

    A [`FilterGraph`] has two buffer sources, `in0` and `in1`, and one sink
    bound to the `[out]` label of a user-supplied filter description. The
    [`Orchestrator`] drives two decoded inputs through such a graph in
    lock step and hands every filtered frame to a callback.
*/

mod graph;
mod input;
mod orchestrator;
mod params;

pub use graph::{FilterGraph, Pull};
pub use input::DecodedInput;
pub use orchestrator::{FrameGraph, FrameInput, InputStep, Orchestrator, OrchestratorConfig, RunStats};
pub use params::{BufferParams, DEFAULT_OUTPUT_FORMATS, InputId};
