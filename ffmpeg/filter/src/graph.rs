/*!
    A filter graph with two buffer sources and one sink.
*/

use ffmpeg_next::{ffi, filter, util::frame::video::Video as VideoFrameFFmpeg};
use tracing::{debug, info};

use easy_ffmpeg_types::{Error, PixelFormat, Result};

use crate::orchestrator::FrameGraph;
use crate::params::{BufferParams, InputId};

/// Label the description must give its final output.
const OUTPUT_LABEL: &str = "out";
/// Sink name when the output is restricted through a `format` filter.
const SINK_NAME: &str = "sink";

/**
    Result of pulling from the graph sink.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pull {
    /// A filtered frame was written into the caller's frame.
    Frame,
    /// The graph needs more input.
    Pending,
    /// Every input has ended and the graph has nothing left.
    Exhausted,
}

/**
    A configured filter graph.

    Built once; the sources keep the parameters they were created with for
    the life of the graph.
*/
pub struct FilterGraph {
    graph: filter::Graph,
    sink_name: &'static str,
    params: BufferParams,
    description: String,
}

impl FilterGraph {
    /**
        Build and validate a graph.

        Both buffer sources `in0` and `in1` are created from `params`. The
        description must consume the `[in0]` and `[in1]` labels and produce
        `[out]`. When `output_formats` is not empty, the output is converted
        to the first of those formats the graph can produce.

        # Example

        ```ignore
        let graph = FilterGraph::new(
            "[in0]pad=iw*2:ih[int];[int][in1]overlay=w[out]",
            &BufferParams::new(640, 480, PixelFormat::Yuv420p, Rational::new(1, 25)),
            DEFAULT_OUTPUT_FORMATS,
        )?;
        ```
    */
    pub fn new(description: &str, params: &BufferParams, output_formats: &[PixelFormat]) -> Result<Self> {
        easy_ffmpeg_source::init()?;

        let mut graph = filter::Graph::new();
        let buffer = find_filter("buffer")?;
        let buffersink = find_filter("buffersink")?;
        let args = params.args();

        for input in InputId::BOTH {
            graph
                .add(&buffer, input.name(), &args)
                .map_err(|e| Error::filter(format!("cannot create buffer source {input}: {e}")))?;
        }

        let sink_name = if output_formats.is_empty() {
            graph
                .add(&buffersink, OUTPUT_LABEL, "")
                .map_err(|e| Error::filter(format!("cannot create buffer sink: {e}")))?;
            OUTPUT_LABEL
        } else {
            let names: Vec<&str> = output_formats.iter().map(|f| f.name()).collect();
            let format_args = format!("pix_fmts={}", names.join("|"));
            let format = find_filter("format")?;

            graph
                .add(&format, OUTPUT_LABEL, &format_args)
                .map_err(|e| Error::filter(format!("cannot restrict output formats: {e}")))?;
            graph
                .add(&buffersink, SINK_NAME, "")
                .map_err(|e| Error::filter(format!("cannot create buffer sink: {e}")))?;

            let format_ctx = context_ptr(&mut graph, OUTPUT_LABEL)?;
            let sink_ctx = context_ptr(&mut graph, SINK_NAME)?;

            // Both contexts are owned by the graph, which is still alive
            let ret = unsafe { ffi::avfilter_link(format_ctx, 0, sink_ctx, 0) };
            if ret < 0 {
                return Err(Error::filter(format!(
                    "cannot link output to sink: {}",
                    ffmpeg_next::Error::from(ret)
                )));
            }
            SINK_NAME
        };

        graph
            .output(InputId::In0.name(), 0)
            .and_then(|parser| parser.output(InputId::In1.name(), 0))
            .and_then(|parser| parser.input(OUTPUT_LABEL, 0))
            .and_then(|parser| parser.parse(description))
            .map_err(|e| Error::filter(format!("cannot parse '{description}': {e}")))?;

        graph
            .validate()
            .map_err(|e| Error::filter(format!("invalid graph '{description}': {e}")))?;

        info!(description, args = %args, "configured filter graph");

        Ok(Self {
            graph,
            sink_name,
            params: params.clone(),
            description: description.to_string(),
        })
    }

    pub fn params(&self) -> &BufferParams {
        &self.params
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /**
        Submit a frame to one source. The source gets a new reference to the
        frame's buffers and `frame` itself is left untouched, so the caller
        may keep reading or reuse it.
    */
    pub fn feed(&mut self, input: InputId, frame: &VideoFrameFFmpeg) -> Result<()> {
        let source = context_ptr(&mut self.graph, input.name())?;

        // The source context is owned by the graph and outlives this call
        let ret = unsafe { ffi::av_buffersrc_write_frame(source, frame.as_ptr()) };
        if ret < 0 {
            return Err(Error::filter(format!(
                "cannot feed {input}: {}",
                ffmpeg_next::Error::from(ret)
            )));
        }
        Ok(())
    }

    /**
        Signal end of stream on one source.
    */
    pub fn finish(&mut self, input: InputId) -> Result<()> {
        let mut source = self
            .graph
            .get(input.name())
            .ok_or_else(|| Error::filter(format!("graph has no source {input}")))?;

        match source.source().flush() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => {
                debug!(%input, "closed filter input");
                Ok(())
            }
            Err(e) => Err(Error::filter(format!("cannot close {input}: {e}"))),
        }
    }

    /**
        Pull the next filtered frame into `frame`, replacing whatever it held.
    */
    pub fn pull(&mut self, frame: &mut VideoFrameFFmpeg) -> Result<Pull> {
        *frame = VideoFrameFFmpeg::empty();

        let mut sink = self
            .graph
            .get(self.sink_name)
            .ok_or_else(|| Error::filter("graph has no sink"))?;

        match sink.sink().frame(frame) {
            Ok(()) => Ok(Pull::Frame),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => Ok(Pull::Pending),
            Err(ffmpeg_next::Error::Eof) => Ok(Pull::Exhausted),
            Err(e) => Err(Error::filter(format!("cannot retrieve filtered frame: {e}"))),
        }
    }
}

fn context_ptr(graph: &mut filter::Graph, name: &str) -> Result<*mut ffi::AVFilterContext> {
    let mut context = graph
        .get(name)
        .ok_or_else(|| Error::filter(format!("graph has no filter named '{name}'")))?;
    Ok(unsafe { context.as_mut_ptr() })
}

fn find_filter(name: &str) -> Result<filter::Filter> {
    filter::find(name).ok_or_else(|| Error::filter(format!("filter '{name}' is not available")))
}

impl FrameGraph for FilterGraph {
    type Frame = VideoFrameFFmpeg;

    fn feed(&mut self, input: InputId, frame: &VideoFrameFFmpeg) -> Result<()> {
        FilterGraph::feed(self, input, frame)
    }

    fn finish(&mut self, input: InputId) -> Result<()> {
        FilterGraph::finish(self, input)
    }

    fn pull(&mut self, frame: &mut VideoFrameFFmpeg) -> Result<Pull> {
        FilterGraph::pull(self, frame)
    }
}

impl std::fmt::Debug for FilterGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterGraph")
            .field("description", &self.description)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
