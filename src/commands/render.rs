use clap::Args;
use classgraph::defaults;
use classgraph::pipeline::{self, Overrides, PipelineRunResult, PipelineSpec};

use crate::commands::CmdResult;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Output image path (overwritten if it exists)
    pub output: String,

    /// Source file to analyze (default from classgraph.json, else src/document.py)
    #[arg(long, value_name = "FILE")]
    pub source: Option<String>,

    /// Image format passed to the renderer (default: png)
    #[arg(long, value_name = "FMT")]
    pub format: Option<String>,

    /// Delete the descriptor file when the render step fails
    #[arg(long)]
    pub cleanup_on_failure: bool,
}

impl RenderArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            source: self.source.clone(),
            format: self.format.clone(),
            cleanup_on_failure: self.cleanup_on_failure,
        }
    }
}

pub fn run(args: RenderArgs) -> CmdResult<PipelineRunResult> {
    let defaults = defaults::load_defaults();
    let spec = PipelineSpec::resolve(&defaults, &args.output, &args.overrides())?;

    let result = pipeline::run(&spec)?;
    Ok((result, 0))
}
