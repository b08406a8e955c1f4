pub type CmdResult<T> = classgraph::Result<(T, i32)>;

pub mod render;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
}

pub(crate) fn run_json(args: render::RenderArgs) -> (classgraph::Result<serde_json::Value>, i32) {
    crate::tty::status("classgraph is working...");

    dispatch!(args, render)
}
