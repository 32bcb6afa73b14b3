use std::path::PathBuf;

/// How an output redirection opens its target.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OutputMode {
    /// `>`
    Truncate,
    /// `>>`
    Append,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputRedirect {
    pub path: PathBuf,
    pub mode: OutputMode,
}

/// One program invocation within a pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stage {
    /// Program name followed by its arguments.
    pub argv: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<OutputRedirect>,
}

impl Stage {
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// Stages connected output-to-input, left to right.
#[derive(Clone, Debug, PartialEq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn is_single(&self) -> bool {
        self.stages.len() == 1
    }
}

/// What a unit asks the shell to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Cd(Vec<String>),
    Quit,
    Pause,
    External(Pipeline),
}

/// One `;`-separated piece of a command line.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandUnit {
    /// Unit text with the background marker removed, used for job display.
    pub input: String,
    pub command: Command,
    pub background: bool,
}

/// A fully parsed command line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandLine {
    pub units: Vec<CommandUnit>,
}

/// Builds a `Stage` while its tokens are scanned.
#[derive(Debug, Default)]
pub struct StageBuilder {
    argv: Vec<String>,
    input: Option<PathBuf>,
    output: Option<OutputRedirect>,
}

impl StageBuilder {
    pub fn new() -> StageBuilder {
        Default::default()
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> StageBuilder {
        self.argv.push(arg.into());
        self
    }

    pub fn input<P: Into<PathBuf>>(mut self, path: P) -> StageBuilder {
        self.input = Some(path.into());
        self
    }

    pub fn output<P: Into<PathBuf>>(mut self, path: P, mode: OutputMode) -> StageBuilder {
        self.output = Some(OutputRedirect {
            path: path.into(),
            mode,
        });
        self
    }

    pub fn clear_output(mut self) -> StageBuilder {
        self.output = None;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    pub fn build(self) -> Stage {
        Stage {
            argv: self.argv,
            input: self.input,
            output: self.output,
        }
    }
}
