/// Failure classes that end an invocation, each with its own exit code.
#[derive(Debug, thiserror::Error)]
pub enum GrunError {
    #[error("{0}")]
    Usage(String),

    #[error("{0:#}")]
    Input(anyhow::Error),

    #[error("config: {0:#}")]
    Config(anyhow::Error),

    #[error("package catalog: {0:#}")]
    Catalog(anyhow::Error),

    #[error("cannot stage program: {0:#}")]
    Render(anyhow::Error),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot relay program output: {0}")]
    Output(#[source] std::io::Error),

    /// The generated program failed to build or exited non-zero. Its stderr
    /// has already been relayed; only the status is left to report.
    #[error("program exited with status {code}")]
    Runtime { code: i32 },
}

impl GrunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            GrunError::Usage(_) => 2,
            GrunError::Runtime { code } => *code,
            _ => 1,
        }
    }

    /// Runtime failures speak through the program's own stderr.
    pub fn is_reported_by_child(&self) -> bool {
        matches!(self, GrunError::Runtime { .. })
    }
}
