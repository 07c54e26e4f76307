use recon_core::{ExportFormat, Feature, JobId, TargetId};
use thiserror::Error;

pub const HELP: &str = "commands: open <feature> | target <id|none> | set <key> <value> | submit | \
stop <job> | view <job> | export <job> <csv|json|xml> | pause | resume | refresh | help | quit";

/// One line typed on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(Feature),
    Target(Option<TargetId>),
    Set { key: String, value: String },
    Submit,
    Stop(JobId),
    View(JobId),
    Export { job_id: JobId, format: ExportFormat },
    Pause,
    Resume,
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown feature `{0}`")]
    UnknownFeature(String),
    #[error("`{0}` is not a valid id")]
    InvalidId(String),
    #[error("unknown export format `{0}`")]
    UnknownFormat(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = words.collect();

        match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("open", [feature]) => Feature::parse(feature)
                .map(Command::Open)
                .ok_or_else(|| CommandError::UnknownFeature(feature.to_string())),
            ("open", _) => Err(CommandError::Usage("open <feature>")),
            ("target", ["none"]) => Ok(Command::Target(None)),
            ("target", [id]) => parse_id(id).map(|id| Command::Target(Some(id))),
            ("target", _) => Err(CommandError::Usage("target <id|none>")),
            // Values may contain spaces, e.g. a list of ports.
            ("set", [key, value @ ..]) => Ok(Command::Set {
                key: key.to_string(),
                value: value.join(" "),
            }),
            ("set", _) => Err(CommandError::Usage("set <key> <value>")),
            ("submit" | "start", []) => Ok(Command::Submit),
            ("stop", [id]) => parse_id(id).map(Command::Stop),
            ("stop", _) => Err(CommandError::Usage("stop <job>")),
            ("view", [id]) => parse_id(id).map(Command::View),
            ("view", _) => Err(CommandError::Usage("view <job>")),
            ("export", [id, format]) => {
                let job_id = parse_id(id)?;
                let format = ExportFormat::parse(format)
                    .ok_or_else(|| CommandError::UnknownFormat(format.to_string()))?;
                Ok(Command::Export { job_id, format })
            }
            ("export", _) => Err(CommandError::Usage("export <job> <csv|json|xml>")),
            ("pause", []) => Ok(Command::Pause),
            ("resume", []) => Ok(Command::Resume),
            ("refresh", []) => Ok(Command::Refresh),
            ("help" | "?", _) => Ok(Command::Help),
            ("quit" | "exit", _) => Ok(Command::Quit),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_id(raw: &str) -> Result<u64, CommandError> {
    raw.trim_start_matches('#')
        .parse()
        .map_err(|_| CommandError::InvalidId(raw.to_string()))
}
