use std::fmt;

use jobwatch_core::{Msg, PollMode, Theme, Verdict};

pub const HELP: &str = "commands: stop | resume | forget | filter <ok|nok|unknown|error> on|off | \
theme dark|light | export [dir] | search-export [dir] | batch | search | show | help | quit";

/// One line typed while watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Stop,
    Resume,
    Forget,
    Filter { verdict: Verdict, enabled: bool },
    Theme(Theme),
    Export { dir: Option<String> },
    SearchExport { dir: Option<String> },
    /// Full batch over the collected URLs (or the original form input).
    Batch,
    /// Repeat the search-only run.
    Search,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError(String);

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({HELP})", self.0)
    }
}

impl std::error::Error for InputError {}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<InputCommand>, InputError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("stop", []) => InputCommand::Stop,
        ("resume", []) => InputCommand::Resume,
        ("forget", []) => InputCommand::Forget,
        ("filter", [verdict, switch]) => {
            let verdict = Verdict::parse(&verdict.to_ascii_lowercase())
                .ok_or_else(|| InputError(format!("unknown verdict '{verdict}'")))?;
            let enabled = match switch.to_ascii_lowercase().as_str() {
                "on" => true,
                "off" => false,
                other => return Err(InputError(format!("expected on/off, got '{other}'"))),
            };
            InputCommand::Filter { verdict, enabled }
        }
        ("theme", [name]) => {
            let theme =
                Theme::parse(name).ok_or_else(|| InputError(format!("unknown theme '{name}'")))?;
            InputCommand::Theme(theme)
        }
        ("export", []) => InputCommand::Export { dir: None },
        ("export", [dir]) => InputCommand::Export {
            dir: Some(dir.to_string()),
        },
        ("search-export", []) => InputCommand::SearchExport { dir: None },
        ("search-export", [dir]) => InputCommand::SearchExport {
            dir: Some(dir.to_string()),
        },
        ("batch", []) => InputCommand::Batch,
        ("search", []) => InputCommand::Search,
        ("show", []) => InputCommand::Show,
        ("help" | "?", []) => InputCommand::Help,
        ("quit" | "exit" | "q", []) => InputCommand::Quit,
        _ => return Err(InputError(format!("unrecognised command '{}'", line.trim()))),
    };
    Ok(Some(command))
}

impl InputCommand {
    /// Core message for this command; `None` for commands the loop handles.
    pub fn to_msg(&self, default_dir: &str) -> Option<Msg> {
        let dir = |dir: &Option<String>| dir.clone().unwrap_or_else(|| default_dir.to_string());
        match self {
            InputCommand::Stop => Some(Msg::StopClicked),
            InputCommand::Resume => Some(Msg::ResumeClicked),
            InputCommand::Forget => Some(Msg::ForgetClicked),
            InputCommand::Filter { verdict, enabled } => Some(Msg::FilterToggled {
                verdict: *verdict,
                enabled: *enabled,
            }),
            InputCommand::Theme(theme) => Some(Msg::ThemeSelected(*theme)),
            InputCommand::Export { dir: target } => Some(Msg::ExportRequested {
                target_dir: dir(target),
            }),
            InputCommand::SearchExport { dir: target } => Some(Msg::SearchExportRequested {
                target_dir: dir(target),
            }),
            InputCommand::Batch => Some(Msg::SubmitClicked(PollMode::Full)),
            InputCommand::Search => Some(Msg::SubmitClicked(PollMode::SearchOnly)),
            InputCommand::Show | InputCommand::Help | InputCommand::Quit => None,
        }
    }
}
