use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::{ProfileData, Project};

const IDLE_LIMIT_MINUTES: i64 = 60;

const HELP: &[(&str, &str)] = &[
    ("help", "Show this help message"),
    ("clear", "Clear the terminal"),
    ("theme", "Toggle between light and dark theme"),
    ("echo [text]", "Display text"),
    ("date", "Display current date and time"),
    ("ls", "List available sections"),
    ("cat [file]", "Display file content"),
    ("whoami", "Display current user"),
    ("about", "Show about information"),
    ("skills", "List my skills"),
    ("projects", "View my projects"),
    ("contact", "Show contact info"),
];

const LISTING: &[&str] = &[
    "projects/",
    "courses/",
    "skills/",
    "resume.pdf",
    "contact.md",
    "about.txt",
];

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CommandOutput {
    pub command: String,
    pub lines: Vec<String>,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Output(CommandOutput),
    Cleared,
}

/// Live data the profile-backed commands read from.
pub struct TerminalContext<'a> {
    pub profile: &'a ProfileData,
    pub projects: &'a [Project],
    pub now: DateTime<Utc>,
}

fn output(command: &str, lines: Vec<String>) -> Outcome {
    Outcome::Output(CommandOutput {
        command: command.to_string(),
        lines,
        is_error: false,
    })
}

fn failure(command: &str, line: String) -> Outcome {
    Outcome::Output(CommandOutput {
        command: command.to_string(),
        lines: vec![line],
        is_error: true,
    })
}

fn about_lines(profile: &ProfileData) -> Vec<String> {
    vec![profile.bio.clone(), format!("Currently: {}.", profile.title)]
}

fn contact_lines(profile: &ProfileData) -> Vec<String> {
    let mut lines = vec![format!("Email: {}", profile.email)];
    if !profile.links.github.is_empty() {
        lines.push(format!("GitHub: {}", profile.links.github));
    }
    if !profile.links.linkedin.is_empty() {
        lines.push(format!("LinkedIn: {}", profile.links.linkedin));
    }
    lines
}

/// Runs one command line. `theme` is flipped in place by `theme`.
pub fn run_command(input: &str, theme: &mut Theme, ctx: &TerminalContext<'_>) -> Outcome {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or("").to_lowercase();
    let args: Vec<&str> = parts.collect();

    match command.as_str() {
        "help" => {
            let mut lines = vec!["Available commands:".to_string()];
            lines.extend(HELP.iter().map(|(name, text)| format!("  {} - {}", name, text)));
            output(input, lines)
        }
        "clear" => Outcome::Cleared,
        "theme" => {
            *theme = theme.toggled();
            output(input, vec![format!("Theme switched to {} mode.", theme.as_str())])
        }
        "echo" => output(input, vec![args.join(" ")]),
        "date" => output(input, vec![ctx.now.format("%Y-%m-%d %H:%M:%S UTC").to_string()]),
        "ls" => output(input, LISTING.iter().map(|entry| entry.to_string()).collect()),
        "cat" => match args.first() {
            Some(&"about.txt") => output(input, about_lines(ctx.profile)),
            Some(&"contact.md") => output(input, contact_lines(ctx.profile)),
            Some(&"resume.pdf") => output(
                input,
                vec!["Opening resume.pdf... Please download it from the profile section.".to_string()],
            ),
            Some(file) => failure(input, format!("File not found: {}", file)),
            None => failure(input, "cat: missing file operand".to_string()),
        },
        "whoami" => output(
            input,
            vec![format!("{} - {}", ctx.profile.full_name, ctx.profile.title)],
        ),
        "about" => output(input, about_lines(ctx.profile)),
        "skills" if ctx.profile.skills.is_empty() => {
            output(input, vec!["No skills listed yet.".to_string()])
        }
        "skills" => output(input, vec![ctx.profile.skills.join(", ")]),
        "projects" if ctx.projects.is_empty() => output(input, vec!["No projects yet.".to_string()]),
        "projects" => output(
            input,
            ctx.projects
                .iter()
                .map(|project| format!("- {} [{}]", project.title, project.category))
                .collect(),
        ),
        "contact" => output(input, contact_lines(ctx.profile)),
        _ => failure(
            input,
            format!(
                "Command not found: {}. Type 'help' for available commands.",
                command
            ),
        ),
    }
}

/// One visitor's terminal: scrollback, theme and command history.
#[derive(Debug, Clone)]
pub struct Terminal {
    history: Vec<String>,
    /// Steps back from the newest command; `None` means a fresh prompt.
    history_index: Option<usize>,
    outputs: Vec<CommandOutput>,
    theme: Theme,
    last_used: DateTime<Utc>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TerminalView {
    pub session_id: Uuid,
    pub theme: Theme,
    pub history: Vec<String>,
    pub outputs: Vec<CommandOutput>,
}

impl Terminal {
    pub fn new(now: DateTime<Utc>) -> Self {
        Terminal {
            history: Vec::new(),
            history_index: None,
            outputs: Vec::new(),
            theme: Theme::default(),
            last_used: now,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Blank input is ignored and not recorded.
    pub fn submit(&mut self, input: &str, ctx: &TerminalContext<'_>) -> Option<Outcome> {
        let input = input.trim();
        self.last_used = ctx.now;
        if input.is_empty() {
            return None;
        }
        self.history.push(input.to_string());
        self.history_index = None;

        let outcome = run_command(input, &mut self.theme, ctx);
        match &outcome {
            Outcome::Cleared => self.outputs.clear(),
            Outcome::Output(output) => self.outputs.push(output.clone()),
        }
        Some(outcome)
    }

    /// Walks towards older commands, stopping at the oldest.
    pub fn history_up(&mut self) -> String {
        if self.history.is_empty() {
            return String::new();
        }
        let next = match self.history_index {
            None => 0,
            Some(index) if index + 1 < self.history.len() => index + 1,
            Some(index) => index,
        };
        self.history_index = Some(next);
        self.history[self.history.len() - 1 - next].clone()
    }

    /// Walks back towards the prompt; past the newest command the input is empty.
    pub fn history_down(&mut self) -> String {
        match self.history_index {
            Some(index) if index > 0 => {
                self.history_index = Some(index - 1);
                self.history[self.history.len() - index].clone()
            }
            _ => {
                self.history_index = None;
                String::new()
            }
        }
    }

    pub fn view(&self, session_id: Uuid) -> TerminalView {
        TerminalView {
            session_id,
            theme: self.theme,
            history: self.history.clone(),
            outputs: self.outputs.clone(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Terminals keyed by the id handed to the client on its first command.
#[derive(Default)]
pub struct TerminalSessions {
    sessions: RwLock<HashMap<Uuid, Terminal>>,
}

impl TerminalSessions {
    /// Runs `change` on the session, opening a fresh one when `id` is absent or unknown.
    pub async fn with_session<R, F>(&self, id: Option<Uuid>, now: DateTime<Utc>, change: F) -> (Uuid, R)
    where
        F: FnOnce(&mut Terminal) -> R,
    {
        let mut sessions = self.sessions.write().await;
        purge_idle(&mut sessions, now);

        let id = id
            .filter(|id| sessions.contains_key(id))
            .unwrap_or_else(Uuid::new_v4);
        let terminal = sessions.entry(id).or_insert_with(|| Terminal::new(now));
        (id, change(terminal))
    }

    /// `None` when the session does not exist or has gone idle.
    pub async fn with_existing<R, F>(&self, id: Uuid, now: DateTime<Utc>, change: F) -> Option<R>
    where
        F: FnOnce(&mut Terminal) -> R,
    {
        let mut sessions = self.sessions.write().await;
        purge_idle(&mut sessions, now);

        let terminal = sessions.get_mut(&id)?;
        terminal.last_used = now;
        Some(change(terminal))
    }
}

fn purge_idle(sessions: &mut HashMap<Uuid, Terminal>, now: DateTime<Utc>) {
    let idle_limit = Duration::minutes(IDLE_LIMIT_MINUTES);
    sessions.retain(|_, terminal| now - terminal.last_used < idle_limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProfileLinks;

    fn profile() -> ProfileData {
        ProfileData {
            full_name: "John Developer".to_string(),
            title: "Full Stack Developer & CS Student".to_string(),
            bio: "I build web things.".to_string(),
            email: "john@example.com".to_string(),
            links: ProfileLinks {
                github: "github.com/johndeveloper".to_string(),
                linkedin: String::new(),
                twitter: String::new(),
                website: String::new(),
            },
            skills: vec!["Rust".to_string(), "React".to_string()],
            ..ProfileData::default()
        }
    }

    fn lines(outcome: Outcome) -> (Vec<String>, bool) {
        match outcome {
            Outcome::Output(output) => (output.lines, output.is_error),
            Outcome::Cleared => panic!("unexpected clear"),
        }
    }

    fn run(input: &str) -> (Vec<String>, bool) {
        let profile = profile();
        let ctx = TerminalContext {
            profile: &profile,
            projects: &[],
            now: Utc::now(),
        };
        let mut theme = Theme::Light;
        lines(run_command(input, &mut theme, &ctx))
    }

    #[test]
    fn help_lists_every_command() {
        let (lines, is_error) = run("help");

        assert!(!is_error);
        assert_eq!(lines.len(), HELP.len() + 1);
        assert!(lines.iter().any(|l| l.contains("whoami")));
    }

    #[test]
    fn command_word_is_case_insensitive() {
        assert_eq!(
            run("WHOAMI").0,
            vec!["John Developer - Full Stack Developer & CS Student"]
        );
    }

    #[test]
    fn echo_joins_arguments() {
        assert_eq!(run("echo  hello   world").0, vec!["hello world"]);
        assert_eq!(run("echo").0, vec![""]);
    }

    #[test]
    fn cat_known_and_unknown_files() {
        assert_eq!(
            run("cat contact.md").0,
            vec!["Email: john@example.com", "GitHub: github.com/johndeveloper"]
        );
        assert_eq!(run("cat notes.txt"), (vec!["File not found: notes.txt".to_string()], true));
        assert!(run("cat").1);
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert_eq!(
            run("sudo rm"),
            (
                vec!["Command not found: sudo. Type 'help' for available commands.".to_string()],
                true
            )
        );
    }

    #[test]
    fn skills_and_projects_read_live_data() {
        assert_eq!(run("skills").0, vec!["Rust, React"]);
        assert_eq!(run("projects").0, vec!["No projects yet."]);
    }

    #[test]
    fn theme_toggles_and_clear_empties_scrollback() {
        let profile = profile();
        let ctx = TerminalContext {
            profile: &profile,
            projects: &[],
            now: Utc::now(),
        };
        let mut terminal = Terminal::new(ctx.now);

        terminal.submit("theme", &ctx);
        assert_eq!(terminal.theme(), Theme::Dark);
        terminal.submit("theme", &ctx);
        assert_eq!(terminal.theme(), Theme::Light);
        assert_eq!(terminal.outputs.len(), 2);

        assert_eq!(terminal.submit("clear", &ctx), Some(Outcome::Cleared));
        assert!(terminal.outputs.is_empty());
    }

    #[test]
    fn blank_input_is_not_recorded() {
        let profile = profile();
        let ctx = TerminalContext {
            profile: &profile,
            projects: &[],
            now: Utc::now(),
        };
        let mut terminal = Terminal::new(ctx.now);

        assert_eq!(terminal.submit("   ", &ctx), None);
        assert_eq!(terminal.history_up(), "");
    }

    #[test]
    fn history_navigation() {
        let profile = profile();
        let ctx = TerminalContext {
            profile: &profile,
            projects: &[],
            now: Utc::now(),
        };
        let mut terminal = Terminal::new(ctx.now);
        for command in ["ls", "date", "whoami"] {
            terminal.submit(command, &ctx);
        }

        assert_eq!(terminal.history_up(), "whoami");
        assert_eq!(terminal.history_up(), "date");
        assert_eq!(terminal.history_up(), "ls");
        assert_eq!(terminal.history_up(), "ls");
        assert_eq!(terminal.history_down(), "date");
        assert_eq!(terminal.history_down(), "whoami");
        assert_eq!(terminal.history_down(), "");
        assert_eq!(terminal.history_down(), "");

        // A new command resets navigation to the prompt.
        terminal.history_up();
        terminal.submit("help", &ctx);
        assert_eq!(terminal.history_up(), "help");
    }

    #[actix_web::test]
    async fn unknown_session_id_opens_a_new_one() {
        let sessions = TerminalSessions::default();
        let now = Utc::now();

        let (first, _) = sessions.with_session(None, now, |_| ()).await;
        let (same, _) = sessions.with_session(Some(first), now, |_| ()).await;
        let (other, _) = sessions.with_session(Some(Uuid::new_v4()), now, |_| ()).await;

        assert_eq!(first, same);
        assert_ne!(first, other);
    }

    #[actix_web::test]
    async fn idle_sessions_are_dropped() {
        let sessions = TerminalSessions::default();
        let start = Utc::now();
        let (id, _) = sessions.with_session(None, start, |_| ()).await;

        let later = start + Duration::minutes(IDLE_LIMIT_MINUTES + 1);
        let (renewed, _) = sessions.with_session(Some(id), later, |_| ()).await;

        assert_ne!(id, renewed);
        assert!(sessions.with_existing(id, later, |_| ()).await.is_none());
    }

    #[actix_web::test]
    async fn reading_a_session_keeps_it_alive() {
        let sessions = TerminalSessions::default();
        let start = Utc::now();
        let (id, _) = sessions.with_session(None, start, |_| ()).await;

        let step = Duration::minutes(IDLE_LIMIT_MINUTES - 10);
        assert!(sessions.with_existing(id, start + step, |_| ()).await.is_some());
        assert!(sessions.with_existing(id, start + step * 2, |_| ()).await.is_some());

        let idle = start + step * 2 + Duration::minutes(IDLE_LIMIT_MINUTES);
        assert!(sessions.with_existing(id, idle, |_| ()).await.is_none());
    }
}
