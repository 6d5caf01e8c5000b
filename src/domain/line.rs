use std::fmt;

use thiserror::Error;

/// A single protocol line.
///
/// A `Line` can only be obtained from [`codec::parse`](crate::codec::parse)
/// or [`LineBuilder::consume`]. The command is always non-empty and
/// prefix/command/arguments are single words. Built lines also carry no CR
/// or LF and no argument starting with `:`, so they survive a trip over the
/// wire unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    prefix: String,
    command: String,
    arguments: Vec<String>,
    suffix: String,
}

impl Line {
    pub(crate) fn from_parts(
        prefix: String,
        command: String,
        arguments: Vec<String>,
        suffix: String,
    ) -> Self {
        Self {
            prefix,
            command,
            arguments,
            suffix,
        }
    }

    /// Shorthand for a builder with only a command and arguments set.
    pub fn new(command: &str, arguments: &[&str]) -> Result<Self, BuildError> {
        LineBuilder::new()
            .command(command)
            .args(arguments.iter().map(|a| a.to_string()).collect())
            .consume()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Nickname part of a `nick!ident@host` prefix.
    pub fn nick(&self) -> &str {
        nick_of(&self.prefix)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.prefix.is_empty() {
            write!(f, ":{} ", self.prefix)?;
        }
        write!(f, "{}", self.command)?;
        for arg in &self.arguments {
            write!(f, " {arg}")?;
        }
        if !self.suffix.is_empty() {
            write!(f, " :{}", self.suffix)?;
        }
        Ok(())
    }
}

/// Substring of `prefix` before the first `!`.
pub fn nick_of(prefix: &str) -> &str {
    prefix.split_once('!').map_or(prefix, |(nick, _)| nick)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("{0} must not contain any spaces")]
    NoSpacesAllowed(String),

    #[error("{0} must not contain any \\r or \\n")]
    NoNewlinesAllowed(String),

    #[error("a line must contain a non-empty, single-word command")]
    MissingCommand,

    #[error("{0} must not start with ':'")]
    LeadingColon(String),
}

/// Accumulates the fields of an outbound [`Line`].
///
/// ```
/// use chanfeed::domain::LineBuilder;
///
/// let line = LineBuilder::new()
///     .command("PRIVMSG")
///     .arg("#rust")
///     .suffix("hello there")
///     .consume()
///     .unwrap();
/// assert_eq!(line.to_string(), "PRIVMSG #rust :hello there");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LineBuilder {
    prefix: String,
    command: String,
    arguments: Vec<String>,
    suffix: String,
}

impl LineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.arguments = args;
        self
    }

    /// Replaces the arguments with `args` split on single spaces.
    pub fn args_from_str(mut self, args: &str) -> Self {
        self.arguments = args.split(' ').map(String::from).collect();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Strips CR and LF from every field, and spaces from the prefix and
    /// command. Applying it twice is the same as applying it once.
    pub fn sanitize(mut self) -> Self {
        self.prefix = strip(&self.prefix, &['\r', '\n', ' ']);
        self.command = strip(&self.command, &['\r', '\n', ' ']);
        for arg in &mut self.arguments {
            *arg = strip(arg, &['\r', '\n']);
        }
        self.suffix = strip(&self.suffix, &['\r', '\n']);
        self
    }

    /// Validates the accumulated fields and yields the finished line.
    pub fn consume(self) -> Result<Line, BuildError> {
        if self.prefix.contains(' ') {
            return Err(BuildError::NoSpacesAllowed("prefix".into()));
        }
        if has_newline(&self.prefix) {
            return Err(BuildError::NoNewlinesAllowed("prefix".into()));
        }
        for (i, arg) in self.arguments.iter().enumerate() {
            if arg.contains(' ') {
                return Err(BuildError::NoSpacesAllowed(format!("arg[{i}]")));
            }
            if has_newline(arg) {
                return Err(BuildError::NoNewlinesAllowed(format!("arg[{i}]")));
            }
            // would be read back as the suffix
            if arg.starts_with(':') {
                return Err(BuildError::LeadingColon(format!("arg[{i}]")));
            }
        }
        if self.command.is_empty() || self.command.contains(' ') {
            return Err(BuildError::MissingCommand);
        }
        if has_newline(&self.command) {
            return Err(BuildError::NoNewlinesAllowed("command".into()));
        }
        // would be read back as a prefix
        if self.prefix.is_empty() && self.command.starts_with(':') {
            return Err(BuildError::LeadingColon("command".into()));
        }
        if has_newline(&self.suffix) {
            return Err(BuildError::NoNewlinesAllowed("suffix".into()));
        }

        Ok(Line::from_parts(
            self.prefix,
            self.command,
            self.arguments,
            self.suffix,
        ))
    }
}

fn strip(value: &str, chars: &[char]) -> String {
    value.chars().filter(|c| !chars.contains(c)).collect()
}

fn has_newline(value: &str) -> bool {
    value.contains(['\r', '\n'])
}
