use crate::domain::Line;

/// Everything the connection engine reports to its consumers.
///
/// `Connect` and `Disconnect` have no wire form. The outbound queue only
/// carries [`Line`], so there is no way to hand either of them to the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect,
    Disconnect,
    Line(Line),
}

impl Event {
    pub fn as_line(&self) -> Option<&Line> {
        match self {
            Event::Line(line) => Some(line),
            _ => None,
        }
    }

    /// True when this is a line carrying `command`.
    pub fn is_command(&self, command: &str) -> bool {
        self.as_line().is_some_and(|l| l.command() == command)
    }
}

impl From<Line> for Event {
    fn from(line: Line) -> Self {
        Event::Line(line)
    }
}
