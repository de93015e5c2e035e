use std::fmt;
use std::str::FromStr;

/// Kind of periodic tick delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollKind {
    ShortPoll,
    LongPoll,
}

impl PollKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollKind::ShortPoll => "shortPoll",
            PollKind::LongPoll => "longPoll",
        }
    }
}

impl fmt::Display for PollKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("shortPoll") {
            Ok(PollKind::ShortPoll)
        } else if s.eq_ignore_ascii_case("longPoll") {
            Ok(PollKind::LongPoll)
        } else {
            Err(format!("unknown poll kind '{}'", s))
        }
    }
}
