use std::fmt;
use std::str::FromStr;

use crate::error::{FsError, FsResult};

/// Parsed `open` mode string, e.g. `"r"`, `"r+b"`, `"at"`.
///
/// The first character is `r`, `w` or `a`. An optional `+` adds reading,
/// and for `r` also writing. An optional trailing `t` (the default) or `b`
/// selects text or binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenMode {
    pub reading: bool,
    pub writing: bool,
    pub truncate: bool,
    pub append: bool,
    pub text: bool,
}

impl OpenMode {
    pub fn parse(mode: &str) -> FsResult<Self> {
        let invalid = || FsError::InvalidMode(mode.to_string());

        let mut chars = mode.chars();
        let mut parsed = match chars.next() {
            Some('r') => Self {
                reading: true,
                writing: false,
                truncate: false,
                append: false,
                text: true,
            },
            Some('w') => Self {
                reading: false,
                writing: true,
                truncate: true,
                append: false,
                text: true,
            },
            Some('a') => Self {
                reading: false,
                writing: true,
                truncate: false,
                append: true,
                text: true,
            },
            _ => return Err(invalid()),
        };

        let mut rest = chars.as_str();
        if let Some(after) = rest.strip_prefix('+') {
            if parsed.reading {
                parsed.writing = true;
            }
            parsed.reading = true;
            rest = after;
        }
        parsed.text = match rest {
            "" | "t" => true,
            "b" => false,
            _ => return Err(invalid()),
        };
        Ok(parsed)
    }
}

impl Default for OpenMode {
    /// `"r"`: read-only text.
    fn default() -> Self {
        Self {
            reading: true,
            writing: false,
            truncate: false,
            append: false,
            text: true,
        }
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let primary = if self.truncate {
            'w'
        } else if self.append {
            'a'
        } else {
            'r'
        };
        let plus = if primary == 'r' { self.writing } else { self.reading };
        write!(f, "{primary}")?;
        if plus {
            write!(f, "+")?;
        }
        write!(f, "{}", if self.text { "t" } else { "b" })
    }
}
