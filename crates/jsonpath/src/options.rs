//! Result options controlling how matched nodes are emitted.
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// A bitset of independent result flags.
///
/// ```
/// use sift_jsonpath::ResultOptions;
///
/// let opts: ResultOptions = "nodups|sort".parse().unwrap();
/// assert_eq!(opts, ResultOptions::NODUPS | ResultOptions::SORT);
/// assert!(!opts.contains(ResultOptions::PATH));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResultOptions(u8);

impl ResultOptions {
    /// Values in traversal order, duplicates kept.
    pub const NONE: Self = Self(0);
    /// Drop matches whose path was already emitted, keeping the first.
    pub const NODUPS: Self = Self(1);
    /// Order matches by their normalized path.
    pub const SORT: Self = Self(2);
    /// Emit normalized path strings instead of values.
    pub const PATH: Self = Self(4);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ResultOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ResultOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ResultOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::NODUPS, "nodups"),
            (Self::SORT, "sort"),
            (Self::PATH, "path"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown result option '{0}' (expected none, nodups, sort or path)")]
pub struct ParseOptionsError(pub String);

impl FromStr for ResultOptions {
    type Err = ParseOptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut options = Self::NONE;
        for part in s.split(['|', ',']).map(str::trim).filter(|p| !p.is_empty()) {
            options |= match part.to_ascii_lowercase().as_str() {
                "none" | "value" => Self::NONE,
                "nodups" => Self::NODUPS,
                "sort" => Self::SORT,
                "path" => Self::PATH,
                _ => return Err(ParseOptionsError(part.to_string())),
            };
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_compose() {
        let opts = ResultOptions::NODUPS | ResultOptions::PATH;
        assert!(opts.contains(ResultOptions::NODUPS));
        assert!(opts.contains(ResultOptions::PATH));
        assert!(!opts.contains(ResultOptions::SORT));
        assert!(ResultOptions::default().is_empty());
    }

    #[test]
    fn test_parse_and_display() {
        let opts: ResultOptions = "path, NODUPS".parse().unwrap();
        assert_eq!(opts.to_string(), "nodups|path");
        assert_eq!("".parse::<ResultOptions>().unwrap(), ResultOptions::NONE);
        assert_eq!(ResultOptions::NONE.to_string(), "none");
        assert!("fast".parse::<ResultOptions>().is_err());
    }
}
