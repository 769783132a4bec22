//! Output-redirect suffix: `command >>>target`.

use std::sync::LazyLock;

use regex::Regex;

// Target charsets: bare, single-quoted (adds space), double-quoted (adds
// space and `'`). Whitespace may surround the target.
static REDIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)^(.*)>>>[ \t]*(?:([a-zA-Z0-9./\\:_-]+)|'([a-zA-Z0-9./\\:_ -]+)'|"([a-zA-Z0-9./\\:_ '-]+)")[ \t]*$"#,
    )
    .expect("redirect pattern is valid")
});

/// A line split into the command to run and the file receiving its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect<'a> {
    /// Everything before `>>>`, verbatim.
    pub command: &'a str,
    /// Destination path, without quotes.
    pub target: &'a str,
}

impl<'a> Redirect<'a> {
    /// Parse a redirected line.
    ///
    /// Returns `None` for lines without a well-formed suffix; those are
    /// dispatched verbatim.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = REDIRECT.captures(line)?;
        let command = caps.get(1)?.as_str();
        let target = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
        Some(Self {
            command,
            target: target.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_target() {
        assert_eq!(
            Redirect::parse("foo.bar() >>> out.txt"),
            Some(Redirect {
                command: "foo.bar() ",
                target: "out.txt"
            })
        );
        assert_eq!(
            Redirect::parse("x>>>C:\\tmp\\x.json"),
            Some(Redirect {
                command: "x",
                target: "C:\\tmp\\x.json"
            })
        );
    }

    #[test]
    fn test_quoted_targets() {
        assert_eq!(
            Redirect::parse("foo >>> 'a b.txt'"),
            Some(Redirect {
                command: "foo ",
                target: "a b.txt"
            })
        );
        assert_eq!(
            Redirect::parse(r#"foo >>>"it's here.txt""#),
            Some(Redirect {
                command: "foo ",
                target: "it's here.txt"
            })
        );
    }

    #[test]
    fn test_last_marker_wins() {
        assert_eq!(
            Redirect::parse("'a>>>b' >>>out"),
            Some(Redirect {
                command: "'a>>>b' ",
                target: "out"
            })
        );
    }

    #[test]
    fn test_not_redirected() {
        assert_eq!(Redirect::parse("foo"), None);
        assert_eq!(Redirect::parse("foo >>>"), None);
        assert_eq!(Redirect::parse("foo >>> 'unterminated"), None);
        assert_eq!(Redirect::parse("foo >>> a b"), None);
        assert_eq!(Redirect::parse(r#"foo >>> 'it's'"#), None);
    }
}
