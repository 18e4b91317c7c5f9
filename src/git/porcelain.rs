//! Parsers for git's line-oriented listings
//!
//! - `status --porcelain`: `XY <path>`
//! - `ls-files -v`: `<tag> <path>`
//! - plain path listings (`ls-files -i`)
//!
//! Paths git considers unusual come back C-quoted (`"a\tb"`, octal escapes
//! for non-ASCII bytes) and are unquoted here. Every listing is deduplicated
//! by path, first occurrence wins: unmerged files show up once per stage.

use std::collections::HashSet;

use crate::error::{GitError, Result};

/// One line of `git status --porcelain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Two-character `XY` code, e.g. `" M"` or `"??"`
    pub code: String,
    pub path: String,
}

/// One line of `git ls-files -v`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLine {
    /// Tag character; lower-case `h` means assume-unchanged
    pub tag: char,
    pub path: String,
}

impl IndexLine {
    pub fn is_assume_unchanged(&self) -> bool {
        self.tag == 'h'
    }
}

/// Parse `git status --porcelain` output
pub fn parse_status_listing(output: &str) -> Result<Vec<StatusLine>> {
    let mut entries = Vec::new();

    for line in output.lines().filter(|l| !l.is_empty()) {
        let (code, rest) = split_fixed(line, 2)
            .ok_or_else(|| GitError::UnexpectedOutput(format!("status line '{line}'")))?;

        let path = if code.contains(['R', 'C']) {
            // "R  old -> new": the new name is what lives in the tree
            rest.rsplit_once(" -> ").map_or(rest, |(_, new)| new)
        } else {
            rest
        };

        entries.push(StatusLine {
            code: code.to_string(),
            path: unquote_path(path),
        });
    }

    Ok(first_by_path(entries, |e| e.path.clone()))
}

/// Parse `git ls-files -v` output
pub fn parse_index_listing(output: &str) -> Result<Vec<IndexLine>> {
    let mut entries = Vec::new();

    for line in output.lines().filter(|l| !l.is_empty()) {
        let (tag, rest) = split_fixed(line, 1)
            .ok_or_else(|| GitError::UnexpectedOutput(format!("ls-files line '{line}'")))?;

        // split_fixed guarantees a single ASCII character
        let tag = tag.chars().next().unwrap_or(' ');

        entries.push(IndexLine {
            tag,
            path: unquote_path(rest),
        });
    }

    Ok(first_by_path(entries, |e| e.path.clone()))
}

/// Parse a listing of one path per line
pub fn parse_path_listing(output: &str) -> Vec<String> {
    let paths: Vec<String> = output
        .lines()
        .filter(|l| !l.is_empty())
        .map(unquote_path)
        .collect();
    first_by_path(paths, |p: &String| p.clone())
}

/// Split `"<width ASCII chars> <rest>"`, requiring a non-empty rest
fn split_fixed(line: &str, width: usize) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    if bytes.len() < width + 2 || bytes[width] != b' ' || !bytes[..width].is_ascii() {
        return None;
    }
    Some((&line[..width], &line[width + 1..]))
}

/// Keep the first element for each key, preserving order
pub fn first_by_path<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Undo git's C-style path quoting.
///
/// Unquoted input is returned as is.
pub fn unquote_path(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut iter = inner.bytes().peekable();

    while let Some(b) = iter.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match iter.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&next @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(next - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xff) as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_status_listing() {
        let output = " M src/lib.rs\n?? notes.txt\n!! target/\nA  new.rs\n";
        let entries = parse_status_listing(output).unwrap();
        assert_eq!(
            entries,
            vec![
                StatusLine { code: " M".into(), path: "src/lib.rs".into() },
                StatusLine { code: "??".into(), path: "notes.txt".into() },
                StatusLine { code: "!!".into(), path: "target/".into() },
                StatusLine { code: "A ".into(), path: "new.rs".into() },
            ]
        );
    }

    #[test]
    fn test_parse_status_listing_keeps_first_duplicate() {
        let output = "UU conflict.txt\nAA conflict.txt\n M other.txt\n";
        let entries = parse_status_listing(output).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, "UU");
        assert_eq!(entries[0].path, "conflict.txt");
    }

    #[test]
    fn test_parse_status_listing_rename_takes_new_name() {
        let entries = parse_status_listing("R  old.rs -> new.rs\n").unwrap();
        assert_eq!(entries[0].path, "new.rs");
        assert_eq!(entries[0].code, "R ");
    }

    #[test]
    fn test_parse_status_listing_rejects_garbage() {
        assert!(parse_status_listing("fatal").is_err());
        assert!(parse_status_listing("MMXfile").is_err());
    }

    #[test]
    fn test_parse_status_listing_unquotes() {
        let entries = parse_status_listing("?? \"with space.txt\"\n").unwrap();
        assert_eq!(entries[0].path, "with space.txt");
    }

    #[test]
    fn test_parse_index_listing() {
        let output = "H tracked.rs\nh frozen.cfg\nM conflict.txt\nM conflict.txt\n";
        let entries = parse_index_listing(output).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(!entries[0].is_assume_unchanged());
        assert!(entries[1].is_assume_unchanged());
        assert_eq!(entries[2].tag, 'M');
    }

    #[test]
    fn test_parse_path_listing() {
        let paths = parse_path_listing("a.log\nb.log\na.log\n\n");
        assert_eq!(paths, vec!["a.log".to_string(), "b.log".to_string()]);
    }

    #[test]
    fn test_unquote_path() {
        assert_eq!(unquote_path("plain.txt"), "plain.txt");
        assert_eq!(unquote_path("\"tab\\there\""), "tab\there");
        assert_eq!(unquote_path("\"quote\\\"d\""), "quote\"d");
        assert_eq!(unquote_path("\"back\\\\slash\""), "back\\slash");
        // "é" is 0xC3 0xA9
        assert_eq!(unquote_path("\"caf\\303\\251\""), "café");
    }
}
