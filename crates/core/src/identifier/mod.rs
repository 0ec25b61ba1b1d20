#![forbid(unsafe_code)]

//! Textual artifact identifier: `[workspace.]name[@version][[split]]`.
//!
//! The version slot accepts a tag alias (`v3`), the literals `latest` and
//! `HEAD`, a full or partial hex digest, or (in list queries only) a glob
//! pattern. The trailing bracket group selects a dataset split.

use crate::ids::VERSION_ID_LEN;

#[cfg(test)]
mod tests;

/// Symbolic or concrete version reference extracted from an identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionRef {
    /// Highest-numbered tag for the artifact.
    Latest,
    /// Alias of [`VersionRef::Latest`]; the unsaved working copy is never
    /// addressable by text, so `HEAD` resolves against tags as well.
    Head,
    /// Exact tag integer, written `v<N>`.
    Tag(u64),
    /// Full or partial lowercase hex digest, 1..=64 characters.
    Hex(String),
    /// Glob pattern over the version column; list queries only.
    Pattern(String),
}

/// Dataset split selector, the recognized values of the trailing
/// bracket group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Split {
    Train,
    Test,
    Val,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
            Self::Val => "val",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "train" => Some(Self::Train),
            "test" => Some(Self::Test),
            "val" => Some(Self::Val),
            _ => None,
        }
    }
}

/// Parsed identifier. `workspace` stays `None` when the text omitted it;
/// the caller substitutes the configured default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier {
    pub workspace: Option<String>,
    pub name: String,
    pub version: Option<VersionRef>,
    pub split: Option<Split>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    MissingName,
    InvalidWorkspace { ch: char },
    InvalidName { ch: char },
    EmptyVersion,
    InvalidVersion { token: String },
    /// Both an explicit version argument and an embedded `@version`.
    DuplicateVersion,
    UnknownSplit { token: String },
    PatternNotAllowed,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "identifier must not be empty"),
            Self::MissingName => write!(f, "identifier must contain a name"),
            Self::InvalidWorkspace { ch } => {
                write!(f, "workspace contains invalid character {ch:?}")
            }
            Self::InvalidName { ch } => write!(f, "name contains invalid character {ch:?}"),
            Self::EmptyVersion => write!(f, "version after '@' must not be empty"),
            Self::InvalidVersion { token } => write!(f, "unrecognized version {token:?}"),
            Self::DuplicateVersion => {
                write!(f, "version given both as argument and embedded '@version'")
            }
            Self::UnknownSplit { token } => {
                write!(f, "unknown split {token:?} (expected train, test or val)")
            }
            Self::PatternNotAllowed => write!(f, "glob pattern is not allowed here"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Single-record lookup: globs are rejected.
    Get,
    /// Listing: globs are allowed in name and version.
    List,
}

/// Parse an identifier for a single-record lookup. `explicit_version` is
/// the separately supplied version argument; combining it with an embedded
/// `@version` is an error.
pub fn parse_get(text: &str, explicit_version: Option<&str>) -> Result<Identifier, ParseError> {
    let mut identifier = parse(text, Mode::Get)?;
    if let Some(raw) = explicit_version {
        if identifier.version.is_some() {
            return Err(ParseError::DuplicateVersion);
        }
        identifier.version = Some(classify_version(raw.trim(), Mode::Get)?);
    }
    Ok(identifier)
}

/// Parse an identifier for a list query; `*` and `?` wildcards and glob
/// classes are permitted in name and version.
pub fn parse_list(text: &str) -> Result<Identifier, ParseError> {
    parse(text, Mode::List)
}

fn parse(text: &str, mode: Mode) -> Result<Identifier, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let (text, split) = strip_split(text, mode)?;

    let (name_part, version) = match text.split_once('@') {
        Some((head, raw)) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(ParseError::EmptyVersion);
            }
            (head, Some(classify_version(raw, mode)?))
        }
        None => (text, None),
    };

    let (workspace, name) = match name_part.split_once('.') {
        Some((workspace, name)) => (Some(workspace), name),
        None => (None, name_part),
    };

    if let Some(workspace) = workspace {
        if workspace.is_empty() {
            return Err(ParseError::MissingName);
        }
        if let Some(ch) = first_invalid_segment_char(workspace) {
            return Err(ParseError::InvalidWorkspace { ch });
        }
    }

    if name.is_empty() {
        return Err(ParseError::MissingName);
    }
    match mode {
        Mode::Get => {
            if let Some(ch) = first_invalid_segment_char(name) {
                return Err(ParseError::InvalidName { ch });
            }
        }
        Mode::List => {
            if let Some(ch) = first_invalid_pattern_char(name) {
                return Err(ParseError::InvalidName { ch });
            }
        }
    }

    Ok(Identifier {
        workspace: workspace.map(str::to_string),
        name: name.to_string(),
        version,
        split,
    })
}

/// Strip a trailing `[split]` selector. In list mode a trailing bracket
/// group that is not a recognized split stays in the pattern (it may be a
/// glob class); in get mode it is an error.
fn strip_split(text: &str, mode: Mode) -> Result<(&str, Option<Split>), ParseError> {
    if !text.ends_with(']') {
        return Ok((text, None));
    }
    let Some(open) = text.rfind('[') else {
        return Ok((text, None));
    };
    let token = &text[open + 1..text.len() - 1];
    match Split::parse(token) {
        Some(split) => Ok((&text[..open], Some(split))),
        None => match mode {
            Mode::List => Ok((text, None)),
            Mode::Get => Err(ParseError::UnknownSplit {
                token: token.to_string(),
            }),
        },
    }
}

fn classify_version(raw: &str, mode: Mode) -> Result<VersionRef, ParseError> {
    if raw == "latest" {
        return Ok(VersionRef::Latest);
    }
    if raw == "HEAD" {
        return Ok(VersionRef::Head);
    }
    if let Some(digits) = raw.strip_prefix('v') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            let number = digits
                .parse::<u64>()
                .map_err(|_| ParseError::InvalidVersion {
                    token: raw.to_string(),
                })?;
            return Ok(VersionRef::Tag(number));
        }
    }
    if is_glob(raw) {
        return match mode {
            Mode::List => Ok(VersionRef::Pattern(raw.to_string())),
            Mode::Get => Err(ParseError::PatternNotAllowed),
        };
    }
    let lowered = raw.to_ascii_lowercase();
    if lowered.len() <= VERSION_ID_LEN
        && lowered.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return Ok(VersionRef::Hex(lowered));
    }
    Err(ParseError::InvalidVersion {
        token: raw.to_string(),
    })
}

fn is_glob(raw: &str) -> bool {
    raw.contains('*') || raw.contains('?') || raw.contains('[')
}

fn first_invalid_segment_char(value: &str) -> Option<char> {
    value
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && !matches!(ch, '_' | '-'))
}

fn first_invalid_pattern_char(value: &str) -> Option<char> {
    value.chars().find(|ch| {
        !ch.is_ascii_alphanumeric() && !matches!(ch, '_' | '-' | '*' | '?' | '[' | ']' | '!')
    })
}
