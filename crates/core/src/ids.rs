#![forbid(unsafe_code)]

/// Namespace isolating artifact names across independent projects and users.
///
/// A workspace id is a plain segment: it must not contain `.` because the
/// textual identifier grammar uses `.` to separate workspace from name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, WorkspaceIdError> {
        let value = value.into();
        validate_segment(&value).map_err(|err| match err {
            SegmentError::Empty => WorkspaceIdError::Empty,
            SegmentError::TooLong => WorkspaceIdError::TooLong,
            SegmentError::InvalidFirstChar => WorkspaceIdError::InvalidFirstChar,
            SegmentError::InvalidChar { ch, index } => WorkspaceIdError::InvalidChar { ch, index },
        })?;
        Ok(Self(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkspaceIdError {
    Empty,
    TooLong,
    InvalidFirstChar,
    InvalidChar { ch: char, index: usize },
}

impl WorkspaceIdError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "workspace must not be empty",
            Self::TooLong => "workspace is too long",
            Self::InvalidFirstChar => "workspace must start with an ascii letter or digit",
            Self::InvalidChar { .. } => "workspace may contain only ascii letters, digits, '_' and '-'",
        }
    }
}

/// The name half of an artifact identity, shared by stages, datasets and
/// workflows. Same alphabet as [`WorkspaceId`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, ArtifactNameError> {
        let value = value.into();
        validate_segment(&value).map_err(|err| match err {
            SegmentError::Empty => ArtifactNameError::Empty,
            SegmentError::TooLong => ArtifactNameError::TooLong,
            SegmentError::InvalidFirstChar => ArtifactNameError::InvalidFirstChar,
            SegmentError::InvalidChar { ch, index } => ArtifactNameError::InvalidChar { ch, index },
        })?;
        Ok(Self(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactNameError {
    Empty,
    TooLong,
    InvalidFirstChar,
    InvalidChar { ch: char, index: usize },
}

impl ArtifactNameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "name must not be empty",
            Self::TooLong => "name is too long",
            Self::InvalidFirstChar => "name must start with an ascii letter or digit",
            Self::InvalidChar { .. } => "name may contain only ascii letters, digits, '_' and '-'",
        }
    }
}

enum SegmentError {
    Empty,
    TooLong,
    InvalidFirstChar,
    InvalidChar { ch: char, index: usize },
}

fn validate_segment(value: &str) -> Result<(), SegmentError> {
    if value.is_empty() {
        return Err(SegmentError::Empty);
    }
    if value.len() > 128 {
        return Err(SegmentError::TooLong);
    }
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(SegmentError::Empty);
    };
    if !first.is_ascii_alphanumeric() {
        return Err(SegmentError::InvalidFirstChar);
    }
    for (index, ch) in value.chars().enumerate() {
        if index == 0 {
            continue;
        }
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-') {
            continue;
        }
        return Err(SegmentError::InvalidChar { ch, index });
    }
    Ok(())
}

/// Content-derived version of an artifact: the full SHA-256 digest of its
/// canonical semantic form, 64 lowercase hex characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VersionId(String);

pub const VERSION_ID_LEN: usize = 64;

impl VersionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Abbreviated digest for display, like a short git hash.
    pub fn short(&self) -> &str {
        &self.0[..7]
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, VersionIdError> {
        let value = value.into();
        validate_version_id(&value)?;
        Ok(Self(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionIdError {
    Empty,
    WrongLength,
    InvalidChar,
}

impl VersionIdError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "version must not be empty",
            Self::WrongLength => "version must be 64 hex characters",
            Self::InvalidChar => "version must contain only lowercase hex characters",
        }
    }
}

fn validate_version_id(value: &str) -> Result<(), VersionIdError> {
    if value.is_empty() {
        return Err(VersionIdError::Empty);
    }
    if value.len() != VERSION_ID_LEN {
        return Err(VersionIdError::WrongLength);
    }
    if !value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(VersionIdError::InvalidChar);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_id_validation() {
        assert_eq!(WorkspaceId::try_new("").unwrap_err(), WorkspaceIdError::Empty);
        assert_eq!(
            WorkspaceId::try_new("-lead").unwrap_err(),
            WorkspaceIdError::InvalidFirstChar
        );
        assert_eq!(
            WorkspaceId::try_new("a.b").unwrap_err(),
            WorkspaceIdError::InvalidChar { ch: '.', index: 1 }
        );
        assert!(WorkspaceId::try_new("team-nlp_2").is_ok());
    }

    #[test]
    fn artifact_name_validation() {
        assert_eq!(ArtifactName::try_new("").unwrap_err(), ArtifactNameError::Empty);
        assert_eq!(
            ArtifactName::try_new("clean@v1").unwrap_err(),
            ArtifactNameError::InvalidChar { ch: '@', index: 5 }
        );
        assert!(ArtifactName::try_new("text_clean").is_ok());
    }

    #[test]
    fn version_id_validation() {
        assert_eq!(VersionId::try_new("").unwrap_err(), VersionIdError::Empty);
        assert_eq!(
            VersionId::try_new("abc123").unwrap_err(),
            VersionIdError::WrongLength
        );
        let upper = "A".repeat(64);
        assert_eq!(VersionId::try_new(upper).unwrap_err(), VersionIdError::InvalidChar);
        let ok = "0123456789abcdef".repeat(4);
        let version = VersionId::try_new(ok).expect("valid version id");
        assert_eq!(version.short().len(), 7);
    }
}
