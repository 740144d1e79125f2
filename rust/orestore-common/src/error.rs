use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn parse(offset: u64, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Parse {
                offset,
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn unknown_member(identifier: impl Into<String>) -> Error {
        Error(
            ErrorKind::UnknownMember {
                identifier: identifier.into(),
            }
            .into(),
        )
    }

    pub fn backward_seek(position: u64, target: u64) -> Error {
        Error(ErrorKind::BackwardSeek { position, target }.into())
    }

    pub fn unexpected_end_of_stream(position: u64, target: u64) -> Error {
        Error(ErrorKind::UnexpectedEndOfStream { position, target }.into())
    }

    pub fn short_read(offset: u64, expected: u64, actual: u64) -> Error {
        Error(
            ErrorKind::ShortRead {
                offset,
                expected,
                actual,
            }
            .into(),
        )
    }

    pub fn collection_not_found(collection: impl Into<String>) -> Error {
        Error(
            ErrorKind::CollectionNotFound {
                collection: collection.into(),
            }
            .into(),
        )
    }

    pub fn archive_unavailable(collection: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::ArchiveUnavailable {
                collection: collection.into(),
                source,
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Error {
        Error(
            ErrorKind::Json {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Returns `true` for failures confined to a single member record.
    ///
    /// During child assembly these are reported against the child and the
    /// traversal moves on to the next sibling; every other kind aborts the
    /// whole retrieval.
    pub fn is_member_scoped(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnknownMember { .. }
                | ErrorKind::BackwardSeek { .. }
                | ErrorKind::UnexpectedEndOfStream { .. }
                | ErrorKind::ShortRead { .. }
        )
    }

    /// Returns `true` when the requested collection or member does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnknownMember { .. } | ErrorKind::CollectionNotFound { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("malformed JSON at byte {offset}: {message}")]
    Parse { offset: u64, message: String },

    #[error("member '{identifier}' is not in the index")]
    UnknownMember { identifier: String },

    #[error("backward seek from {position} to {target}")]
    BackwardSeek { position: u64, target: u64 },

    #[error("end of stream at {position} before reaching {target}")]
    UnexpectedEndOfStream { position: u64, target: u64 },

    #[error("short read at {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: u64,
        actual: u64,
    },

    #[error("collection '{collection}' not found")]
    CollectionNotFound { collection: String },

    #[error("ORE map of '{collection}' is unavailable: {source}")]
    ArchiveUnavailable {
        collection: String,
        source: std::io::Error,
    },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("JSON error for '{context}': {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::json("", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_scoped_kinds() {
        assert!(Error::unknown_member("b").is_member_scoped());
        assert!(Error::backward_seek(10, 2).is_member_scoped());
        assert!(Error::unexpected_end_of_stream(5, 9).is_member_scoped());
        assert!(Error::short_read(0, 10, 4).is_member_scoped());
        assert!(!Error::parse(3, "unexpected ']'").is_member_scoped());
        assert!(!Error::collection_not_found("a").is_member_scoped());
    }

    #[test]
    fn test_not_found_kinds() {
        assert!(Error::unknown_member("b").is_not_found());
        assert!(Error::collection_not_found("a").is_not_found());
        let unavailable = Error::archive_unavailable(
            "a",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(!unavailable.is_not_found());
    }

    #[test]
    fn test_display() {
        let e = Error::backward_seek(120, 40);
        assert_eq!(e.to_string(), "backward seek from 120 to 40");
        assert!(matches!(
            e.into_kind(),
            ErrorKind::BackwardSeek {
                position: 120,
                target: 40
            }
        ));

        let e = Error::io("open a.json", std::io::Error::other("denied"));
        assert_eq!(e.to_string(), "IO error for 'open a.json': denied");
    }
}
