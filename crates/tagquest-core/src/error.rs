use std::fmt;

use crate::model::quest::{QuestGroup, QuestId, QuestStatus};

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    QuestNotFound,
    NotUndoable,
    EmptyChanges,
    EmptyNoteComment,
    InvalidAnswer,
    UnknownQuestType,
    DuplicateChange,
    AnswerMismatch,
    InvalidSplit,
    CorruptRecord,
    DatabaseFailure,
    StoreUnavailable,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::QuestNotFound => "E2001",
            Self::NotUndoable => "E2002",
            Self::EmptyChanges => "E2003",
            Self::EmptyNoteComment => "E2004",
            Self::InvalidAnswer => "E2005",
            Self::UnknownQuestType => "E2006",
            Self::DuplicateChange => "E2007",
            Self::AnswerMismatch => "E2008",
            Self::InvalidSplit => "E2009",
            Self::CorruptRecord => "E3001",
            Self::DatabaseFailure => "E5001",
            Self::StoreUnavailable => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::QuestNotFound => "Quest not found",
            Self::NotUndoable => "Quest cannot be undone",
            Self::EmptyChanges => "Answer produced no tag changes",
            Self::EmptyNoteComment => "Note answer has an empty comment",
            Self::InvalidAnswer => "Answer does not fit the quest type",
            Self::UnknownQuestType => "Unknown quest type",
            Self::DuplicateChange => "Tag changed twice in one answer",
            Self::AnswerMismatch => "Answer kind does not match quest group",
            Self::InvalidSplit => "Invalid way split",
            Self::CorruptRecord => "Corrupt stored record",
            Self::DatabaseFailure => "Database operation failed",
            Self::StoreUnavailable => "Store unavailable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `tq init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .tagquest/config.toml and retry."),
            Self::QuestNotFound => None,
            Self::NotUndoable => {
                Some("Only answered, hidden or closed quests can be undone.")
            }
            Self::EmptyChanges => Some("The quest type must change at least one tag."),
            Self::EmptyNoteComment => Some("Provide a non-empty comment."),
            Self::InvalidAnswer => Some("Check the answer shape the quest type expects."),
            Self::UnknownQuestType => Some("Register the quest type before answering."),
            Self::DuplicateChange => Some("Each answer may touch a tag key at most once."),
            Self::AnswerMismatch => Some("Use a note answer for note quests and tags for OSM quests."),
            Self::InvalidSplit => Some("Only ways can be split, at one position or more."),
            Self::CorruptRecord => Some("Re-import the affected quests and elements."),
            Self::DatabaseFailure => Some("Check disk space and write permissions."),
            Self::StoreUnavailable => Some("Restart the process; a writer panicked mid-update."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure inside a store facade.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("encode/decode stored payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("stored value is corrupt: {0}")]
    Corrupt(String),
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Machine-readable code associated with this store error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Sqlite(_) => ErrorCode::DatabaseFailure,
            Self::Payload(_) | Self::Corrupt(_) => ErrorCode::CorruptRecord,
            Self::Poisoned => ErrorCode::StoreUnavailable,
        }
    }
}

/// Error returned by [`crate::QuestController`] operations.
///
/// Routine races (quest gone, quest no longer new, element evicted, data
/// conflict) are not errors; they surface as `Ok(false)`. Everything here is
/// either a caller bug or a store failure.
#[derive(Debug, thiserror::Error)]
pub enum QuestError {
    #[error("quest {quest_id} is {status} and cannot be undone")]
    NotUndoable {
        quest_id: QuestId,
        status: QuestStatus,
    },
    #[error("quest {quest_id} ({quest_type}) was answered but the change set is empty")]
    EmptyChanges { quest_id: QuestId, quest_type: String },
    #[error("note quest {quest_id} was answered with an empty comment")]
    EmptyNoteComment { quest_id: QuestId },
    #[error("unknown quest type '{0}'")]
    UnknownQuestType(String),
    #[error("answer for quest type '{quest_type}' has the wrong shape: {source}")]
    InvalidAnswer {
        quest_type: String,
        source: serde_json::Error,
    },
    #[error("quest type '{quest_type}' changed tag '{key}' twice")]
    DuplicateChange { quest_type: String, key: String },
    #[error("{group} quest {quest_id} cannot take a {answer} answer")]
    AnswerMismatch {
        quest_id: QuestId,
        group: QuestGroup,
        answer: &'static str,
    },
    #[error("cannot split for quest {quest_id}: {reason}")]
    InvalidSplit {
        quest_id: QuestId,
        reason: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QuestError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotUndoable { .. } => ErrorCode::NotUndoable,
            Self::EmptyChanges { .. } => ErrorCode::EmptyChanges,
            Self::EmptyNoteComment { .. } => ErrorCode::EmptyNoteComment,
            Self::UnknownQuestType(_) => ErrorCode::UnknownQuestType,
            Self::InvalidAnswer { .. } => ErrorCode::InvalidAnswer,
            Self::DuplicateChange { .. } => ErrorCode::DuplicateChange,
            Self::AnswerMismatch { .. } => ErrorCode::AnswerMismatch,
            Self::InvalidSplit { .. } => ErrorCode::InvalidSplit,
            Self::Store(err) => err.code(),
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
