use thiserror::Error;

/// Validation failures raised before anything is written to the store.
///
/// The display strings are shown inline to the user, so they read as
/// sentences rather than diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter a display name.")]
    MissingDisplayName,

    #[error("Please select your university.")]
    MissingUniversity,

    #[error("\"{0}\" is not in the university list. Pick one of the suggestions.")]
    UnconfirmedUniversity(String),

    #[error("\"{0}\" is not in the majors list.")]
    UnknownMajor(String),

    #[error("Your second major must differ from the first.")]
    DuplicateMajor,

    #[error("Task title cannot be empty.")]
    EmptyTaskTitle,

    #[error("A study session must last at least one minute.")]
    ZeroDuration,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("A profile already exists for {0}")]
    ProfileExists(String),

    #[error("No profile found for {0}")]
    ProfileMissing(String),

    #[error("No open task with id {0}")]
    TaskNotFound(u64),
}
