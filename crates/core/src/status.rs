//! Status enums mapping to `TEXT` status columns.
//!
//! Each variant's string matches the `CHECK` constraint on the corresponding
//! column in the migrations.

macro_rules! define_text_status {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $val)] $variant ),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Value as stored in the database.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }

            /// Parse a stored value. Returns `None` for unknown values.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_text_status! {
    /// Lifecycle of one submission snapshot.
    SubmissionStatus {
        Submitted = "submitted",
        PendingConfirm = "pending_confirm",
        Confirmed = "confirmed",
    }
}

define_text_status! {
    /// Aggregate editorial status of a draft version.
    DraftStatus {
        Draft = "draft",
        Submitted = "submitted",
        PendingConfirm = "pending_confirm",
        Confirmed = "confirmed",
    }
}

impl From<SubmissionStatus> for DraftStatus {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::Submitted => Self::Submitted,
            SubmissionStatus::PendingConfirm => Self::PendingConfirm,
            SubmissionStatus::Confirmed => Self::Confirmed,
        }
    }
}

define_text_status! {
    /// Production-sync status of a draft version.
    SyncStatus {
        Idle = "idle",
        Running = "running",
        Synced = "synced",
        PendingConfirm = "pending_confirm",
        Failed = "failed",
    }
}

define_text_status! {
    /// Status of a sync job or module job.
    JobStatus {
        Running = "running",
        Success = "success",
        Failed = "failed",
        PendingConfirm = "pending_confirm",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

define_text_status! {
    /// Status of an editorial task row.
    TaskStatus {
        Open = "open",
        Submitted = "submitted",
        PendingConfirm = "pending_confirm",
        Confirmed = "confirmed",
    }
}

impl From<SubmissionStatus> for TaskStatus {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::Submitted => Self::Submitted,
            SubmissionStatus::PendingConfirm => Self::PendingConfirm,
            SubmissionStatus::Confirmed => Self::Confirmed,
        }
    }
}
