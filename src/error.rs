use thiserror::Error;

/// Failures while fetching or searching the device catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to fetch devices list: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("devices list request returned HTTP {status}")]
    Status { status: u16 },

    #[error("devices list is not a valid JSON array: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("entry for '{codename}' in devices list is malformed: {source}")]
    InvalidRecord {
        codename: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Device '{0}' not found in devices list")]
    NotFound(String),
}

/// Failures while publishing an announcement to the broadcast channel.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("button '{label}' has an invalid URL '{url}': {reason}")]
    InvalidUrl {
        label: String,
        url: String,
        reason: String,
    },

    #[error("Failed to send announcement: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Everything that can end a `/post` command without an announcement.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Please provide a device codename.\nUsage: /post <codename>")]
    Usage,

    #[error("You are not authorized to use this bot.\nYour ID: {caller_id}")]
    Unauthorized { caller_id: u64 },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Coarse classification of a [`PipelineError`], one per reply category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Authorization,
    Fetch,
    Parse,
    NotFound,
    Dispatch,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Usage => ErrorKind::Usage,
            PipelineError::Unauthorized { .. } => ErrorKind::Authorization,
            PipelineError::Catalog(CatalogError::Fetch(_) | CatalogError::Status { .. }) => {
                ErrorKind::Fetch
            }
            PipelineError::Catalog(
                CatalogError::Parse(_) | CatalogError::InvalidRecord { .. },
            ) => ErrorKind::Parse,
            PipelineError::Catalog(CatalogError::NotFound(_)) => ErrorKind::NotFound,
            PipelineError::Dispatch(_) => ErrorKind::Dispatch,
        }
    }

    /// Text sent back to the caller who issued the command.
    pub fn reply(&self) -> String {
        format!("❌ {}", self)
    }
}
