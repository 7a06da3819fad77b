//! Error types for repository operations.
//!
//! Every variant carries an [`ErrorContext`] naming the operation and, when
//! known, the entity it failed on, so the warnings the services log can be
//! traced back to a row.

use std::fmt;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Where a repository failure happened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// Repository operation, e.g. `bulk_insert`.
    pub operation: Option<String>,
    /// Entity kind and id, e.g. `("travel_time", "42")`.
    pub entity: Option<(String, String)>,
    /// Whether repeating the call may succeed.
    pub retryable: bool,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.operation, &self.entity) {
            (None, None) => Ok(()),
            (Some(op), None) => write!(f, " (in {})", op),
            (None, Some((kind, id))) => write!(f, " ({} {})", kind, id),
            (Some(op), Some((kind, id))) => write!(f, " (in {}, {} {})", op, kind, id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    /// The store cannot be reached. Retryable.
    #[error("Store unavailable: {message}{context}")]
    Unavailable {
        message: String,
        context: ErrorContext,
    },

    #[error("Query failed: {message}{context}")]
    Query {
        message: String,
        context: ErrorContext,
    },

    #[error("Not found: {message}{context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// A `(route_id, time)` key already exists or repeats in a batch.
    #[error("Duplicate key: {message}{context}")]
    DuplicateKey {
        message: String,
        context: ErrorContext,
    },

    /// Commit or rollback failed; pending writes are in an unknown state.
    #[error("Transaction failed: {message}{context}")]
    Transaction {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            context: ErrorContext {
                retryable: true,
                ..Default::default()
            },
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::DuplicateKey {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Unavailable { context, .. }
            | Self::Query { context, .. }
            | Self::NotFound { context, .. }
            | Self::DuplicateKey { context, .. }
            | Self::Transaction { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Unavailable { context, .. }
            | Self::Query { context, .. }
            | Self::NotFound { context, .. }
            | Self::DuplicateKey { context, .. }
            | Self::Transaction { context, .. } => context,
        }
    }

    /// Record the repository operation that failed.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Record the entity the operation failed on.
    pub fn with_entity(mut self, entity: impl Into<String>, id: impl ToString) -> Self {
        self.context_mut().entity = Some((entity.into(), id.to_string()));
        self
    }
}
