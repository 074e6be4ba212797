use crate::identity::WidgetId;
use crate::value::WireKind;

pub type WidgetResult<T> = Result<T, WidgetError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateWidgetKey,
    IncompatibleWithForm,
    MissingFormContext,
    ConflictingWidgetState,
    CodecMismatch,
    InvalidArgument,
    Callback,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::DuplicateWidgetKey => "duplicate_widget_key",
            ErrorKind::IncompatibleWithForm => "incompatible_with_form",
            ErrorKind::MissingFormContext => "missing_form_context",
            ErrorKind::ConflictingWidgetState => "conflicting_widget_state",
            ErrorKind::CodecMismatch => "codec_mismatch",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Callback => "callback_error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("multiple widgets share the key '{key}'; keys must be unique within one run")]
    DuplicateWidgetKey { key: String },

    #[error("`{widget}` can't be used inside a form: {reason}")]
    IncompatibleWithForm { widget: String, reason: String },

    #[error("`{widget}` must be used inside a form")]
    MissingFormContext { widget: String },

    #[error("widget state for key '{key}' has conflicting writers: {reason}")]
    ConflictingWidgetState { key: String, reason: String },

    #[error("stored value for {id} can't be decoded as `{type_tag}`: {source}")]
    CodecMismatch {
        id: WidgetId,
        type_tag: String,
        #[source]
        source: CodecError,
    },

    #[error("invalid argument to `{widget}`: {reason}")]
    InvalidArgument { widget: String, reason: String },

    #[error(transparent)]
    Callback(anyhow::Error),
}

impl WidgetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WidgetError::DuplicateWidgetKey { .. } => ErrorKind::DuplicateWidgetKey,
            WidgetError::IncompatibleWithForm { .. } => ErrorKind::IncompatibleWithForm,
            WidgetError::MissingFormContext { .. } => ErrorKind::MissingFormContext,
            WidgetError::ConflictingWidgetState { .. } => ErrorKind::ConflictingWidgetState,
            WidgetError::CodecMismatch { .. } => ErrorKind::CodecMismatch,
            WidgetError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            WidgetError::Callback(_) => ErrorKind::Callback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("expected {expected} wire value, got {found}")]
    UnexpectedKind { expected: WireKind, found: WireKind },

    #[error("index {index} is out of range for {len} options")]
    OptionOutOfRange { index: i64, len: usize },

    #[error("text of {len} chars exceeds the limit of {max}")]
    TooLong { len: usize, max: usize },

    #[error("number {0} is not finite")]
    NotFinite(f64),
}

/// Why a rerun stopped before reaching the end of the script.
#[derive(Debug, thiserror::Error)]
pub enum RerunError {
    #[error(transparent)]
    Widget(#[from] WidgetError),

    #[error("rerun superseded by newer client input")]
    Cancelled,

    #[error("script error: {0}")]
    Script(#[from] anyhow::Error),
}

impl RerunError {
    pub fn code(&self) -> &'static str {
        match self {
            RerunError::Widget(err) => err.kind().code(),
            RerunError::Cancelled => "rerun_cancelled",
            RerunError::Script(_) => "script_error",
        }
    }
}
