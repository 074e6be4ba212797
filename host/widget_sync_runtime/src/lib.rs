//! Widget state synchronization for re-executed scripts.
//!
//! Every rerun of a script declares its widgets through a [`ScriptContext`].
//! Each declaration is reconciled against the session's [`WidgetStateStore`]:
//! a pending client value wins over the last committed value, which wins over
//! the script default. Change callbacks run inline, in declaration order, and
//! widgets inside a form hold theirs back until the form is submitted.

pub mod callback;
pub mod codec;
pub mod context;
pub mod elements;
pub mod engine;
pub mod error;
pub mod form;
pub mod host;
pub mod identity;
pub mod protocol;
pub mod rules;
pub mod session;
pub mod session_state;
pub mod store;
pub mod value;

pub use crate::callback::{CallbackArgs, CallbackBinding};
pub use crate::codec::WidgetCodec;
pub use crate::context::ScriptContext;
pub use crate::elements::{DownloadData, ElementDescription, WidgetOptions};
pub use crate::engine::{Registered, RegistrationEngine, WidgetRegistration};
pub use crate::error::{CodecError, ErrorKind, RerunError, WidgetError, WidgetResult};
pub use crate::form::{FormRole, GroupContext};
pub use crate::host::{App, HostConfig, run};
pub use crate::identity::WidgetId;
pub use crate::session::{CancelToken, RerunAborted, RerunOutcome, Session, SessionConfig};
pub use crate::session_state::SessionState;
pub use crate::store::{PendingUpdate, WidgetEntry, WidgetStateStore};
pub use crate::value::{Origin, WireValue};
pub use serde_json;
