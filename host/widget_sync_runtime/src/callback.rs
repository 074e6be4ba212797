use crate::session_state::SessionState;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackArgs {
    pub args: Vec<Value>,
    pub kwargs: IndexMap<String, Value>,
}

pub type CallbackHandler = Box<dyn FnMut(&CallbackArgs, &mut SessionState) -> anyhow::Result<()>>;

pub struct CallbackBinding {
    handler: CallbackHandler,
    args: CallbackArgs,
}

impl CallbackBinding {
    pub fn new<F>(handler: F) -> Self
    where
        F: FnMut(&CallbackArgs, &mut SessionState) -> anyhow::Result<()> + 'static,
    {
        Self {
            handler: Box::new(handler),
            args: CallbackArgs::default(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn args(&self) -> &CallbackArgs {
        &self.args
    }

    pub fn invoke(mut self, state: &mut SessionState) -> anyhow::Result<()> {
        (self.handler)(&self.args, state)
    }
}

impl fmt::Debug for CallbackBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackBinding")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
