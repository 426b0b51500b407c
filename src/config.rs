//! Mixin configuration.

use std::fmt;
use std::sync::Arc;

use crate::callbacks::MergeHook;
use crate::error::Result;
use crate::host::Host;
use crate::value::Value;

/// Property name used for the handler stack when none is configured.
pub const DEFAULT_PROP: &str = "fns";

/// Configuration shared by `use` and `run` once installed.
#[derive(Clone)]
pub struct MixinConfig {
    /// Name of the handler stack on the host
    pub prop: String,

    /// Arguments passed to each plugin (empty = the calling context)
    ///
    /// A host listed in the params of its own mixin forms a reference cycle
    /// and is never freed.
    pub params: Vec<Value>,

    /// Pre-hook invoked before each plugin
    pub hook: Option<Arc<dyn MergeHook>>,
}

impl MixinConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self {
            prop: DEFAULT_PROP.to_string(),
            params: Vec::new(),
            hook: None,
        }
    }

    /// Set the handler stack property. Empty names keep the default.
    pub fn with_prop(mut self, prop: impl Into<String>) -> Self {
        let prop = prop.into();
        if !prop.is_empty() {
            self.prop = prop;
        }
        self
    }

    /// Replace the plugin arguments.
    pub fn with_params(mut self, params: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Append one plugin argument.
    pub fn with_param(mut self, param: impl Into<Value>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Set the pre-hook.
    pub fn with_hook(mut self, hook: impl MergeHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Set the pre-hook from a closure.
    pub fn with_hook_fn<F>(self, hook: F) -> Self
    where
        F: Fn(&Host, &Value) -> Result<()> + Send + Sync + 'static,
    {
        self.with_hook(hook)
    }

    /// Build from a loosely-typed JSON configuration.
    ///
    /// Non-objects yield the defaults. `prop` is honored only as a non-empty
    /// string. A falsy `params` means none, a scalar becomes a single
    /// argument, an array is taken as-is.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut config = Self::new();
        let Some(obj) = value.as_object() else {
            return config;
        };

        if let Some(prop) = obj.get("prop").and_then(|p| p.as_str()) {
            config = config.with_prop(prop);
        }

        config.params = match obj.get("params") {
            Some(p) if is_falsy(p) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items.iter().cloned().map(Value::from).collect(),
            Some(p) => vec![Value::from(p.clone())],
            None => Vec::new(),
        };

        config
    }
}

fn is_falsy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl Default for MixinConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MixinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinConfig")
            .field("prop", &self.prop)
            .field("params", &self.params)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
