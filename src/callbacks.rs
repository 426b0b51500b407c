//! Callables that plugins, handlers and hooks are built from.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::host::Host;
use crate::value::Value;

/// Signature shared by plugins and deferred handlers.
///
/// The first argument is the calling context (`this`), the slice holds the
/// positional arguments.
pub type PluginFn = dyn Fn(&Host, &[Value]) -> Result<Value> + Send + Sync;

/// A shared, clonable function value.
///
/// Plugins passed to `use` and the deferred handlers they return are both
/// `Callable`s. A plugin that returns `Value::Function` (or a callable host)
/// registers that value as a deferred handler.
#[derive(Clone)]
pub struct Callable {
    func: Arc<PluginFn>,
}

impl Callable {
    /// Wrap a closure.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Host, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Wrap a closure that returns nothing useful.
    pub fn unit<F>(func: F) -> Self
    where
        F: Fn(&Host, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(move |this, args| func(this, args).map(|()| Value::null()))
    }

    /// Invoke with `this` bound to the given host.
    pub fn call(&self, this: &Host, args: &[Value]) -> Result<Value> {
        (self.func)(this, args)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({:p})", Arc::as_ptr(&self.func) as *const ())
    }
}

/// Pre-hook run before each plugin registered through `use`.
///
/// Receives the calling context and the per-call options. Whatever merging
/// happens is entirely up to the implementation.
pub trait MergeHook: Send + Sync {
    /// Fold `options` into `host` state.
    fn merge(&self, host: &Host, options: &Value) -> Result<()>;
}

impl<F> MergeHook for F
where
    F: Fn(&Host, &Value) -> Result<()> + Send + Sync,
{
    fn merge(&self, host: &Host, options: &Value) -> Result<()> {
        (self)(host, options)
    }
}

/// Shallow-merges object options into a property of the host.
///
/// Keys from the per-call options overwrite keys already present. Options
/// that are not JSON objects are ignored.
#[derive(Debug, Clone)]
pub struct ShallowMerge {
    key: String,
}

impl ShallowMerge {
    /// Merge into the `options` property.
    pub fn new() -> Self {
        Self::into_key("options")
    }

    /// Merge into a custom property.
    pub fn into_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for ShallowMerge {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeHook for ShallowMerge {
    fn merge(&self, host: &Host, options: &Value) -> Result<()> {
        let Some(incoming) = options.as_json().and_then(|v| v.as_object()) else {
            return Ok(());
        };

        let mut merged = host
            .get(&self.key)
            .and_then(|v| v.as_json().and_then(|j| j.as_object()).cloned())
            .unwrap_or_default();
        for (k, v) in incoming {
            merged.insert(k.clone(), v.clone());
        }

        tracing::trace!("Merged {} option(s) into '{}'", incoming.len(), self.key);
        host.set(&self.key, serde_json::Value::Object(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_callable_binds_this() {
        let host = Host::object();
        host.set("name", json!("app")).unwrap();

        let read_name = Callable::new(|this, _| Ok(this.get("name").unwrap_or_default()));
        let out = read_name.call(&host, &[]).unwrap();
        assert_eq!(out.as_json(), Some(&json!("app")));
    }

    #[test]
    fn test_callable_identity() {
        let a = Callable::unit(|_, _| Ok(()));
        let b = a.clone();
        let c = Callable::unit(|_, _| Ok(()));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_shallow_merge_overwrites_and_keeps() {
        let host = Host::object();
        host.set("options", json!({"foo": "bar", "n": 1})).unwrap();

        ShallowMerge::new()
            .merge(&host, &Value::from(json!({"n": 2, "xxx": "yyy"})))
            .unwrap();

        let options = host.get("options").unwrap();
        assert_eq!(
            options.as_json(),
            Some(&json!({"foo": "bar", "n": 2, "xxx": "yyy"}))
        );
    }

    #[test]
    fn test_shallow_merge_ignores_non_objects() {
        let host = Host::object();
        ShallowMerge::into_key("settings")
            .merge(&host, &Value::null())
            .unwrap();
        assert!(!host.has("settings"));
    }
}
