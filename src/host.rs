//! Hosts: the objects and functions the mixin is installed onto.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use crate::callbacks::Callable;
use crate::config::MixinConfig;
use crate::error::{MixinError, Result};
use crate::mixin::{install, Mixin};
use crate::stack::{HandlerStack, StackTable};
use crate::state::{Capabilities, MethodKind, MixinState};
use crate::value::Value;

/// Shape of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Plain record
    Object,
    /// Callable record
    Function,
}

/// Occupant of a `use` or `run` slot.
#[derive(Clone)]
pub enum Method {
    /// Behavior attached by [`install`]
    Mixin(Arc<Mixin>),
    /// Client-defined function
    Custom(Callable),
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Mixin(m) => write!(f, "Mixin({:?})", m.config().prop),
            Method::Custom(c) => write!(f, "Custom({c:?})"),
        }
    }
}

#[derive(Default)]
struct MethodSlots {
    use_: Option<Method>,
    run: Option<Method>,
}

impl MethodSlots {
    fn get(&self, kind: MethodKind) -> Option<&Method> {
        match kind {
            MethodKind::Use => self.use_.as_ref(),
            MethodKind::Run => self.run.as_ref(),
        }
    }

    fn slot(&mut self, kind: MethodKind) -> &mut Option<Method> {
        match kind {
            MethodKind::Use => &mut self.use_,
            MethodKind::Run => &mut self.run,
        }
    }
}

struct HostInner {
    callable: Option<Callable>,
    props: RwLock<HashMap<String, Value>>,
    stacks: StackTable,
    methods: RwLock<MethodSlots>,
}

/// Shared handle to a host.
///
/// Clones refer to the same host; mutation through any clone is visible
/// through all of them.
#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
}

/// Non-owning handle, held by installed mixins.
#[derive(Clone)]
pub struct WeakHost {
    inner: Weak<HostInner>,
}

impl WeakHost {
    pub fn upgrade(&self) -> Option<Host> {
        self.inner.upgrade().map(|inner| Host { inner })
    }
}

impl Host {
    fn with_parts(callable: Option<Callable>, props: HashMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(HostInner {
                callable,
                props: RwLock::new(props),
                stacks: StackTable::new(),
                methods: RwLock::new(MethodSlots::default()),
            }),
        }
    }

    /// Create an empty object host.
    pub fn object() -> Self {
        Self::with_parts(None, HashMap::new())
    }

    /// Create a callable host.
    pub fn function(callable: Callable) -> Self {
        Self::with_parts(Some(callable), HashMap::new())
    }

    /// Create an object host whose properties come from a JSON object.
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let props = map.into_iter().map(|(k, v)| (k, Value::Data(v))).collect();
        Self::with_parts(None, props)
    }

    pub fn kind(&self) -> HostKind {
        if self.inner.callable.is_some() {
            HostKind::Function
        } else {
            HostKind::Object
        }
    }

    /// The function behind a callable host.
    pub fn callable(&self) -> Option<Callable> {
        self.inner.callable.clone()
    }

    /// Invoke a callable host with `this` bound to itself.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let callable = self
            .callable()
            .ok_or_else(|| MixinError::InvalidArgument("host is not callable".into()))?;
        callable.call(self, args)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Host) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakHost {
        WeakHost {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // === Properties ===

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.props.read().ok()?.get(key).cloned()
    }

    /// Set a property value.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.inner
            .props
            .write()
            .map_err(|_| MixinError::LockPoisoned("host properties".into()))?
            .insert(key.to_string(), value.into());
        Ok(())
    }

    /// Check if a property is set.
    pub fn has(&self, key: &str) -> bool {
        self.inner
            .props
            .read()
            .map(|p| p.contains_key(key))
            .unwrap_or(false)
    }

    // === Handler stacks ===

    /// Handler stack registered under `prop`.
    pub fn stack(&self, prop: &str) -> Option<HandlerStack> {
        self.inner.stacks.get(prop)
    }

    pub(crate) fn stacks(&self) -> &StackTable {
        &self.inner.stacks
    }

    // === Methods ===

    /// Current occupant of a method slot, or `None` if the lock is poisoned.
    pub fn method(&self, kind: MethodKind) -> Option<Method> {
        self.try_method(kind).ok().flatten()
    }

    fn try_method(&self, kind: MethodKind) -> Result<Option<Method>> {
        Ok(self
            .inner
            .methods
            .read()
            .map_err(|_| MixinError::LockPoisoned("host methods".into()))?
            .get(kind)
            .cloned())
    }

    /// Attach a client-defined `use` or `run`.
    pub fn define_method(&self, kind: MethodKind, method: Callable) -> Result<()> {
        self.set_method(kind, Method::Custom(method))
    }

    fn set_method(&self, kind: MethodKind, method: Method) -> Result<()> {
        let mut methods = self
            .inner
            .methods
            .write()
            .map_err(|_| MixinError::LockPoisoned("host methods".into()))?;
        *methods.slot(kind) = Some(method);
        Ok(())
    }

    pub(crate) fn attach_mixin(&self, mixin: Arc<Mixin>) -> Result<()> {
        self.set_method(MethodKind::Use, Method::Mixin(mixin.clone()))?;
        self.set_method(MethodKind::Run, Method::Mixin(mixin))
    }

    /// Which of `use` / `run` this host exposes.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_use: self.method(MethodKind::Use).is_some(),
            has_run: self.method(MethodKind::Run).is_some(),
        }
    }

    /// The installed mixin, if either slot holds one.
    pub fn mixin(&self) -> Option<Arc<Mixin>> {
        [MethodKind::Use, MethodKind::Run]
            .into_iter()
            .find_map(|kind| match self.method(kind) {
                Some(Method::Mixin(m)) => Some(m),
                _ => None,
            })
    }

    pub fn state(&self) -> MixinState {
        if self.mixin().is_some() {
            MixinState::Installed
        } else {
            MixinState::Uninstalled
        }
    }

    // === Mixin entry points ===

    /// Install the mixin onto this host.
    pub fn install(&self, config: MixinConfig) -> Result<Host> {
        install(self.clone(), config)
    }

    /// Register a plugin through this host's `use` slot.
    pub fn use_plugin(&self, plugin: impl Into<Value>, options: impl Into<Value>) -> Result<Host> {
        let plugin = plugin.into();
        let options = options.into();

        match self.try_method(MethodKind::Use)? {
            Some(Method::Mixin(mixin)) => mixin.use_plugin(Some(self), &plugin, &options),
            Some(Method::Custom(custom)) => {
                custom.call(self, &[plugin, options])?;
                Ok(self.clone())
            }
            None => Err(MixinError::MissingMethod(MethodKind::Use.to_string())),
        }
    }

    /// Register a closure as a plugin with no options.
    pub fn use_fn<F>(&self, plugin: F) -> Result<Host>
    where
        F: Fn(&Host, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.use_plugin(Callable::new(plugin), Value::null())
    }

    /// Replay deferred handlers through this host's `run` slot.
    pub fn run(&self, args: &[Value]) -> Result<Host> {
        match self.try_method(MethodKind::Run)? {
            Some(Method::Mixin(mixin)) => mixin.run(Some(self), args),
            Some(Method::Custom(custom)) => {
                custom.call(self, args)?;
                Ok(self.clone())
            }
            None => Err(MixinError::MissingMethod(MethodKind::Run.to_string())),
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host({:?}@{:p})", self.kind(), Arc::as_ptr(&self.inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_properties() {
        let host = Host::object();
        host.set("foo", "bar").unwrap();
        host.set("n", 1).unwrap();

        assert!(host.has("foo"));
        assert_eq!(host.get("foo"), Some(Value::from("bar")));
        assert_eq!(host.get("n"), Some(Value::from(1)));
        assert!(host.get("missing").is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let host = Host::object();
        let alias = host.clone();
        alias.set("shared", true).unwrap();

        assert!(host.ptr_eq(&alias));
        assert_eq!(host.get("shared"), Some(Value::from(true)));
    }

    #[test]
    fn test_from_map() {
        let serde_json::Value::Object(map) = json!({"foo": "bar", "n": 2}) else {
            unreachable!()
        };
        let host = Host::from_map(map);

        assert_eq!(host.kind(), HostKind::Object);
        assert_eq!(host.get("foo"), Some(Value::from("bar")));
        assert_eq!(host.get("n"), Some(Value::from(2)));
    }

    #[test]
    fn test_function_host_calls_with_itself() {
        let host = Host::function(Callable::new(|this, args| {
            this.set("last", args[0].clone())?;
            Ok(Value::from("done"))
        }));

        assert_eq!(host.kind(), HostKind::Function);
        let out = host.call(&[Value::from(7)]).unwrap();
        assert_eq!(out, Value::from("done"));
        assert_eq!(host.get("last"), Some(Value::from(7)));

        assert!(Host::object().call(&[]).is_err());
    }

    #[test]
    fn test_weak_handle() {
        let host = Host::object();
        let weak = host.downgrade();
        assert!(weak.upgrade().unwrap().ptr_eq(&host));

        drop(host);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_uninstalled_host() {
        let host = Host::object();
        assert_eq!(host.state(), MixinState::Uninstalled);
        assert!(!host.capabilities().is_extensible());
        assert!(host.stack("fns").is_none());

        let err = host.run(&[]).unwrap_err();
        assert!(matches!(err, MixinError::MissingMethod(ref m) if m == "run"));
        let err = host.use_fn(|_, _| Ok(Value::null())).unwrap_err();
        assert!(matches!(err, MixinError::MissingMethod(ref m) if m == "use"));
    }

    #[test]
    fn test_poisoned_methods_report_error() {
        let host = Host::object();
        host.define_method(MethodKind::Run, Callable::unit(|_, _| Ok(())))
            .unwrap();

        let inner = host.inner.clone();
        let _ = std::thread::spawn(move || {
            let _guard = inner.methods.write().unwrap();
            panic!("poisoning host methods");
        })
        .join();

        let err = host.run(&[]).unwrap_err();
        assert!(matches!(err, MixinError::LockPoisoned(ref what) if what == "host methods"));
        let err = host.use_fn(|_, _| Ok(Value::null())).unwrap_err();
        assert!(matches!(err, MixinError::LockPoisoned(_)));
    }

    #[test]
    fn test_custom_methods_dispatch() {
        let host = Host::object();
        host.define_method(
            MethodKind::Use,
            Callable::new(|this, args| {
                let plugin = args[0].as_callable().expect("plugin");
                plugin.call(this, &[Value::from(this)])
            }),
        )
        .unwrap();
        host.define_method(
            MethodKind::Run,
            Callable::unit(|this, _| this.set("ran", true)),
        )
        .unwrap();

        assert!(host.capabilities().is_extensible());
        assert_eq!(host.state(), MixinState::Uninstalled);

        host.use_fn(|this, _| {
            this.set("used", true)?;
            Ok(Value::null())
        })
        .unwrap()
        .run(&[])
        .unwrap();

        assert_eq!(host.get("used"), Some(Value::from(true)));
        assert_eq!(host.get("ran"), Some(Value::from(true)));
    }
}
