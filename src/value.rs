//! Dynamic values passed between hosts, plugins and handlers.

use std::fmt;

use crate::callbacks::Callable;
use crate::host::{Host, HostKind};

/// Any value a plugin can receive or return.
#[derive(Clone)]
pub enum Value {
    /// Inert data, compared and cloned by value
    Data(serde_json::Value),
    /// An object or callable host, shared by identity
    Host(Host),
    /// A bare function
    Function(Callable),
}

impl Value {
    /// `null`.
    pub fn null() -> Self {
        Value::Data(serde_json::Value::Null)
    }

    /// Borrow the JSON payload, if this is data.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the host, if this is one.
    pub fn as_host(&self) -> Option<&Host> {
        match self {
            Value::Host(h) => Some(h),
            _ => None,
        }
    }

    /// Callable view: bare functions and function hosts.
    pub fn as_callable(&self) -> Option<Callable> {
        match self {
            Value::Function(f) => Some(f.clone()),
            Value::Host(h) => h.callable(),
            Value::Data(_) => None,
        }
    }

    /// Whether `as_callable` would succeed.
    pub fn is_callable(&self) -> bool {
        match self {
            Value::Function(_) => true,
            Value::Host(h) => h.kind() == HostKind::Function,
            Value::Data(_) => false,
        }
    }

    /// Object hosts only. Function hosts and JSON data are not objects here.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Host(h) if h.kind() == HostKind::Object)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Data(v) => write!(f, "Data({v})"),
            Value::Host(h) => write!(f, "{h:?}"),
            Value::Function(c) => write!(f, "{c:?}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Data(v)
    }
}

impl From<Host> for Value {
    fn from(h: Host) -> Self {
        Value::Host(h)
    }
}

impl From<&Host> for Value {
    fn from(h: &Host) -> Self {
        Value::Host(h.clone())
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Value::Function(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Data(serde_json::Value::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Data(serde_json::Value::from(s))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Data(serde_json::Value::from(b))
    }
}
