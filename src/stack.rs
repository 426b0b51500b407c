//! Handler stacks and the per-host side table that owns them.
//!
//! Each host keeps its backing lists here, keyed by the configured property
//! name, rather than inside its regular properties.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::callbacks::Callable;
use crate::error::{MixinError, Result};

/// Ordered, append-only list of deferred handlers.
///
/// Clones share the same underlying list, so a handle obtained from
/// [`Host::stack`](crate::Host::stack) observes later registrations.
#[derive(Debug, Clone, Default)]
pub struct HandlerStack {
    handlers: Arc<RwLock<Vec<Callable>>>,
}

impl HandlerStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler at the end.
    pub fn push(&self, handler: Callable) -> Result<()> {
        self.handlers
            .write()
            .map_err(|_| MixinError::LockPoisoned("handler stack".into()))?
            .push(handler);
        Ok(())
    }

    /// Handler at `index`, cloned out so no lock is held while it runs.
    pub fn get(&self, index: usize) -> Result<Option<Callable>> {
        Ok(self
            .handlers
            .read()
            .map_err(|_| MixinError::LockPoisoned("handler stack".into()))?
            .get(index)
            .cloned())
    }

    /// Number of registered handlers.
    pub fn count(&self) -> Result<usize> {
        self.handlers
            .read()
            .map(|h| h.len())
            .map_err(|_| MixinError::LockPoisoned("handler stack".into()))
    }

    /// Number of registered handlers, or 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.count().unwrap_or(0)
    }

    /// Check if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both handles point at the same list.
    pub fn ptr_eq(&self, other: &HandlerStack) -> bool {
        Arc::ptr_eq(&self.handlers, &other.handlers)
    }

    /// Poison the lock by panicking while a writer holds it.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let handlers = self.handlers.clone();
        let _ = std::thread::spawn(move || {
            let _guard = handlers.write().unwrap();
            panic!("poisoning handler stack");
        })
        .join();
    }
}

/// Side table mapping property names to handler stacks.
#[derive(Debug, Default)]
pub struct StackTable {
    stacks: RwLock<HashMap<String, HandlerStack>>,
}

impl StackTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stack under `prop`, creating an empty one if absent.
    ///
    /// An existing stack is never replaced.
    pub fn ensure(&self, prop: &str) -> Result<HandlerStack> {
        let mut stacks = self
            .stacks
            .write()
            .map_err(|_| MixinError::LockPoisoned("stack table".into()))?;

        if let Some(existing) = stacks.get(prop) {
            return Ok(existing.clone());
        }

        tracing::debug!("Created handler stack '{}'", prop);
        let stack = HandlerStack::new();
        stacks.insert(prop.to_string(), stack.clone());
        Ok(stack)
    }

    /// Lookup a stack by property name.
    pub fn get(&self, prop: &str) -> Option<HandlerStack> {
        self.stacks.read().ok()?.get(prop).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn noop() -> Callable {
        Callable::new(|_, _| Ok(Value::null()))
    }

    #[test]
    fn test_push_preserves_order() {
        let stack = HandlerStack::new();
        let handlers: Vec<Callable> = (0..3).map(|_| noop()).collect();
        for h in &handlers {
            stack.push(h.clone()).unwrap();
        }

        assert_eq!(stack.len(), 3);
        for (i, h) in handlers.iter().enumerate() {
            assert!(stack.get(i).unwrap().unwrap().ptr_eq(h));
        }
        assert!(stack.get(3).unwrap().is_none());
    }

    #[test]
    fn test_clones_share_storage() {
        let stack = HandlerStack::new();
        let view = stack.clone();
        stack.push(noop()).unwrap();

        assert_eq!(view.len(), 1);
        assert!(view.ptr_eq(&stack));
        assert!(!view.ptr_eq(&HandlerStack::new()));
    }

    #[test]
    fn test_ensure_never_replaces() {
        let table = StackTable::new();
        let first = table.ensure("fns").unwrap();
        first.push(noop()).unwrap();

        let second = table.ensure("fns").unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_lookup_by_prop() {
        let table = StackTable::new();
        let plugins = table.ensure("plugins").unwrap();

        assert!(table.get("plugins").unwrap().ptr_eq(&plugins));
        assert!(table.get("fns").is_none());
    }

    #[test]
    fn test_poisoned_stack_reports_error() {
        let stack = HandlerStack::new();
        stack.push(noop()).unwrap();
        stack.poison();

        assert!(matches!(stack.count(), Err(MixinError::LockPoisoned(_))));
        assert!(matches!(stack.get(0), Err(MixinError::LockPoisoned(_))));
        assert!(matches!(stack.push(noop()), Err(MixinError::LockPoisoned(_))));
        assert_eq!(stack.len(), 0);
    }
}
