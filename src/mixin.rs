//! The mixin installer and the `use` / `run` behaviors it attaches.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::config::MixinConfig;
use crate::error::{MixinError, Result};
use crate::host::{Host, WeakHost};
use crate::value::Value;

/// Install the mixin onto `host`, returning it.
///
/// Hosts are installed in place. A bare function is promoted to a callable
/// host and a JSON object to an object host. Anything else is rejected.
///
/// An existing handler stack under `config.prop` is kept as-is; `use` and
/// `run` are always (re)attached.
pub fn install(host: impl Into<Value>, config: MixinConfig) -> Result<Host> {
    let host = match host.into() {
        Value::Host(h) => h,
        Value::Function(f) => Host::function(f),
        Value::Data(serde_json::Value::Object(map)) => Host::from_map(map),
        Value::Data(_) => return Err(MixinError::invalid_host()),
    };

    install_on(&host, Arc::new(config))?;
    Ok(host)
}

/// [`install`] with a loosely-typed JSON configuration.
pub fn install_with(host: impl Into<Value>, config: &serde_json::Value) -> Result<Host> {
    install(host, MixinConfig::from_json(config))
}

fn install_on(host: &Host, config: Arc<MixinConfig>) -> Result<()> {
    host.stacks().ensure(&config.prop)?;

    tracing::debug!("Installed mixin on {:?} (prop '{}')", host, config.prop);

    let mixin = Arc::new(Mixin {
        config,
        host: host.downgrade(),
    });
    host.attach_mixin(mixin)
}

/// The installed `use` / `run` pair.
///
/// Both operations take an optional calling context. `None` means the host
/// the mixin was installed on; `Some(other)` rebinds the call to `other`,
/// whose own handler stack is then used.
pub struct Mixin {
    config: Arc<MixinConfig>,
    host: WeakHost,
}

impl Mixin {
    /// Configuration shared by `use` and `run`.
    pub fn config(&self) -> &MixinConfig {
        &self.config
    }

    /// The host this mixin was installed on, if still alive.
    pub fn host(&self) -> Option<Host> {
        self.host.upgrade()
    }

    fn resolve(&self, this: Option<&Host>) -> Result<Host> {
        match this {
            Some(h) => Ok(h.clone()),
            None => self.host().ok_or(MixinError::HostReleased),
        }
    }

    /// Invoke `plugin` now; keep its return value if it is callable.
    pub fn use_plugin(&self, this: Option<&Host>, plugin: &Value, options: &Value) -> Result<Host> {
        let plugin = plugin.as_callable().ok_or_else(MixinError::invalid_plugin)?;
        let this = self.resolve(this)?;

        let params = if self.config.params.is_empty() {
            vec![Value::Host(this.clone())]
        } else {
            self.config.params.clone()
        };

        if let Some(hook) = &self.config.hook {
            hook.merge(&this, options)?;
        }

        let returned = plugin.call(&this, &params)?;
        if let Some(handler) = returned.as_callable() {
            let stack = this
                .stack(&self.config.prop)
                .ok_or_else(|| MixinError::MissingStack(self.config.prop.clone()))?;
            stack.push(handler)?;
            tracing::debug!(
                "Registered deferred handler #{} on '{}'",
                stack.len(),
                self.config.prop
            );
        }

        Ok(this)
    }

    /// Replay deferred handlers, in registration order, against `args`.
    ///
    /// Handlers appended while the replay is in progress are left for the
    /// next call.
    ///
    /// A JSON object in first position is promoted to an object host, the
    /// same way [`install`] promotes it, and handlers receive that host.
    pub fn run(&self, this: Option<&Host>, args: &[Value]) -> Result<Host> {
        let args = match args.first() {
            Some(target) => match self.decorate(target)? {
                Some(promoted) => {
                    let mut owned = args.to_vec();
                    owned[0] = Value::Host(promoted);
                    Cow::Owned(owned)
                }
                None => Cow::Borrowed(args),
            },
            None => Cow::Borrowed(args),
        };

        let this = self.resolve(this)?;
        let stack = this
            .stack(&self.config.prop)
            .ok_or_else(|| MixinError::MissingStack(self.config.prop.clone()))?;

        let len = stack.count()?;
        tracing::debug!("Running {} handler(s) from '{}'", len, self.config.prop);

        for index in 0..len {
            let Some(handler) = stack.get(index)? else {
                break;
            };
            tracing::trace!("Invoking handler #{}", index);
            handler.call(&this, &args)?;
        }

        Ok(this)
    }

    /// Install onto a non-extensible first argument. Returns the new host
    /// when the argument had to be promoted from JSON.
    fn decorate(&self, value: &Value) -> Result<Option<Host>> {
        match value {
            Value::Data(serde_json::Value::Object(map)) => {
                let promoted = Host::from_map(map.clone());
                tracing::debug!("Promoting JSON object to {:?} before replay", promoted);
                install_on(&promoted, self.config.clone())?;
                Ok(Some(promoted))
            }
            Value::Host(target) if value.is_object() && !target.capabilities().is_extensible() => {
                tracing::debug!("Decorating {:?} before replay", target);
                install_on(target, self.config.clone())?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

impl fmt::Debug for Mixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixin")
            .field("config", &self.config)
            .field("host_alive", &self.host().is_some())
            .finish()
    }
}
