//! Plugin registration mixin.
//!
//! Installs two behaviors onto any object or function host:
//! `use`, which invokes a plugin immediately and keeps any handler it
//! returns, and `run`, which replays those handlers against a value.
//!
//! # Example
//!
//! ```rust
//! use lib_plugin_mixin::{install, Callable, Host, MixinConfig, Value};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = install(Host::object(), MixinConfig::default())?;
//!
//!     // Runs now; the returned handler runs on every `run`.
//!     app.use_fn(|this, _| {
//!         this.set("registered", true)?;
//!         Ok(Value::from(Callable::unit(|_, args| {
//!             let target = args[0].as_host().expect("host");
//!             target.set("seen", true)
//!         })))
//!     })?;
//!
//!     let ctx = Host::object();
//!     app.run(&[Value::from(&ctx)])?;
//!
//!     assert_eq!(ctx.get("seen"), Some(Value::from(true)));
//!     assert!(ctx.capabilities().is_extensible());
//!     Ok(())
//! }
//! ```

mod callbacks;
mod config;
mod error;
mod host;
mod mixin;
mod stack;
mod state;
mod value;

pub use callbacks::*;
pub use config::*;
pub use error::*;
pub use host::*;
pub use mixin::*;
pub use stack::*;
pub use state::*;
pub use value::*;
