//! Configuration resolution
//!
//! Two kinds of values are resolved here:
//!
//! - **Named variables** ([`ConfigResolver`]): an instance-local override map
//!   on top of compiled-in `DEFAULT_*` values, seeded from [`BootConfig`].
//! - **Core plugin settings** ([`CoreConfResolver`]): the configuration set of
//!   a `core.*` plugin, filtered through the logged user's merged role for the
//!   active repository, with `${NAME}` tokens expanded by [`TokenExpander`].
//!
//! # Precedence
//!
//! For core settings, later sources override earlier ones:
//!
//! 1. **Plugin defaults** - the plugin's own configuration set
//! 2. **Group roles** - merged by the role store
//! 3. **Personal role** - the user's own overrides
//!
//! # Example
//!
//! ```ignore
//! use tenantconf_core::config::{ConfigResolver, CoreConfResolver, ResolutionContext};
//!
//! let config = ConfigResolver::new();
//! let resolver = CoreConfResolver::new(plugins.as_ref(), roles.as_ref(), &config);
//! let limit = resolver.resolve(&ResolutionContext::default(), "MAX_UPLOAD", "ajaxplorer")?;
//! ```

mod boot;
mod core_conf;
mod defaults;
mod resolver;
mod tokens;

pub use boot::{BootConfig, ServerSection, toml_to_json_value};
pub use core_conf::{CoreConfResolver, ResolutionContext};
pub use defaults::Defaults;
pub use resolver::ConfigResolver;
pub use tokens::{TokenExpander, value_as_token};
