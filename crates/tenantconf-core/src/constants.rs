//! Well-known keys, prefixes and namespaces.

/// Session key holding the active charset.
pub const CHARSET_SESSION_KEY: &str = "CHARSET";

/// Session key holding the active repository id.
pub const REPOSITORY_SESSION_KEY: &str = "REPO_ID";

/// Repository safe option declaring the repository charset.
pub const CHARSET_OPTION: &str = "CHARSET";

/// Prefix of compiled-in default names (`DEFAULT_<NAME>`).
pub const DEFAULT_PREFIX: &str = "DEFAULT_";

/// Prefix of personal role ids (`AJXP_USR_/<user id>`).
pub const PERSONAL_ROLE_PREFIX: &str = "AJXP_USR_/";

/// Namespace of the cache shared between processes.
pub const SHARED_CACHE_NAMESPACE: &str = "shared";

/// Plugin type of core plugins.
pub const CORE_PLUGIN_TYPE: &str = "core";

/// Core plugin holding the main platform settings.
pub const DEFAULT_CORE_TYPE: &str = "ajaxplorer";

/// Plugin type of access drivers.
pub const ACCESS_PLUGIN_TYPE: &str = "access";

/// Preference group and key recording the last repository a user opened.
pub const HISTORY_PREFERENCE: &str = "history";
pub const LAST_REPOSITORY_KEY: &str = "last_repository";

/// Maximum nesting of `${NAME}` token expansion.
pub const MAX_TOKEN_DEPTH: usize = 8;

/// Build the id of the personal role attached to `user_id`.
pub fn personal_role_id(user_id: &str) -> String {
    format!("{PERSONAL_ROLE_PREFIX}{user_id}")
}
