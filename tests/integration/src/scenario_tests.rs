//! End-to-end scenarios over a fully wired `ConfService`
//!
//! Each test drives the public surface only: switch, read settings, read
//! personal parameters, clear caches.

use pretty_assertions::assert_eq;
use serde_json::json;
use tenantconf_core::{ContextMode, Error, PluginId, Repository, RepositoryId, RoleScope, UserId};
use tenantconf_test_utils::{StaticPlugin, StaticRole, TestPlatform};

fn repo(id: &str) -> RepositoryId {
    RepositoryId::new(id)
}

#[test]
fn scenario_a_temporary_switch_checks_access() {
    let platform = TestPlatform::new();
    platform.add_repository(Repository::new("1", "fs"), true);
    platform.add_repository(Repository::new("2", "fs"), false);
    platform.login("u");
    let mut conf = platform.service(ContextMode::ProcessLocal);

    let denied = conf.switch_repository(Some(&repo("2")), true);
    assert!(matches!(
        denied,
        Err(Error::Unauthorized { repository: Some(ref id) }) if *id == repo("2")
    ));

    let switched = conf.switch_repository(Some(&repo("1")), true).unwrap();
    assert_eq!(switched, Some(Repository::new("1", "fs")));
    assert_eq!(conf.active_repository_id().unwrap(), Some(repo("1")));
}

#[test]
fn scenario_b_role_override_wins_for_the_logged_user() {
    let platform = TestPlatform::new();
    platform.add_plugin(StaticPlugin::new("core", "ajaxplorer").with_config("MAX_UPLOAD", "100"));
    platform.add_repository(Repository::new("1", "fs"), true);
    platform.login_with_role(
        "u",
        StaticRole::new().with_override(
            "core.ajaxplorer",
            RoleScope::Repository(repo("1")),
            "MAX_UPLOAD",
            "50",
        ),
    );
    let mut conf = platform.service(ContextMode::ProcessLocal);
    conf.switch_repository(Some(&repo("1")), true).unwrap();

    assert_eq!(conf.get_core_conf("MAX_UPLOAD").unwrap(), Some(json!("50")));

    platform.auth.logout();
    assert_eq!(conf.get_core_conf("MAX_UPLOAD").unwrap(), Some(json!("100")));
}

#[test]
fn scenario_c_unknown_user_gets_the_default() {
    let platform = TestPlatform::new();
    let conf = platform.service(ContextMode::ProcessLocal);

    let value = conf
        .get_user_personal_parameter(
            "lang",
            &UserId::new("alice"),
            &PluginId::core_conf(),
            Some(&json!("en")),
        )
        .unwrap();
    assert_eq!(value, Some(json!("en")));
    assert!(conf.parameter_cache().lock().unwrap().is_empty());
}

#[test]
fn clearing_caches_twice_matches_clearing_once() {
    let platform = TestPlatform::new();
    let user = platform.login_with_role(
        "alice",
        StaticRole::new().with_override("core.conf", RoleScope::AllRepositories, "lang", "fr"),
    );
    let conf = platform.service(ContextMode::ProcessLocal);
    conf.get_user_personal_parameter("lang", &user, &PluginId::core_conf(), None)
        .unwrap();
    assert_eq!(conf.parameter_cache().lock().unwrap().len(), 1);

    conf.clear_all_caches().unwrap();
    let cleared_once = conf.parameter_cache().lock().unwrap().clone();
    conf.clear_all_caches().unwrap();

    assert!(cleared_once.is_empty());
    assert!(conf.parameter_cache().lock().unwrap().is_empty());
    assert_eq!(platform.plugins.manifest_clears(), 2);
    assert_eq!(platform.messages.clears(), 2);
    assert_eq!(platform.compilation_cache.resets(), 2);
    assert_eq!(platform.cache.deleted_namespaces(), vec!["shared", "shared"]);
}

#[test]
fn personal_parameters_are_memoized_per_user() {
    let platform = TestPlatform::new();
    platform.roles.add_loaded_role(
        "AJXP_USR_/alice",
        StaticRole::new()
            .with_override("core.conf", RoleScope::AllRepositories, "lang", "fr")
            .into_arc(),
    );
    let conf = platform.service(ContextMode::ProcessLocal);
    let alice = UserId::new("alice");

    let first = conf
        .get_user_personal_parameter("lang", &alice, &PluginId::core_conf(), None)
        .unwrap();
    let lookups = platform.roles.lookups();
    for _ in 0..3 {
        let again = conf
            .get_user_personal_parameter("lang", &alice, &PluginId::core_conf(), None)
            .unwrap();
        assert_eq!(again, first);
    }

    assert_eq!(first, Some(json!("fr")));
    assert_eq!(platform.roles.lookups(), lookups);
}

#[test]
fn personal_override_beats_plugin_value_and_anonymous_sees_plugin_value() {
    let platform = TestPlatform::new();
    platform.add_plugin(StaticPlugin::new("core", "ajaxplorer").with_config("THEME", "light"));
    platform.login_with_role(
        "alice",
        StaticRole::new().with_override(
            "core.ajaxplorer",
            RoleScope::AllRepositories,
            "THEME",
            "dark",
        ),
    );
    let conf = platform.service(ContextMode::ProcessLocal);

    assert_eq!(conf.get_core_conf("THEME").unwrap(), Some(json!("dark")));

    platform.auth.logout();
    assert_eq!(conf.get_core_conf("THEME").unwrap(), Some(json!("light")));
}

#[test]
fn refused_switch_leaves_context_unchanged() {
    let platform = TestPlatform::new();
    platform.add_repository(Repository::new("1", "fs").with_option("CHARSET", "UTF-8"), true);
    platform.add_repository(Repository::new("2", "fs"), false);
    platform.login("u");
    let mut conf = platform.service(ContextMode::Session);
    conf.switch_repository(Some(&repo("1")), true).unwrap();

    for target in [Some(repo("2")), Some(repo("404")), None] {
        assert!(conf.switch_repository(target.as_ref(), true).is_err());
        assert_eq!(conf.active_repository_id().unwrap(), Some(repo("1")));
        assert_eq!(conf.charset().unwrap(), Some("UTF-8".to_string()));
        assert_eq!(conf.current_repository().map(|r| r.id.clone()), Some(repo("1")));
    }
}

#[test]
fn charset_follows_the_active_repository() {
    let platform = TestPlatform::new();
    platform.add_repository(Repository::new("utf", "fs").with_option("CHARSET", "UTF-8"), true);
    platform.add_repository(Repository::new("plain", "fs"), true);
    platform.login("u");
    let mut conf = platform.service(ContextMode::ProcessLocal);

    conf.switch_repository(Some(&repo("utf")), true).unwrap();
    assert_eq!(conf.charset().unwrap(), Some("UTF-8".to_string()));

    conf.switch_repository(Some(&repo("plain")), true).unwrap();
    assert_eq!(conf.charset().unwrap(), None);
}
