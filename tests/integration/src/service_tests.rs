//! Service construction, named variables, core settings and personal
//! parameter fallbacks.

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use tenantconf_core::{
    BootConfig, Collaborators, ConfService, ContextMode, EmptyValueFallback, Error, PluginId,
    Repository, RepositoryId, RoleScope, User, UserId,
};
use tenantconf_test_utils::{StaticPlugin, StaticRole, TestPlatform};

#[rstest]
#[case(Some("/api/v2"), ContextMode::ProcessLocal)]
#[case(Some(""), ContextMode::Session)]
#[case(None, ContextMode::Session)]
fn mode_detection_follows_rest_base(#[case] base: Option<&str>, #[case] expected: ContextMode) {
    assert_eq!(ContextMode::detect(base), expected);
}

#[test]
fn session_mode_requires_a_session_store() {
    let platform = TestPlatform::new();
    let collaborators = Collaborators {
        session: None,
        ..platform.collaborators()
    };

    let result = ConfService::builder(collaborators.clone())
        .mode(ContextMode::Session)
        .build();
    assert!(matches!(
        result,
        Err(Error::MissingCollaborator { name: "SessionStore" })
    ));

    let conf = ConfService::builder(collaborators)
        .mode(ContextMode::ProcessLocal)
        .build()
        .unwrap();
    assert_eq!(conf.mode(), ContextMode::ProcessLocal);
}

#[test]
fn boot_config_is_applied_at_build_time() {
    let platform = TestPlatform::new();
    let boot = BootConfig::parse(
        r#"
[server]
https = true

[defaults]
LANGUAGE = "fr"

[conf]
MAX_SESSIONS = 4
"#,
    )
    .unwrap();

    let mut conf = ConfService::builder(platform.collaborators())
        .mode(ContextMode::ProcessLocal)
        .boot_config(boot)
        .build()
        .unwrap();

    assert_eq!(conf.get_conf("USE_HTTPS"), Some(json!(true)));
    assert_eq!(conf.get_conf("MAX_SESSIONS"), Some(json!(4)));
    assert_eq!(conf.get_conf("LANGUAGE"), Some(json!("fr")));

    conf.set_conf("LANGUAGE", json!("de"));
    assert_eq!(conf.get_conf("LANGUAGE"), Some(json!("de")));
    assert_eq!(conf.get_conf("UNKNOWN"), None);
}

#[test]
fn core_settings_expand_context_tokens() {
    let platform = TestPlatform::new();
    platform.add_plugin(
        StaticPlugin::new("core", "ajaxplorer")
            .with_config("HOME", "${DATA_PATH}/personal/${USER}")
            .with_config("LABEL", "${REPO_ID} (${CHARSET})"),
    );
    platform.add_repository(Repository::new("1", "fs").with_option("CHARSET", "UTF-8"), true);
    platform.login("alice");
    let mut conf = platform.service(ContextMode::ProcessLocal);
    conf.switch_repository(Some(&RepositoryId::new("1")), true).unwrap();

    assert_eq!(
        conf.get_core_conf("HOME").unwrap(),
        Some(json!("data/personal/alice"))
    );
    assert_eq!(conf.get_core_conf("LABEL").unwrap(), Some(json!("1 (UTF-8)")));
}

#[test]
fn core_settings_of_other_core_plugins() {
    let platform = TestPlatform::new();
    platform.add_plugin(StaticPlugin::new("core", "uploader").with_config("CHUNK", 4));
    let conf = platform.service(ContextMode::ProcessLocal);

    assert_eq!(conf.get_core_conf_for("CHUNK", "uploader").unwrap(), Some(json!(4)));
    assert_eq!(conf.get_core_conf_for("CHUNK", "missing").unwrap(), None);
    assert_eq!(conf.get_core_conf("CHUNK").unwrap(), None);
}

#[rstest]
#[case::enabled(Some(json!(true)), true)]
#[case::zero_string(Some(json!("0")), false)]
#[case::disabled(Some(json!(false)), false)]
#[case::undeclared(None, false)]
fn command_line_flag(#[case] declared: Option<Value>, #[case] expected: bool) {
    let platform = TestPlatform::new();
    let mut plugin = StaticPlugin::new("core", "ajaxplorer");
    if let Some(value) = declared {
        plugin = plugin.with_config("CMDLINE_ACTIVE", value);
    }
    platform.add_plugin(plugin);
    let conf = platform.service(ContextMode::ProcessLocal);

    assert_eq!(conf.command_line_enabled().unwrap(), expected);
}

#[test]
fn merged_role_failure_propagates_from_core_settings() {
    let platform = TestPlatform::new();
    platform.add_plugin(StaticPlugin::new("core", "ajaxplorer").with_config("X", 1));
    platform.login("alice");
    platform.roles.fail_lookups(true);
    let conf = platform.service(ContextMode::ProcessLocal);

    assert!(matches!(
        conf.get_core_conf("X"),
        Err(Error::Collaborator { collaborator: "RoleStore", .. })
    ));
}

#[test]
fn loaded_user_fast_path_fills_the_cache() {
    let platform = TestPlatform::new();
    let user = User::new(
        "alice",
        StaticRole::new()
            .with_override("core.conf", RoleScope::AllRepositories, "lang", "fr")
            .into_arc(),
    );
    let conf = platform.service(ContextMode::ProcessLocal);
    let plugin = PluginId::core_conf();

    assert_eq!(
        conf.get_user_personal_parameter("lang", &user, &plugin, Some(&json!("en")))
            .unwrap(),
        Some(json!("fr"))
    );
    assert_eq!(
        conf.get_user_personal_parameter("lang", user.id(), &plugin, None)
            .unwrap(),
        Some(json!("fr"))
    );
    assert_eq!(platform.roles.lookups(), 0);
}

#[test]
fn stored_user_is_built_when_no_role_is_loaded() {
    let platform = TestPlatform::new();
    platform.roles.add_stored_user(User::new(
        "bob",
        StaticRole::new()
            .with_override("core.conf", RoleScope::AllRepositories, "lang", "es")
            .into_arc(),
    ));
    let conf = platform.service(ContextMode::ProcessLocal);

    let value = conf
        .get_user_personal_parameter("lang", &UserId::new("bob"), &PluginId::core_conf(), None)
        .unwrap();

    assert_eq!(value, Some(json!("es")));
    assert_eq!(platform.roles.create_user_calls(), 1);
}

#[rstest]
#[case::caller_default(EmptyValueFallback::CallerDefault, json!("en"))]
#[case::identifier(EmptyValueFallback::Identifier, json!("alice"))]
fn empty_personal_value_fallback(#[case] fallback: EmptyValueFallback, #[case] expected: Value) {
    let platform = TestPlatform::new();
    platform.roles.add_loaded_role(
        "AJXP_USR_/alice",
        StaticRole::new()
            .with_override("core.conf", RoleScope::AllRepositories, "lang", "")
            .into_arc(),
    );
    let conf = ConfService::builder(platform.collaborators())
        .mode(ContextMode::ProcessLocal)
        .empty_value_fallback(fallback)
        .build()
        .unwrap();
    let alice = UserId::new("alice");
    let plugin = PluginId::core_conf();

    for _ in 0..2 {
        let value = conf
            .get_user_personal_parameter("lang", &alice, &plugin, Some(&json!("en")))
            .unwrap();
        assert_eq!(value, Some(expected.clone()));
    }
    assert_eq!(platform.roles.lookups(), 1);
}

#[test]
fn parameter_cache_outlives_one_request() {
    let platform = TestPlatform::new();
    platform.roles.add_loaded_role(
        "AJXP_USR_/alice",
        StaticRole::new()
            .with_override("core.conf", RoleScope::AllRepositories, "lang", "fr")
            .into_arc(),
    );
    let alice = UserId::new("alice");
    let plugin = PluginId::core_conf();

    let first = platform.service(ContextMode::ProcessLocal);
    first
        .get_user_personal_parameter("lang", &alice, &plugin, None)
        .unwrap();
    let cache = first.parameter_cache();
    drop(first);

    let second = ConfService::builder(platform.collaborators())
        .mode(ContextMode::ProcessLocal)
        .parameter_cache(cache)
        .build()
        .unwrap();
    let value = second
        .get_user_personal_parameter("lang", &alice, &plugin, None)
        .unwrap();

    assert_eq!(value, Some(json!("fr")));
    assert_eq!(platform.roles.lookups(), 1);
}

#[test]
fn role_store_failure_propagates_from_personal_parameters() {
    let platform = TestPlatform::new();
    platform.roles.fail_lookups(true);
    let conf = platform.service(ContextMode::ProcessLocal);

    let result = conf.get_user_personal_parameter(
        "lang",
        &UserId::new("alice"),
        &PluginId::core_conf(),
        Some(&json!("en")),
    );
    assert!(matches!(result, Err(Error::Collaborator { .. })));
}

#[test]
fn invalidating_loaded_repositories_reaches_both_stores() {
    let platform = TestPlatform::new();
    let conf = platform.service(ContextMode::ProcessLocal);

    conf.invalidate_loaded_repositories().unwrap();

    assert_eq!(platform.roles.invalidations(), 1);
    assert_eq!(platform.plugins.registry_clears(), 1);
}
