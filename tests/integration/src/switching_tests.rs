//! Repository switching: trusted switches, ad-hoc repositories, session
//! persistence, preference history and the access driver cache.

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use tenantconf_core::{ContextMode, Error, Plugin, Repository, RepositoryId};
use tenantconf_test_utils::{SavedPreference, StaticPlugin, TestPlatform};

fn repo(id: &str) -> RepositoryId {
    RepositoryId::new(id)
}

fn platform_with_repos() -> TestPlatform {
    let platform = TestPlatform::new();
    platform.add_repository(Repository::new("1", "fs").with_option("CHARSET", "UTF-8"), true);
    platform.add_repository(Repository::new("2", "s3"), false);
    platform
}

#[test]
fn trusted_switch_skips_the_access_check() {
    let platform = platform_with_repos();
    platform.login("u");
    let mut conf = platform.service(ContextMode::ProcessLocal);

    let switched = conf.switch_repository(Some(&repo("2")), false).unwrap();

    assert_eq!(switched, Some(Repository::new("2", "s3")));
    assert_eq!(conf.active_repository_id().unwrap(), Some(repo("2")));
}

#[test]
fn trusted_switch_to_unknown_repository_still_sets_the_id() {
    let platform = platform_with_repos();
    let mut conf = platform.service(ContextMode::ProcessLocal);
    conf.switch_repository(Some(&repo("1")), false).unwrap();

    let switched = conf.switch_repository(Some(&repo("9")), false).unwrap();

    assert_eq!(switched, None);
    assert_eq!(conf.active_repository_id().unwrap(), Some(repo("9")));
    assert_eq!(conf.charset().unwrap(), None);
    assert!(conf.current_repository().is_none());
}

#[test]
fn switching_to_no_repository_clears_the_context() {
    let platform = platform_with_repos();
    let mut conf = platform.service(ContextMode::ProcessLocal);
    conf.switch_repository(Some(&repo("1")), false).unwrap();

    assert_eq!(conf.switch_repository(None, false).unwrap(), None);
    assert_eq!(conf.active_repository_id().unwrap(), None);
    assert_eq!(conf.charset().unwrap(), None);
}

#[test]
fn registered_repository_is_preferred_over_the_store() {
    let platform = platform_with_repos();
    let mut conf = platform.service(ContextMode::ProcessLocal);
    let adhoc = Repository::new("1", "inbox").with_option("CHARSET", "ISO-8859-1");
    conf.register_repository(adhoc.clone());

    let switched = conf.switch_repository(Some(&repo("1")), true);

    // The stored repository is accessible, the registered one is what becomes current
    assert_eq!(switched.unwrap(), Some(adhoc.clone()));
    assert_eq!(conf.current_repository(), Some(&adhoc));
    assert_eq!(conf.charset().unwrap(), Some("ISO-8859-1".to_string()));
}

#[test]
fn registered_repository_unknown_to_the_store_needs_a_trusted_switch() {
    let platform = platform_with_repos();
    let mut conf = platform.service(ContextMode::ProcessLocal);
    let adhoc = Repository::new("tmp", "fs");
    conf.register_repository(adhoc.clone());

    assert!(matches!(
        conf.switch_repository(Some(&repo("tmp")), true),
        Err(Error::Unauthorized { .. })
    ));
    assert_eq!(
        conf.switch_repository(Some(&repo("tmp")), false).unwrap(),
        Some(adhoc)
    );
}

#[test]
fn session_mode_persists_context_in_the_session() {
    let platform = platform_with_repos();
    let mut conf = platform.service(ContextMode::Session);
    conf.switch_repository(Some(&repo("1")), false).unwrap();

    let session = platform.session.snapshot();
    assert_eq!(session.get("REPO_ID").map(String::as_str), Some("1"));
    assert_eq!(session.get("CHARSET").map(String::as_str), Some("UTF-8"));

    // A later request of the same session sees the same context
    let next = platform.service(ContextMode::Session);
    assert_eq!(next.active_repository_id().unwrap(), Some(repo("1")));
    assert_eq!(next.charset().unwrap(), Some("UTF-8".to_string()));
}

#[test]
fn failed_charset_write_leaves_the_context_unchanged() {
    let platform = platform_with_repos();
    platform.add_repository(Repository::new("plain", "fs"), true);
    platform.add_plugin(StaticPlugin::new("access", "fs"));
    platform.login("u");
    let mut conf = platform.service(ContextMode::Session);
    conf.switch_repository(Some(&repo("plain")), true).unwrap();
    conf.load_access_driver().unwrap();
    platform.session.fail_writes_to("CHARSET");

    let result = conf.switch_repository(Some(&repo("1")), true);

    assert!(matches!(
        result,
        Err(Error::Collaborator { collaborator: "SessionStore", .. })
    ));
    assert_eq!(conf.active_repository_id().unwrap(), Some(repo("plain")));
    assert_eq!(conf.charset().unwrap(), None);
    assert_eq!(
        conf.current_repository().map(|r| r.id.clone()),
        Some(repo("plain"))
    );
    conf.load_access_driver().unwrap();
    assert_eq!(platform.plugins.lookups(), 1);
    assert_eq!(
        platform.session.snapshot().get("REPO_ID").map(String::as_str),
        Some("plain")
    );
}

#[test]
fn process_local_mode_never_touches_the_session() {
    let platform = platform_with_repos();
    let mut conf = platform.service(ContextMode::ProcessLocal);
    conf.switch_repository(Some(&repo("1")), false).unwrap();
    conf.set_charset("UTF-16").unwrap();

    assert!(platform.session.snapshot().is_empty());
    assert_eq!(conf.charset().unwrap(), Some("UTF-16".to_string()));

    let next = platform.service(ContextMode::ProcessLocal);
    assert_eq!(next.active_repository_id().unwrap(), None);
}

#[test]
fn switch_records_last_repository_for_the_logged_user() {
    let platform = platform_with_repos();
    platform.login("alice");
    let mut conf = platform.service(ContextMode::ProcessLocal);

    conf.switch_repository(Some(&repo("1")), true).unwrap();

    assert_eq!(
        platform.roles.preferences(),
        vec![SavedPreference {
            user: "alice".into(),
            preference: "history".to_string(),
            key: "last_repository".to_string(),
            value: json!("1"),
        }]
    );
}

#[rstest]
#[case::users_disabled(false, true)]
#[case::nobody_logged_in(true, false)]
fn no_history_without_user_accounts(#[case] users_enabled: bool, #[case] logged_in: bool) {
    let platform = platform_with_repos();
    platform.auth.set_users_enabled(users_enabled);
    if logged_in {
        platform.login("alice");
    }
    let mut conf = platform.service(ContextMode::ProcessLocal);

    conf.switch_repository(Some(&repo("1")), false).unwrap();

    assert!(platform.roles.preferences().is_empty());
}

#[test]
fn failing_history_write_does_not_fail_the_switch() {
    let platform = platform_with_repos();
    platform.login("alice");
    platform.roles.fail_preferences(true);
    let mut conf = platform.service(ContextMode::ProcessLocal);

    let switched = conf.switch_repository(Some(&repo("1")), true).unwrap();

    assert_eq!(switched.map(|r| r.id), Some(repo("1")));
    assert_eq!(conf.active_repository_id().unwrap(), Some(repo("1")));
}

#[test]
fn repository_store_failure_propagates() {
    let platform = platform_with_repos();
    platform.repositories.set_failing(true);
    let mut conf = platform.service(ContextMode::ProcessLocal);

    let result = conf.switch_repository(Some(&repo("1")), false);

    assert!(matches!(
        result,
        Err(Error::Collaborator { collaborator: "RepositoryStore", .. })
    ));
    assert_eq!(conf.active_repository_id().unwrap(), None);
}

#[test]
fn access_driver_is_cached_until_the_next_switch() {
    let platform = platform_with_repos();
    platform.add_plugin(StaticPlugin::new("access", "fs"));
    platform.add_plugin(StaticPlugin::new("access", "s3"));
    let mut conf = platform.service(ContextMode::ProcessLocal);

    assert!(conf.load_access_driver().unwrap().is_none());

    conf.switch_repository(Some(&repo("1")), false).unwrap();
    let driver = conf.load_access_driver().unwrap().unwrap();
    assert_eq!(driver.id().to_string(), "access.fs");
    conf.load_access_driver().unwrap();
    assert_eq!(platform.plugins.lookups(), 1);

    conf.switch_repository(Some(&repo("2")), false).unwrap();
    let driver = conf.load_access_driver().unwrap().unwrap();
    assert_eq!(driver.id().to_string(), "access.s3");
    assert_eq!(platform.plugins.lookups(), 2);
}

#[test]
fn missing_access_driver_is_a_soft_miss() {
    let platform = platform_with_repos();
    let mut conf = platform.service(ContextMode::ProcessLocal);
    conf.switch_repository(Some(&repo("1")), false).unwrap();

    assert!(conf.load_access_driver().unwrap().is_none());
}
