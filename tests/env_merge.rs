use std::ffi::OsString;

use cmdrun::exec::env::{effective_environment, parse_override, resolve};
use proptest::prelude::*;

fn inherited() -> Vec<(String, String)> {
    vec![
        ("HOME".to_string(), "/home/user".to_string()),
        ("PATH".to_string(), "/usr/bin".to_string()),
    ]
}

fn strings(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|e| e.to_string()).collect()
}

#[test]
fn no_overrides_means_inherit() {
    assert!(effective_environment(inherited(), &[]).is_none());
}

#[test]
fn overrides_are_appended_after_inherited() {
    let env = effective_environment(inherited(), &strings(&["DEBUG=true", "HOME=/tmp"]))
        .expect("overrides given");

    let keys: Vec<&OsString> = env.entries.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["HOME", "PATH", "DEBUG", "HOME"]);
    assert_eq!(env.get("HOME"), Some(&OsString::from("/tmp")));
    assert_eq!(env.get("PATH"), Some(&OsString::from("/usr/bin")));
    assert!(env.rejected.is_empty());
}

#[test]
fn duplicate_overrides_last_one_wins() {
    let env = effective_environment(
        Vec::<(String, String)>::new(),
        &strings(&["MODE=a", "MODE=b", "MODE=c"]),
    )
    .expect("overrides given");

    assert_eq!(env.entries.len(), 3);
    assert_eq!(env.get("MODE"), Some(&OsString::from("c")));
    assert_eq!(resolve(&env.entries).get(&OsString::from("MODE")), Some(&OsString::from("c")));
}

#[test]
fn value_is_split_at_the_first_equals_sign() {
    assert_eq!(parse_override("OPTS=a=b=c"), Some(("OPTS", "a=b=c")));
    assert_eq!(parse_override("EMPTY="), Some(("EMPTY", "")));
    assert_eq!(parse_override("NOEQUALS"), None);
    assert_eq!(parse_override("=value"), None);
}

#[test]
fn malformed_overrides_are_rejected_not_applied() {
    let env = effective_environment(inherited(), &strings(&["NOEQUALS", "=x", "OK=1"]))
        .expect("overrides given");

    assert_eq!(env.rejected, strings(&["NOEQUALS", "=x"]));
    assert_eq!(env.entries.len(), 3);
    assert_eq!(env.get("OK"), Some(&OsString::from("1")));
}

proptest! {
    #[test]
    fn child_sees_last_override_for_every_key(
        overrides in prop::collection::vec(("[A-D]", "[a-z]{0,4}"), 1..20)
    ) {
        let entries: Vec<String> = overrides.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let env = effective_environment(inherited(), &entries).expect("overrides given");

        prop_assert_eq!(env.entries.len(), inherited().len() + overrides.len());

        let resolved = resolve(&env.entries);
        for (key, _) in &overrides {
            let last = overrides.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v);
            let last = last.map(OsString::from);
            prop_assert_eq!(resolved.get(&OsString::from(key)), last.as_ref());
            prop_assert_eq!(env.get(key), last.as_ref());
        }
        prop_assert_eq!(resolved.get(&OsString::from("HOME")), Some(&OsString::from("/home/user")));
    }
}
