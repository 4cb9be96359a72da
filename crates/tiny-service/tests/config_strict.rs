#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;

use tiny_service::config::{self, ServiceConfig};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k: &str| map.get(k).cloned()
}

#[test]
fn deny_unknown_fields() {
    let bad = r#"
listen: "0.0.0.0:8000"
welcome_prefx: "Hi" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("welcome_prefix: \"Howdy\"\n").expect("must parse");
    assert_eq!(cfg.welcome_prefix, "Howdy");
    assert_eq!(cfg.listen, "0.0.0.0:8000");
}

#[test]
fn invalid_listen_is_rejected() {
    let err = config::load_from_str("listen: \"not-an-addr\"\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn prefix_defaults_to_hello() {
    let cfg = config::apply_env_with(ServiceConfig::default(), env(&[])).unwrap();
    assert_eq!(cfg.welcome_prefix, "Hello");
}

#[test]
fn prefix_comes_from_environment() {
    let cfg = config::apply_env_with(ServiceConfig::default(), env(&[("WELCOME_PREFIX", "Yo")])).unwrap();
    assert_eq!(cfg.welcome_prefix, "Yo");
}

#[test]
fn environment_overrides_file() {
    let file = config::load_from_str("welcome_prefix: \"Howdy\"\nlisten: \"127.0.0.1:9000\"\n").unwrap();
    let cfg = config::apply_env_with(
        file,
        env(&[("WELCOME_PREFIX", "Yo"), ("TINY_SERVICE_LISTEN", "127.0.0.1:9100")]),
    )
    .unwrap();
    assert_eq!(cfg.welcome_prefix, "Yo");
    assert_eq!(cfg.listen_addr().unwrap().port(), 9100);
}

#[test]
fn explicit_config_path_must_exist() {
    let err = config::load_with(env(&[("TINY_SERVICE_CONFIG", "/nonexistent/tiny-service.yaml")]))
        .expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}
