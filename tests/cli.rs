//! Integration tests: run the modcdn binary and check exit codes and output.

use std::path::Path;
use std::process::Command;

/// Run from an empty dir with an empty HOME so no .modcdnrc leaks in.
fn modcdn(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_modcdn"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("USERPROFILE", dir)
        .env_remove("MODCDN_URL_TEMPLATE")
        .env_remove("MODCDN_REGISTRY")
        .env_remove("MODCDN_ENV")
        .env_remove("MODCDN_LOG");
    cmd
}

#[test]
fn test_help() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path()).arg("--help").output().unwrap();
    assert!(out.status.success(), "modcdn --help should succeed");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("resolve"));
    assert!(stdout.contains("url"));
    assert!(stdout.contains("list"));
}

#[test]
fn test_version() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path()).arg("--version").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_resolve_prints_url() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path())
        .args(["resolve", "react", "15.0.0"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(
        stdout.lines().next(),
        Some("https://unpkg.com/react@15.0.0/dist/react.js")
    );
    assert!(stdout.contains("var: React"));
}

#[test]
fn test_resolve_json_production() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path())
        .args(["resolve", "react", "15.0.0", "--env", "production", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["name"], "react");
    assert_eq!(v["var"], "React");
    assert_eq!(v["url"], "https://unpkg.com/react@15.0.0/dist/react.min.js");
    assert_eq!(v["path"], "/dist/react.min.js");
    assert!(v.get("styleUrl").is_none());
}

#[test]
fn test_resolve_unknown_module_fails() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path())
        .args(["resolve", "qwerty", "1.0.0"])
        .output()
        .unwrap();
    assert!(!out.status.success(), "unknown module should exit non-zero");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("No CDN entry for qwerty@1.0.0"));
}

#[test]
fn test_resolve_empty_module_is_invalid_argument() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path())
        .args(["resolve", "", "1.0.0"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid argument"));
}

#[test]
fn test_cdn_flag_and_config_file() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path())
        .args(["--cdn", "https://cdn.jsdelivr.net/npm", "resolve", "vue", "2.6.14"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("https://cdn.jsdelivr.net/npm/vue@2.6.14/dist/vue.js"));

    std::fs::write(
        td.path().join(".modcdnrc"),
        r#"{ "urlTemplate": "https://mirror.local/[name]/[version][path]", "env": "production" }"#,
    )
    .unwrap();
    let out = modcdn(td.path())
        .args(["resolve", "vue", "2.6.14"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("https://mirror.local/vue/2.6.14/dist/vue.min.js"));
}

#[test]
fn test_bad_template_fails() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path())
        .args(["--cdn", "https://mirror.local/[name]", "resolve", "react", "15.0.0"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid URL template"));
}

#[test]
fn test_url_command() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path())
        .args(["url", "react", "15.0.0", "/foo/bar"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.trim(), "https://unpkg.com/react@15.0.0/foo/bar");
}

#[test]
fn test_list() {
    let td = tempfile::tempdir().unwrap();
    let out = modcdn(td.path()).arg("list").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("react (React)"));
    assert!(stdout.contains(">= 16.0.0-alpha.7"));

    let out = modcdn(td.path()).args(["list", "--json"]).output().unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let modules = v.as_array().unwrap();
    assert!(modules
        .iter()
        .any(|m| m["name"] == "react-dom/server" && m["package"] == "react-dom"));
}

#[test]
fn test_custom_registry() {
    let td = tempfile::tempdir().unwrap();
    let registry = td.path().join("modules.json");
    std::fs::write(
        &registry,
        r#"{ "left-pad": { "var": "leftPad", "versions": {
            "^1.0.0": { "development": "/index.js", "production": "/index.min.js" }
        } } }"#,
    )
    .unwrap();
    let out = modcdn(td.path())
        .args(["--registry", registry.to_str().unwrap(), "resolve", "left-pad", "1.3.0"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("https://unpkg.com/left-pad@1.3.0/index.js"));

    let out = modcdn(td.path())
        .args(["--registry", registry.to_str().unwrap(), "resolve", "react", "15.0.0"])
        .output()
        .unwrap();
    assert!(!out.status.success(), "custom registry replaces the built-in one");
}
