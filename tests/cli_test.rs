//! CLI integration tests for the hyperroute binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("hyperroute"))
}

fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const BLOG_SCHEMA: &str = r#"{
    "properties": {
        "id": { "type": "integer", "minimum": 1 }
    },
    "links": [
        { "rel": "self", "href": "/blog/{id}", "method": "GET",
          "description": "Fetch one entry" },
        { "rel": "create", "href": "/blog", "method": "POST",
          "schema": {
              "type": "object",
              "properties": {
                  "name": { "type": "string" },
                  "age": { "type": "integer", "minimum": 0 }
              },
              "required": ["name", "age"]
          } }
    ]
}"#;

mod routes_command {
    use super::*;

    #[test]
    fn prints_route_table() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "blog.json", BLOG_SCHEMA);

        cmd()
            .args(["routes", &format!("{}/*.json", dir.path().display())])
            .assert()
            .success()
            .stdout(predicate::str::contains("GET"))
            .stdout(predicate::str::contains("/blog/{id}"))
            .stdout(predicate::str::contains("Fetch one entry"))
            .stdout(predicate::str::contains("2 routes from 1 files"));
    }

    #[test]
    fn json_output_lists_validated_sources() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "blog.json", BLOG_SCHEMA);

        cmd()
            .args([
                "routes",
                &format!("{}/*.json", dir.path().display()),
                "--json",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""method": "POST""#))
            .stdout(predicate::str::contains(r#""payload""#))
            .stdout(predicate::str::contains(r#""params""#));
    }

    #[test]
    fn strict_mode_fails_on_undeclared_placeholder() {
        let dir = TempDir::new().unwrap();
        write_temp_file(
            &dir,
            "bad.json",
            r#"{ "links": [ { "rel": "self", "href": "/x/{mystery}", "method": "GET" } ] }"#,
        );

        cmd()
            .args([
                "routes",
                &format!("{}/*.json", dir.path().display()),
                "--strict",
            ])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("mystery"));
    }

    #[test]
    fn invalid_json_is_schema_error() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "broken.json", "not json");

        cmd()
            .args(["routes", &format!("{}/*.json", dir.path().display())])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }
}

mod check_command {
    use super::*;

    #[test]
    fn valid_payload_passes() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "blog.json", BLOG_SCHEMA);
        let value = write_temp_file(&dir, "value.json", r#"{ "name": "Liz", "age": 25 }"#);

        cmd()
            .args([
                "check",
                schema.to_str().unwrap(),
                "--rel",
                "create",
                "--source",
                "payload",
                "--value",
                value.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid"));
    }

    #[test]
    fn invalid_payload_exits_one_with_errors() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "blog.json", BLOG_SCHEMA);
        let value = write_temp_file(&dir, "value.json", r#"{ "age": -1 }"#);

        cmd()
            .args([
                "check",
                schema.to_str().unwrap(),
                "--rel",
                "create",
                "--source",
                "payload",
                "--value",
                value.to_str().unwrap(),
            ])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Validation failed"));
    }

    #[test]
    fn json_report_shape() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "blog.json", BLOG_SCHEMA);
        let value = write_temp_file(&dir, "value.json", r#"{ "age": -1 }"#);

        cmd()
            .args([
                "check",
                schema.to_str().unwrap(),
                "--rel",
                "create",
                "--source",
                "payload",
                "--value",
                value.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains(r#""valid":false"#))
            .stdout(predicate::str::contains(r#""errors""#));
    }

    #[test]
    fn params_are_coerced_before_validation() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "blog.json", BLOG_SCHEMA);
        let value = write_temp_file(&dir, "params.json", r#"{ "id": "25" }"#);

        cmd()
            .args([
                "check",
                schema.to_str().unwrap(),
                "--rel",
                "self",
                "--source",
                "params",
                "--value",
                value.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""id": 25"#));
    }

    #[test]
    fn form_content_type_gates_payload_coercion() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "blog.json", BLOG_SCHEMA);
        let value = write_temp_file(&dir, "value.json", r#"{ "name": "Liz", "age": "25" }"#);

        cmd()
            .args([
                "check",
                schema.to_str().unwrap(),
                "--rel",
                "create",
                "--source",
                "payload",
                "--value",
                value.to_str().unwrap(),
                "--content-type",
                "application/x-www-form-urlencoded",
            ])
            .assert()
            .success();

        cmd()
            .args([
                "check",
                schema.to_str().unwrap(),
                "--rel",
                "create",
                "--source",
                "payload",
                "--value",
                value.to_str().unwrap(),
                "--content-type",
                "application/json",
            ])
            .assert()
            .failure()
            .code(1);
    }

    #[test]
    fn unknown_rel_is_an_error() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "blog.json", BLOG_SCHEMA);
        let value = write_temp_file(&dir, "value.json", "{}");

        cmd()
            .args([
                "check",
                schema.to_str().unwrap(),
                "--rel",
                "destroy",
                "--source",
                "payload",
                "--value",
                value.to_str().unwrap(),
            ])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("no link with rel"));
    }

    #[test]
    fn link_without_declared_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "blog.json", BLOG_SCHEMA);
        let value = write_temp_file(&dir, "value.json", "{}");

        cmd()
            .args([
                "check",
                schema.to_str().unwrap(),
                "--rel",
                "self",
                "--source",
                "payload",
                "--value",
                value.to_str().unwrap(),
            ])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("declares no payload validation"));
    }
}
