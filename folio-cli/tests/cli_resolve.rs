use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

fn write_site(dir: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let root = dir.join("public");
    fs::create_dir_all(root.join("post"))?;
    fs::create_dir_all(root.join("tab"))?;

    fs::write(
        dir.join("site.yaml"),
        r#"
site:
  title: "Test"
  default_language: "en"
content:
  root: "public"
  fetch_concurrency: 2
"#,
    )?;

    fs::write(
        root.join("index.yaml"),
        r#"
post1:
  tag: [notes]
  en: post/hello.md
  zh: post/hello.zh.md
draft1:
  en: post/wip.md
"#,
    )?;
    fs::write(
        root.join("post/hello.md"),
        "---\ntitle: Hello\ndate: 2024-03-01\n---\n# Hello\n",
    )?;
    fs::write(
        root.join("post/hello.zh.md"),
        "---\ntitle: 你好\ndate: 2024-03-01\n---\n# 你好\n",
    )?;
    fs::write(
        root.join("post/wip.md"),
        "---\ntitle: Work in progress\nwip: on\n---\n",
    )?;
    fs::write(
        root.join("tabs.yaml"),
        "About:\n  en: {title: About, location: tab/about.md}\n",
    )?;
    Ok(())
}

#[test]
fn posts_prints_enriched_map() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    #[allow(deprecated)]
    let assert = Command::cargo_bin("folio")?
        .current_dir(dir.path())
        .args(["posts", "--lang", "中文"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    let map = value.as_object().expect("json object");
    assert!(map.contains_key("你好"));
    assert!(map.contains_key("Work in progress"));
    assert!(!map.contains_key("post1"));
    assert_eq!(map["你好"]["location"], "post/hello.zh.md");
    assert_eq!(map["你好"]["tag"][0], "notes");

    Ok(())
}

#[test]
fn posts_eager_and_published_flags() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    #[allow(deprecated)]
    let eager = Command::cargo_bin("folio")?
        .current_dir(dir.path())
        .args(["posts", "--eager"])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&eager.get_output().stdout)?;
    assert!(value.get("post1").is_some());

    #[allow(deprecated)]
    let published = Command::cargo_bin("folio")?
        .current_dir(dir.path())
        .args(["posts", "--published"])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&published.get_output().stdout)?;
    assert!(value.get("Hello").is_some());
    assert!(value.get("Work in progress").is_none());

    Ok(())
}

#[test]
fn tabs_and_languages() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("folio")?
        .current_dir(dir.path())
        .args(["tabs", "--lang", "fr"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"slug\":\"about\""));

    #[allow(deprecated)]
    Command::cargo_bin("folio")?
        .current_dir(dir.path())
        .arg("languages")
        .assert()
        .success()
        .stdout("en\nzh\n");

    Ok(())
}

#[test]
fn classify_and_normalize() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("folio")?
        .args(["classify"])
        .arg(dir.path().join("public/index.yaml"))
        .assert()
        .success()
        .stdout("simplified\n");

    #[allow(deprecated)]
    Command::cargo_bin("folio")?
        .args(["normalize", "English", "zh_TW"])
        .assert()
        .success()
        .stdout("English\ten\nzh_TW\tzh-tw\n");

    Ok(())
}

#[test]
fn missing_site_prints_empty_map() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("folio")?
        .current_dir(dir.path())
        .arg("posts")
        .assert()
        .success()
        .stdout("{}\n");

    Ok(())
}
