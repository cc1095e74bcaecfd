//! CLI integration tests for Wharf.
//!
//! These tests drive the full pipeline: forced-linkage mutation, the
//! external build step, binary fusion, package assembly, and reference
//! synchronization. The build step and fusion tool are stand-in shell
//! scripts, so the tests are unix-only.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the wharf binary command.
fn wharf() -> Command {
    let mut cmd = Command::cargo_bin("wharf").unwrap();
    cmd.env_remove("WHARF_REPOSITORY");
    cmd
}

/// A library project with headers, forced-linkage units, and resources.
fn write_project(dir: &Path) {
    fs::create_dir_all(dir.join("include")).unwrap();
    fs::create_dir_all(dir.join("src")).unwrap();
    fs::create_dir_all(dir.join("assets")).unwrap();

    fs::write(dir.join("include/mylib.h"), "#pragma once\n").unwrap();
    fs::write(dir.join("src/engine.c"), "int engine(void) { return 1; }\n").unwrap();
    fs::write(dir.join("src/plugin.c"), "int plugin(void) { return 2; }\n").unwrap();
    fs::write(dir.join("assets/mylib_icon.png"), "icon").unwrap();
    fs::write(dir.join("assets/free.png"), "free").unwrap();

    fs::write(dir.join("Headers.list"), "include/mylib.h\n").unwrap();
    fs::write(dir.join("ForceLink.list"), "src/engine.c\nsrc/plugin.c\n").unwrap();
}

/// A stand-in for `lipo -create <inputs> -output <out>`: concatenates the
/// inputs into the output so tests can verify every slot was fused.
fn write_fake_lipo(dir: &Path) -> PathBuf {
    let path = dir.join("fake-lipo");
    fs::write(
        &path,
        r#"#!/bin/sh
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-output" ]; then out="$a"; fi
  prev="$a"
done
: > "$out"
prev=""
for a in "$@"; do
  case "$a" in
    -create|-output) ;;
    *) if [ "$prev" != "-output" ]; then cat "$a" >> "$out"; fi ;;
  esac
  prev="$a"
done
"#,
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Project config wiring the stand-in build command and fusion tool.
fn write_config(project: &Path, build_command: &str, lipo: &Path) {
    fs::create_dir_all(project.join(".wharf")).unwrap();
    fs::write(
        project.join(".wharf/config.toml"),
        format!(
            "[package]\nbuild_command = [\"/bin/sh\", \"-c\", \"{}\"]\n\n[tools]\nlipo = \"{}\"\n",
            build_command,
            lipo.display()
        ),
    )
    .unwrap();
}

const BUILD_ALL: &str =
    "mkdir -p build/{configuration}-{arch} && printf {arch} > build/{configuration}-{arch}/lib{name}.a";

// ============================================================================
// wharf package
// ============================================================================

#[test]
fn test_package_assembles_full_layout() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("mylib");
    write_project(&project);
    let lipo = write_fake_lipo(tmp.path());
    write_config(&project, BUILD_ALL, &lipo);
    let repository = tmp.path().join("repository");

    wharf()
        .args([
            "package",
            "Release",
            "--name",
            "mylib",
            "--version-tag",
            "1.0",
            "--arch",
            "arm64",
            "--arch",
            "x86_64",
            "--repository",
        ])
        .arg(&repository)
        .current_dir(&project)
        .assert()
        .success()
        .stderr(predicate::str::contains("free.png"));

    let pkg = repository.join("mylib-1.0-Release");
    assert!(pkg.is_dir());

    // Universal binary fused from both architecture slots
    let binary = fs::read_to_string(pkg.join("mylib.framework/mylib")).unwrap();
    assert_eq!(binary, "arm64x86_64");

    assert!(pkg.join("mylib.framework/Info.plist").is_file());
    assert!(pkg.join("mylib.framework/Headers/mylib.h").is_file());
    assert!(pkg.join("Headers/mylib.h").is_file());
    assert!(pkg.join("Resources/assets/mylib_icon.png").is_file());
    assert!(pkg.join("Resources/assets/free.png").is_file());

    // Bootstrap unit covers every forced-linkage trampoline
    let bootstrap = fs::read_to_string(pkg.join("mylib_bootstrap.c")).unwrap();
    assert!(bootstrap.contains("extern void wharf_keep_engine(void);"));
    assert!(bootstrap.contains("extern void wharf_keep_plugin(void);"));
    assert!(bootstrap.contains("void mylib_force_link(void)"));

    // Source units are bit-for-bit back to their pre-mutation state
    assert_eq!(
        fs::read_to_string(project.join("src/engine.c")).unwrap(),
        "int engine(void) { return 1; }\n"
    );
    assert!(!project.join("src/engine.c.wharf-orig").exists());
    assert!(!project.join("src/plugin.c.wharf-orig").exists());
}

#[test]
fn test_package_sees_trampolines_during_build() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("mylib");
    write_project(&project);
    let lipo = write_fake_lipo(tmp.path());
    // The build step copies the mutated unit into the library so the test
    // can observe what the compiler would have seen.
    let build = "mkdir -p build/{configuration}-{arch} && cat src/engine.c > build/{configuration}-{arch}/lib{name}.a";
    write_config(&project, build, &lipo);
    let repository = tmp.path().join("repository");

    wharf()
        .args([
            "package",
            "Release",
            "--name",
            "mylib",
            "--arch",
            "arm64",
            "--repository",
        ])
        .arg(&repository)
        .current_dir(&project)
        .assert()
        .success();

    let binary =
        fs::read_to_string(repository.join("mylib-Release/mylib.framework/mylib")).unwrap();
    assert!(binary.contains("void wharf_keep_engine(void)"));
}

#[test]
fn test_package_missing_arch_binary_fails_and_leaves_no_package() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("mylib");
    write_project(&project);
    let lipo = write_fake_lipo(tmp.path());
    // Only the arm64 slot produces a binary
    let build = "mkdir -p build/{configuration}-{arch}; if [ {arch} = arm64 ]; then printf {arch} > build/{configuration}-{arch}/lib{name}.a; fi";
    write_config(&project, build, &lipo);
    let repository = tmp.path().join("repository");

    wharf()
        .args([
            "package",
            "Release",
            "--name",
            "mylib",
            "--arch",
            "arm64",
            "--arch",
            "x86_64",
            "--repository",
        ])
        .arg(&repository)
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("x86_64"));

    // No package directory under the target name, sources restored
    assert!(!repository.join("mylib-Release").exists());
    assert_eq!(
        fs::read_to_string(project.join("src/engine.c")).unwrap(),
        "int engine(void) { return 1; }\n"
    );
    assert!(!project.join("src/engine.c.wharf-orig").exists());
}

#[test]
fn test_package_build_failure_restores_sources() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("mylib");
    write_project(&project);
    let lipo = write_fake_lipo(tmp.path());
    write_config(&project, "exit 1", &lipo);
    let repository = tmp.path().join("repository");

    wharf()
        .args([
            "package",
            "Release",
            "--name",
            "mylib",
            "--arch",
            "arm64",
            "--repository",
        ])
        .arg(&repository)
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("build step failed"));

    assert_eq!(
        fs::read_to_string(project.join("src/engine.c")).unwrap(),
        "int engine(void) { return 1; }\n"
    );
    assert_eq!(
        fs::read_to_string(project.join("src/plugin.c")).unwrap(),
        "int plugin(void) { return 2; }\n"
    );
    assert!(!project.join("src/engine.c.wharf-orig").exists());
    assert!(!repository.join("mylib-Release").exists());
}

#[test]
fn test_package_missing_header_fails() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("mylib");
    write_project(&project);
    fs::write(project.join("Headers.list"), "include/gone.h\n").unwrap();
    let lipo = write_fake_lipo(tmp.path());
    write_config(&project, BUILD_ALL, &lipo);

    wharf()
        .args([
            "package",
            "Release",
            "--name",
            "mylib",
            "--arch",
            "arm64",
            "--repository",
        ])
        .arg(tmp.path().join("repository"))
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing declared public header"));
}

#[test]
fn test_package_reject_policy_fails_on_unprefixed_resource() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("mylib");
    write_project(&project);
    let lipo = write_fake_lipo(tmp.path());
    write_config(&project, BUILD_ALL, &lipo);
    let repository = tmp.path().join("repository");

    wharf()
        .args([
            "package",
            "Release",
            "--name",
            "mylib",
            "--arch",
            "arm64",
            "--resource-policy",
            "reject",
            "--repository",
        ])
        .arg(&repository)
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("free.png"));

    assert!(!repository.join("mylib-Release").exists());
}

#[test]
fn test_package_trampoline_collision_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("mylib");
    write_project(&project);
    // Distinct files, same derived identifier
    fs::write(project.join("src/My-Lib.c"), "int a;\n").unwrap();
    fs::write(project.join("src/my_lib.c"), "int b;\n").unwrap();
    fs::write(project.join("ForceLink.list"), "src/My-Lib.c\nsrc/my_lib.c\n").unwrap();
    let lipo = write_fake_lipo(tmp.path());
    write_config(&project, BUILD_ALL, &lipo);

    wharf()
        .args([
            "package",
            "Release",
            "--name",
            "mylib",
            "--arch",
            "arm64",
            "--repository",
        ])
        .arg(tmp.path().join("repository"))
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate trampoline identifier"));

    // Nothing was mutated
    assert_eq!(fs::read_to_string(project.join("src/My-Lib.c")).unwrap(), "int a;\n");
    assert!(!project.join("src/My-Lib.c.wharf-orig").exists());
}

#[test]
fn test_package_source_only_layout() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("mylib");
    write_project(&project);
    let repository = tmp.path().join("repository");

    wharf()
        .args([
            "package",
            "Release",
            "--name",
            "mylib",
            "--source-only",
            "--repository",
        ])
        .arg(&repository)
        .current_dir(&project)
        .assert()
        .success();

    let pkg = repository.join("mylib-Release");
    assert!(pkg.join("Sources/src/engine.c").is_file());
    assert!(pkg.join("Headers/mylib.h").is_file());
    // No binary and no bootstrap unit in a source package
    assert!(!pkg.join("mylib.framework/mylib").exists());
    assert!(!pkg.join("mylib_bootstrap.c").exists());
}

// ============================================================================
// wharf sync
// ============================================================================

fn write_repo_package(repository: &Path, identity: &str) {
    fs::create_dir_all(repository.join(identity)).unwrap();
}

#[test]
fn test_sync_creates_and_prunes_references() {
    let tmp = TempDir::new().unwrap();
    let workspace = tmp.path().join("app");
    let repository = tmp.path().join("repository");
    fs::create_dir_all(&workspace).unwrap();
    write_repo_package(&repository, "alpha-1.0-Release");
    write_repo_package(&repository, "beta-Release");

    // Declare alpha
    fs::write(workspace.join("Deps.list"), "alpha 1.0\n").unwrap();
    wharf()
        .args(["sync", "--repository"])
        .arg(&repository)
        .current_dir(&workspace)
        .assert()
        .success()
        .stderr(predicate::str::contains("Linked alpha-1.0-Release"));

    let alpha = workspace.join("Packages/alpha-1.0-Release");
    assert_eq!(fs::read_link(&alpha).unwrap(), repository.join("alpha-1.0-Release"));

    // An unrelated file the tool must never touch
    fs::write(workspace.join("Packages/notes.txt"), "mine").unwrap();

    // Redeclare: beta replaces alpha
    fs::write(workspace.join("Deps.list"), "beta\n").unwrap();
    wharf()
        .args(["sync", "--repository"])
        .arg(&repository)
        .current_dir(&workspace)
        .assert()
        .success()
        .stderr(predicate::str::contains("Pruned alpha-1.0-Release"));

    assert!(!alpha.exists());
    assert!(workspace.join("Packages/beta-Release").exists());
    assert!(workspace.join("Packages/notes.txt").is_file());
}

#[test]
fn test_sync_unresolved_is_nonfatal() {
    let tmp = TempDir::new().unwrap();
    let workspace = tmp.path().join("app");
    let repository = tmp.path().join("repository");
    fs::create_dir_all(&workspace).unwrap();
    write_repo_package(&repository, "beta-Release");

    fs::write(workspace.join("Deps.list"), "ghost 9.9\nbeta\n").unwrap();

    wharf()
        .args(["sync", "--repository"])
        .arg(&repository)
        .current_dir(&workspace)
        .assert()
        .success()
        .stderr(predicate::str::contains("no package `ghost-9.9-Release`"));

    assert!(workspace.join("Packages/beta-Release").exists());
    assert!(!workspace.join("Packages/ghost-9.9-Release").exists());
}

#[test]
fn test_sync_missing_deps_list_fails() {
    let tmp = TempDir::new().unwrap();
    let workspace = tmp.path().join("app");
    fs::create_dir_all(&workspace).unwrap();

    wharf()
        .args(["sync", "--repository"])
        .arg(tmp.path().join("repository"))
        .current_dir(&workspace)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Deps.list"));
}

// ============================================================================
// wharf completions
// ============================================================================

#[test]
fn test_completions_bash() {
    wharf()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wharf"));
}
