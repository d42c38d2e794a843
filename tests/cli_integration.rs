//! Integration tests for the `bv` command line.
//!
//! Each test runs the real binary against a fresh project directory with an
//! isolated global config.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// A project root plus a scratch area for working files.
struct Env {
    temp: TempDir,
}

impl Env {
    fn new() -> Self {
        let env = Self {
            temp: TempDir::new().unwrap(),
        };
        env.bv("ann").arg("init").assert().success();
        env
    }

    /// `bv` acting as `user` on this project.
    fn bv(&self, user: &str) -> Command {
        let mut cmd = Command::cargo_bin("bv").unwrap();
        cmd.env("BRANCHVAULT_CONFIG", self.temp.path().join("no-global.toml"))
            .env_remove("BV_LOG")
            .arg("--cwd")
            .arg(self.temp.path().join("vault"))
            .arg("--user")
            .arg(user);
        cmd
    }

    /// Write a scratch file and return its path.
    fn scratch(&self, name: &str, content: &str) -> std::path::PathBuf {
        let file = self.temp.child("work").child(name);
        file.write_str(content).unwrap();
        file.path().to_path_buf()
    }
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("bv")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bv"));
}

#[test]
fn help_flag_works() {
    Command::cargo_bin("bv")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("version-control"));
}

#[test]
fn completion_script_is_generated() {
    Command::cargo_bin("bv")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bv"));
}

#[test]
fn init_twice_reports_existing_project() {
    let env = Env::new();
    env.temp.child("vault").assert(predicate::path::is_dir());
    env.bv("ann")
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn add_checkin_get_and_log() {
    let env = Env::new();
    let v1 = env.scratch("main.c", "int main;\n");
    env.bv("ann")
        .args(["add", "src/main.c", "-m", "first", "--from"])
        .arg(&v1)
        .assert()
        .success()
        .stdout(predicate::str::contains("as 1.1"));

    let v2 = env.scratch("main2.c", "int main(void);\n");
    env.bv("ann")
        .args(["ci", "src/main.c", "-m", "second", "--from"])
        .arg(&v2)
        .assert()
        .success()
        .stdout(predicate::str::contains("as 1.2"));

    env.bv("ann")
        .args(["get", "src/main.c"])
        .assert()
        .success()
        .stdout("int main(void);\n");
    env.bv("ann")
        .args(["get", "src/main.c", "-r", "1.1"])
        .assert()
        .success()
        .stdout("int main;\n");

    let out = env.temp.child("out/main.c");
    env.bv("ann")
        .args(["get", "src/main.c", "-o"])
        .arg(out.path())
        .assert()
        .success();
    out.assert("int main(void);\n");

    env.bv("ann")
        .args(["log", "src/main.c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2").and(predicate::str::contains("second")));
    env.bv("ann")
        .args(["ls"])
        .assert()
        .success()
        .stdout(predicate::str::contains("src/main.c"));
}

#[test]
fn unknown_file_is_an_error() {
    let env = Env::new();
    env.bv("ann")
        .args(["get", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a controlled file"));
}

#[test]
fn second_user_cannot_take_a_held_lock() {
    let env = Env::new();
    let file = env.scratch("a.txt", "a\n");
    env.bv("ann").args(["add", "a.txt", "--from"]).arg(&file).assert().success();

    env.bv("ann")
        .args(["lock", "a.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Locked"));
    env.bv("bob")
        .args(["lock", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lock requests failed"));
    env.bv("bob")
        .args(["locks", "--holder", "ann"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"));

    env.bv("ann").args(["unlock", "a.txt"]).assert().success();
    env.bv("bob").args(["lock", "a.txt"]).assert().success();
}

#[test]
fn branch_edit_promotes_into_trunk() {
    let env = Env::new();
    let base = env.scratch("doc.txt", "one\ntwo\nthree\nfour\n");
    env.bv("ann").args(["add", "doc.txt", "--from"]).arg(&base).assert().success();
    env.bv("ann")
        .args(["branch", "create", "feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created feature branch 'feature'"));

    let child = env.scratch("child.txt", "ONE\ntwo\nthree\nfour\n");
    env.bv("ann")
        .args(["ci", "doc.txt", "-b", "feature", "--from"])
        .arg(&child)
        .assert()
        .success()
        .stdout(predicate::str::contains("1.1.1.1"));
    let parent = env.scratch("parent.txt", "one\ntwo\nthree\nFOUR\n");
    env.bv("ann").args(["ci", "doc.txt", "--from"]).arg(&parent).assert().success();

    env.bv("ann")
        .args(["candidates", "-b", "feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("doc.txt"));
    env.bv("ann")
        .args(["promote", "-b", "feature", "--checkin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("into 'trunk' as 1.3"));

    env.bv("ann")
        .args(["get", "doc.txt"])
        .assert()
        .success()
        .stdout("ONE\ntwo\nthree\nFOUR\n");
    env.bv("ann")
        .args(["candidates", "-b", "feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to promote"));
}

#[test]
fn promote_without_flags_writes_the_merge_to_the_current_directory() {
    let env = Env::new();
    let base = env.scratch("doc.txt", "one\ntwo\n");
    env.bv("ann").args(["add", "doc.txt", "--from"]).arg(&base).assert().success();
    env.bv("ann").args(["branch", "create", "feature"]).assert().success();
    let edit = env.scratch("edit.txt", "ONE\ntwo\n");
    env.bv("ann")
        .args(["ci", "doc.txt", "-b", "feature", "--from"])
        .arg(&edit)
        .assert()
        .success();

    let here = env.temp.child("trunk-work");
    here.create_dir_all().unwrap();
    env.bv("ann")
        .current_dir(here.path())
        .args(["promote", "-b", "feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not checked in"));
    here.child("doc.txt").assert("ONE\ntwo\n");
}

#[test]
fn delete_and_undelete_round_trip() {
    let env = Env::new();
    let file = env.scratch("gone.txt", "bye\n");
    env.bv("ann").args(["add", "gone.txt", "--from"]).arg(&file).assert().success();
    env.bv("ann").args(["rm", "gone.txt"]).assert().success();
    env.bv("ann").args(["get", "gone.txt"]).assert().failure();
    env.bv("ann")
        .args(["undelete", "gone.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored"));
    env.bv("ann").args(["get", "gone.txt"]).assert().success().stdout("bye\n");
}

#[test]
fn keyword_files_expand_on_get_unless_raw() {
    let env = Env::new();
    let file = env.scratch("id.c", "/* $Revision$ $Author$ */\n");
    env.bv("ann")
        .args(["add", "id.c", "--keywords", "--from"])
        .arg(&file)
        .assert()
        .success();
    env.bv("ann")
        .args(["get", "id.c"])
        .assert()
        .success()
        .stdout("/* $Revision: 1.1 $ $Author: ann $ */\n");
    env.bv("ann")
        .args(["get", "id.c", "--raw"])
        .assert()
        .success()
        .stdout("/* $Revision$ $Author$ */\n");
}

#[test]
fn read_only_branch_refuses_checkin() {
    let env = Env::new();
    let file = env.scratch("r.txt", "r\n");
    env.bv("ann").args(["add", "r.txt", "--from"]).arg(&file).assert().success();
    env.bv("ann")
        .args(["branch", "create", "release-1", "--read-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("read-only branch 'release-1'"));
    env.bv("ann")
        .args(["branch", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("release-1 (from trunk) [read-only]"));

    env.bv("ann")
        .args(["ci", "r.txt", "-b", "release-1", "--from"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));
    env.bv("ann")
        .args(["get", "r.txt", "-b", "release-1"])
        .assert()
        .success()
        .stdout("r\n");
}
