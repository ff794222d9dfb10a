//! End-to-end tests of the binary surface: argument parsing, validation exit
//! codes, and the messages operators actually see. Nothing here talks to the
//! network.

use assert_cmd::Command;
use predicates::prelude::*;

fn armgrab() -> Command {
    Command::cargo_bin("armgrab").expect("binary builds")
}

#[test]
fn help_describes_the_tool() {
    armgrab()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("retrying until it lands"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn missing_plan_is_a_configuration_error() {
    armgrab()
        .args(["--config", "/nonexistent/armgrab.toml", "validate"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration error"))
        .stderr(predicate::str::contains("failed to read launch plan"));
}

#[test]
fn placeholder_plan_is_rejected_before_any_attempt() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let plan = dir.path().join("armgrab.toml");
    std::fs::write(
        &plan,
        r#"
            [instance]
            display_name = "app-server"
            compartment_id = "REPLACE_WITH_YOUR_COMPARTMENT_OCID"
            availability_domain = "hWFp:AP-HYDERABAD-1-AD-1"
            shape = "VM.Standard.A1.Flex"
            ocpus = 2.0
            memory_in_gbs = 12.0
            image_id = "ocid1.image.oc1..bbbb"
            subnet_id = "ocid1.subnet.oc1..cccc"
            ssh_authorized_keys = "ssh-ed25519 AAAAC3Nza operator@laptop"
        "#,
    )
    .expect("write plan");

    armgrab()
        .args(["--config"])
        .arg(&plan)
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("compartment_id"))
        .stderr(predicate::str::contains("REPLACE_WITH"));
}

#[test]
fn zero_interval_is_rejected_by_argument_parsing() {
    armgrab()
        .args(["--interval", "0", "validate"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--interval"));
}

#[test]
fn completion_generates_a_script() {
    armgrab()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("armgrab"));
}
