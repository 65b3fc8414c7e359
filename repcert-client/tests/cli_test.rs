//! Tests for the `repcert` binary's argument handling.
//!
//! Bad arguments must be refused before any key is loaded or node contacted,
//! so these run with no key in the environment and nothing listening.

use std::process::{Command, Output};
use tempfile::TempDir;

const CID: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
const OWNER: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

fn repcert(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_repcert"))
        .current_dir(dir.path())
        .env_remove("PRIVATE_KEY")
        .env_remove("RUST_LOG")
        .args(["--network", "localnet"])
        .args(args)
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_bad_recipient_is_refused_before_key_lookup() {
    let dir = TempDir::new().unwrap();
    let output = repcert(
        &dir,
        &["mint-certificate", "--to", "not-an-address", "--cid", CID, "1"],
    );

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("invalid address"), "{stderr}");
    assert!(!stderr.contains("private key not set"), "{stderr}");
}

#[test]
fn test_bad_cid_is_refused_before_key_lookup() {
    let dir = TempDir::new().unwrap();
    let output = repcert(
        &dir,
        &["mint-certificate", "--to", OWNER, "--cid", "not a cid", "1"],
    );

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("invalid content identifier"), "{stderr}");
}

#[test]
fn test_bad_deal_is_refused_before_key_lookup() {
    let dir = TempDir::new().unwrap();
    let output = repcert(&dir, &["add-deal", "--cid", CID, "1", "2 3"]);

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("invalid deal id"), "{stderr}");
    assert!(!stderr.contains("private key not set"), "{stderr}");
}

#[test]
fn test_valid_arguments_then_need_a_key() {
    let dir = TempDir::new().unwrap();
    let output = repcert(&dir, &["add-deal", "--cid", CID, "1"]);

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("private key not set"), "{stderr}");
}
