use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

mod common;
use common::{block, confirmations, feed_file};

fn config_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{json}").unwrap();
    file
}

#[test]
fn test_custom_policy_and_network_multiplier() {
    let config = config_file(
        r#"{"policy": {
            "tiers": [{"min_amount": "0", "confirmations": 2}],
            "network_multipliers": {"polygon": 5}
        }}"#,
    );
    let feed = feed_file(&[
        "detected,0xaa,polygon,sender,merchant,10,,,".to_string(),
        "detected,0xbb,bitcoin,sender,merchant,10,,,".to_string(),
        block("0xbb", 1, "b1"),
        confirmations("0xbb", 2),
    ]);

    let mut cmd = Command::new(cargo_bin!("payment-tracker"));
    cmd.arg(feed.path()).arg("--config").arg(config.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0xaa,detected,0,10,,10"))
        .stdout(predicate::str::contains("0xbb,confirmed,2,2,1,10"));
}

#[test]
fn test_invalid_policy_aborts() {
    let config = config_file(r#"{"policy": {"tiers": [{"min_amount": "5", "confirmations": 2}]}}"#);
    let feed = feed_file::<String>(&[]);

    let mut cmd = Command::new(cargo_bin!("payment-tracker"));
    cmd.arg(feed.path()).arg("--config").arg(config.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("First tier must start at amount 0"));
}
