use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;
use common::{detected, feed_file};

#[test]
fn test_confirmation_tier_boundaries() {
    let feed = feed_file(&[
        detected("0x01", "99.99"),
        detected("0x02", "100.00"),
        detected("0x03", "9999.99"),
        detected("0x04", "10000.00"),
    ]);

    let mut cmd = Command::new(cargo_bin!("payment-tracker"));
    cmd.arg(feed.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0x01,detected,0,1,,99.99"))
        .stdout(predicate::str::contains("0x02,detected,0,12,,100"))
        .stdout(predicate::str::contains("0x03,detected,0,12,,9999.99"))
        .stdout(predicate::str::contains("0x04,detected,0,19,,10000"));
}

#[test]
fn test_extreme_values() {
    let feed = feed_file(&[
        detected("0x01", "0.00000001"),
        format!("block,0x01,,,,,,{},tip", i64::MAX),
        format!("confirmations,0x01,,,,,{},,", i64::MAX),
    ]);

    let mut cmd = Command::new(cargo_bin!("payment-tracker"));
    cmd.arg(feed.path());

    cmd.assert().success().stdout(predicate::str::contains(format!(
        "0x01,confirmed,{},1,{},0.00000001",
        i64::MAX,
        i64::MAX
    )));
}

#[test]
fn test_zero_amount_is_rejected() {
    let feed = feed_file(&[detected("0x01", "0")]);

    let mut cmd = Command::new(cargo_bin!("payment-tracker"));
    cmd.arg(feed.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Amount must be positive"))
        .stdout(predicate::str::contains("0x01").not());
}
