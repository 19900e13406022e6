#![allow(dead_code)]

use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const HEADER: &str =
    "kind,tx_hash,network,from,to,amount,confirmations,block_number,block_hash,fee,fee_currency";

pub fn detected(tx: &str, amount: &str) -> String {
    format!("detected,{tx},bitcoin,sender,merchant,{amount},,,")
}

pub fn detected_with_fee(tx: &str, amount: &str, fee: &str, currency: &str) -> String {
    format!("detected,{tx},bitcoin,sender,merchant,{amount},,,,{fee},{currency}")
}

pub fn block(tx: &str, number: i64, hash: &str) -> String {
    format!("block,{tx},,,,,,{number},{hash}")
}

pub fn confirmations(tx: &str, count: i64) -> String {
    format!("confirmations,{tx},,,,,{count},,")
}

pub fn fee(tx: &str, amount: &str, currency: &str) -> String {
    format!("fee,{tx},,,,,,,,{amount},{currency}")
}

/// Explicit trigger rows: orphaned, back_to_mempool, dropped, failed, confirm.
pub fn trigger(kind: &str, tx: &str) -> String {
    format!("{kind},{tx},,,,,,,")
}

/// Writes the header and `rows` to a temporary feed file.
pub fn feed_file<S: AsRef<str>>(rows: &[S]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{}", row.as_ref()).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Generates a feed where every payment is detected, included and confirmed.
pub fn generate_feed(path: &Path, payments: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(HEADER.split(','))?;

    for i in 1..=payments {
        let tx = format!("0x{i:064x}");
        wtr.write_record(["detected", &tx, "bitcoin", "sender", "merchant", "50.0", "", "", "", "", ""])?;
        wtr.write_record(["block", &tx, "", "", "", "", "", &i.to_string(), "blockhash", "", ""])?;
        wtr.write_record(["confirmations", &tx, "", "", "", "", "1", "", "", "", ""])?;
    }

    wtr.flush()?;
    Ok(())
}
