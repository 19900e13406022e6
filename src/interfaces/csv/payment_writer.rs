use crate::domain::payment::Payment;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct PaymentRow<'a> {
    tx_hash: &'a str,
    status: &'static str,
    confirmations: u64,
    required: u64,
    block_number: Option<u64>,
    amount: Decimal,
}

impl<'a> From<&'a Payment> for PaymentRow<'a> {
    fn from(payment: &'a Payment) -> Self {
        Self {
            tx_hash: payment.tx_hash().as_str(),
            status: payment.status().as_str(),
            confirmations: payment.confirmations().value(),
            required: payment.required_confirmations(),
            block_number: payment.block_info().map(|b| b.number()),
            amount: payment.amount().value().normalize(),
        }
    }
}

/// Writes final payment states as CSV.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes one row per payment, in the given order, then flushes.
    pub fn write_payments<'a, I>(&mut self, payments: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        let mut wrote_any = false;
        for payment in payments {
            self.writer.serialize(PaymentRow::from(payment))?;
            wrote_any = true;
        }
        if !wrote_any {
            // Serde only emits the header alongside the first row.
            self.writer.write_record([
                "tx_hash",
                "status",
                "confirmations",
                "required",
                "block_number",
                "amount",
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
