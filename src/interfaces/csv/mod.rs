pub mod feed_reader;
pub mod payment_writer;
