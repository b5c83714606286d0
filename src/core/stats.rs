//! Running totals for one batch.

/// Byte-savings totals for one batch invocation.
///
/// Only successful items contribute to the savings figures. Remote transforms can
/// return larger files than they were given, so savings are signed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Items that produced a result.
    pub processed: usize,
    /// Items skipped (size limit, no reduction, cancelled).
    pub skipped: usize,
    /// Items that failed (decode, encode, remote call).
    pub failed: usize,
    /// Sum of `original - output` over successful items.
    pub total_saved: i64,
    /// Sum of original sizes over successful items.
    pub original_bytes: u64,
    /// Sum of output sizes over successful items.
    pub output_bytes: u64,
}

impl BatchStats {
    pub fn record_success(&mut self, original_size: u64, output_size: u64) {
        self.processed += 1;
        self.total_saved += original_size as i64 - output_size as i64;
        self.original_bytes += original_size;
        self.output_bytes += output_size;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Items seen, whatever their outcome.
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }

    /// Mean bytes saved per successful item; zero when nothing succeeded.
    pub fn average_saved(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.total_saved as f64 / self.processed as f64
    }

    /// Output size as a percentage of the original, over successful items.
    pub fn size_ratio_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        self.output_bytes as f64 * 100.0 / self.original_bytes as f64
    }
}

/// Bytes as KiB with one decimal, the unit user-facing messages use.
pub fn format_kib(bytes: i64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}
