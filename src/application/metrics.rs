//! Counter names and recorders shared by the mutation services.

use metrics::counter;

pub const METRIC_MUTATIONS_TOTAL: &str = "blogboard_mutations_total";
pub const METRIC_STORE_FAILURES_TOTAL: &str = "blogboard_store_failures_total";

pub fn record_mutation(kind: &'static str) {
    counter!(METRIC_MUTATIONS_TOTAL, "kind" => kind).increment(1);
}

pub fn record_store_failure(kind: &'static str) {
    counter!(METRIC_STORE_FAILURES_TOTAL, "kind" => kind).increment(1);
}
