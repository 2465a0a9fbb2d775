use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("gemchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("gemchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("gemchat.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("gemchat.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("gemchat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("gemchat.stream.bytes");

pub(crate) static ACCUMULATED_FRAGMENTS: Counter =
    Counter::new("gemchat.accumulator.fragments");
pub(crate) static ACCUMULATOR_CANCELLED: Counter =
    Counter::new("gemchat.accumulator.cancelled");

pub(crate) static SENDS: Counter = Counter::new("gemchat.chat.sends");
pub(crate) static SEND_REJECTED: Counter = Counter::new("gemchat.chat.send_rejected");
pub(crate) static SEND_FAILURES: Counter = Counter::new("gemchat.chat.send_failures");
pub(crate) static SEND_DURATION: Moments = Moments::new("gemchat.chat.send_duration_seconds");

pub(crate) static STORE_SAVES: Counter = Counter::new("gemchat.store.saves");
pub(crate) static STORE_SAVE_ERRORS: Counter = Counter::new("gemchat.store.save_errors");
pub(crate) static STORE_LOAD_DISCARDS: Counter = Counter::new("gemchat.store.load_discards");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&ACCUMULATED_FRAGMENTS);
    collector.register_counter(&ACCUMULATOR_CANCELLED);

    collector.register_counter(&SENDS);
    collector.register_counter(&SEND_REJECTED);
    collector.register_counter(&SEND_FAILURES);
    collector.register_moments(&SEND_DURATION);

    collector.register_counter(&STORE_SAVES);
    collector.register_counter(&STORE_SAVE_ERRORS);
    collector.register_counter(&STORE_LOAD_DISCARDS);
}
