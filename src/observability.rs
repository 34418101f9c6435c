use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatterbox.client.requests");
pub(crate) static CLIENT_TRANSPORT_ERRORS: Counter =
    Counter::new("chatterbox.client.transport_errors");
pub(crate) static CLIENT_APPLICATION_ERRORS: Counter =
    Counter::new("chatterbox.client.application_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatterbox.client.request_duration_seconds");

pub(crate) static CHAT_SENDS: Counter = Counter::new("chatterbox.chat.sends");
pub(crate) static CHAT_REJECTED: Counter = Counter::new("chatterbox.chat.rejected");
pub(crate) static CHAT_FAILURES: Counter = Counter::new("chatterbox.chat.failures");
pub(crate) static CHAT_ROUND_TRIP: Moments = Moments::new("chatterbox.chat.round_trip_seconds");

pub(crate) static SESSIONS_CREATED: Counter = Counter::new("chatterbox.sessions.created");
pub(crate) static SESSIONS_DELETED: Counter = Counter::new("chatterbox.sessions.deleted");

pub(crate) static CONTEXT_UPLOADS: Counter = Counter::new("chatterbox.contexts.uploads");
pub(crate) static CONTEXT_DELETES: Counter = Counter::new("chatterbox.contexts.deletes");

pub(crate) static PROXY_TESTS: Counter = Counter::new("chatterbox.proxy.tests");
pub(crate) static MODEL_SWITCHES: Counter = Counter::new("chatterbox.models.switches");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_TRANSPORT_ERRORS);
    collector.register_counter(&CLIENT_APPLICATION_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_SENDS);
    collector.register_counter(&CHAT_REJECTED);
    collector.register_counter(&CHAT_FAILURES);
    collector.register_moments(&CHAT_ROUND_TRIP);

    collector.register_counter(&SESSIONS_CREATED);
    collector.register_counter(&SESSIONS_DELETED);

    collector.register_counter(&CONTEXT_UPLOADS);
    collector.register_counter(&CONTEXT_DELETES);

    collector.register_counter(&PROXY_TESTS);
    collector.register_counter(&MODEL_SWITCHES);
}
