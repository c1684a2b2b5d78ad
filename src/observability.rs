use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("krisbot.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("krisbot.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("krisbot.client.request_duration_seconds");

pub(crate) static SESSION_BOOTSTRAPS: Counter = Counter::new("krisbot.session.bootstraps");
pub(crate) static SESSION_BOOTSTRAP_REJECTED: Counter =
    Counter::new("krisbot.session.bootstrap_rejected");
pub(crate) static SESSION_LOGINS: Counter = Counter::new("krisbot.session.logins");
pub(crate) static SESSION_LOGIN_FAILURES: Counter = Counter::new("krisbot.session.login_failures");
pub(crate) static SESSION_REGISTRATIONS: Counter = Counter::new("krisbot.session.registrations");
pub(crate) static SESSION_REGISTRATION_FAILURES: Counter =
    Counter::new("krisbot.session.registration_failures");
pub(crate) static SESSION_LOGOUTS: Counter = Counter::new("krisbot.session.logouts");

pub(crate) static CHAT_SUBMITS: Counter = Counter::new("krisbot.chat.submits");
pub(crate) static CHAT_SUBMITS_IGNORED: Counter = Counter::new("krisbot.chat.submits_ignored");
pub(crate) static CHAT_FALLBACKS: Counter = Counter::new("krisbot.chat.fallbacks");
pub(crate) static CHAT_STALE_REPLIES: Counter = Counter::new("krisbot.chat.stale_replies");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_BOOTSTRAPS);
    collector.register_counter(&SESSION_BOOTSTRAP_REJECTED);
    collector.register_counter(&SESSION_LOGINS);
    collector.register_counter(&SESSION_LOGIN_FAILURES);
    collector.register_counter(&SESSION_REGISTRATIONS);
    collector.register_counter(&SESSION_REGISTRATION_FAILURES);
    collector.register_counter(&SESSION_LOGOUTS);

    collector.register_counter(&CHAT_SUBMITS);
    collector.register_counter(&CHAT_SUBMITS_IGNORED);
    collector.register_counter(&CHAT_FALLBACKS);
    collector.register_counter(&CHAT_STALE_REPLIES);
}
