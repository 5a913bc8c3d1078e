//! The shared send pipeline, driven through the built-in backends
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use smsgate_common::{Envelope, Message, Phone, Sms};
use smsgate_transport::{
    Clock, FactoryContext, ManualClock, MessageHooks, PipelineTransport, ResolveError,
    SentMessage, Transport, Transports,
    backends::{Inbox, null::NullDeliver},
};

fn message() -> Message {
    Message::from(Sms::new().from("+100").to(["+200"]).text("Hello"))
}

/// Seconds since `start` at which each of `count` sends completed
fn completion_times(transport: &dyn Transport, clock: &ManualClock, count: usize) -> Vec<u64> {
    let start = clock.now();

    (0..count)
        .map(|_| {
            transport.send(&message(), None).unwrap().unwrap();
            (clock.now() - start).as_secs()
        })
        .collect()
}

#[test]
fn test_throttle_spaces_sends() {
    let clock = ManualClock::new();
    let transport = PipelineTransport::new(NullDeliver)
        .with_clock(Arc::new(clock.clone()))
        .with_max_per_second(0.2);

    assert_eq!(completion_times(&transport, &clock, 4), vec![0, 5, 10, 15]);
}

#[test]
fn test_throttle_disabled() {
    let clock = ManualClock::new();
    let transport = PipelineTransport::new(NullDeliver)
        .with_clock(Arc::new(clock.clone()))
        .with_max_per_second(0.2);

    transport.set_max_per_second(0.0);
    assert_eq!(completion_times(&transport, &clock, 4), vec![0, 0, 0, 0]);

    transport.set_max_per_second(-1.0);
    assert_eq!(completion_times(&transport, &clock, 2), vec![0, 0]);
    assert!(clock.sleeps().is_empty());
}

#[test]
fn test_throttle_from_dsn_option() {
    let clock = ManualClock::new();
    let context = FactoryContext {
        clock: Arc::new(clock.clone()),
        max_per_second: 10.0,
        ..FactoryContext::default()
    };
    let transports = Transports::with_defaults(&context, Inbox::new());

    let transport = transports.from_string("sms://null?max_per_second=0.5").unwrap();
    assert_eq!(completion_times(transport.as_ref(), &clock, 3), vec![0, 2, 4]);

    // without the option the context default applies
    let transport = transports.from_string("sms://null").unwrap();
    let before = clock.sleeps().len();
    transport.send(&message(), None).unwrap();
    transport.send(&message(), None).unwrap();
    assert_eq!(clock.sleeps()[before..], [Duration::from_millis(100)]);
}

#[test]
fn test_unusable_rate_rejected_at_resolution() {
    let clock = ManualClock::new();
    let context = FactoryContext {
        clock: Arc::new(clock.clone()),
        ..FactoryContext::default()
    };
    let transports = Transports::with_defaults(&context, Inbox::new());

    for dsn in [
        "sms://null?max_per_second=1e-20",
        "sms://null?max_per_second=NaN",
        "sms://memory?max_per_second=inf",
    ] {
        let err = transports.from_string(dsn).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidOption { .. }), "{dsn}: {err}");
    }

    // a tiny rate is fine as long as its spacing fits a Duration
    let transport = transports.from_string("sms://null?max_per_second=1e-15").unwrap();
    transport.send(&message(), None).unwrap();
    transport.send(&message(), None).unwrap();
    assert_eq!(clock.sleeps().len(), 1);
}

#[derive(Debug, Default)]
struct Observer {
    seen: Mutex<Vec<(usize, usize)>>,
}

impl MessageHooks for Observer {
    fn before_send(&self, message: Message, mut envelope: Envelope) -> (Message, Envelope) {
        envelope.set_from(Phone::new("+999"));
        (message, envelope)
    }

    fn after_send(&self, sent: &SentMessage) {
        self.seen.lock().push((
            sent.result().successes().len(),
            sent.result().errors().len(),
        ));
    }
}

#[test]
fn test_hooks_see_every_delivery() {
    let observer = Arc::new(Observer::default());
    let inbox = Inbox::new();
    let context = FactoryContext {
        hooks: observer.clone(),
        ..FactoryContext::default()
    };
    let transport = Transports::with_defaults(&context, inbox.clone())
        .from_string("sms://memory")
        .unwrap();

    let sent = transport.send(&message(), None).unwrap().unwrap();

    assert_eq!(sent.envelope().from().unwrap(), &Phone::new("+999"));
    assert_eq!(inbox.messages()[0].from, Phone::new("+999"));
    assert_eq!(*observer.seen.lock(), vec![(1, 0)]);
}

#[test]
fn test_partial_failure_reports_each_recipient() {
    let inbox = Inbox::new();
    let transport = Transports::with_defaults(&FactoryContext::default(), inbox.clone())
        .from_string("sms://memory?reject=%2B300")
        .unwrap();

    let message = Message::from(Sms::new().from("+100").to(["+200", "+300"]));
    let err = transport.send(&message, None).unwrap_err();

    assert!(err.is_recoverable());
    let result = err.result().unwrap();
    assert_eq!(result.successes()[0].recipient(), &Phone::new("+200"));
    assert_eq!(result.errors()[0].recipient(), &Phone::new("+300"));
    assert_eq!(result.errors()[0].code(), "rejected");
    assert_eq!(
        err.to_string(),
        "Unable to send an SMS for recipients:\n- +300: Recipient rejected (rejected)"
    );
    assert_eq!(inbox.len(), 1);
}

#[test]
fn test_zero_recipients_is_not_an_error() {
    let inbox = Inbox::new();
    let transport = Transports::with_defaults(&FactoryContext::default(), inbox.clone())
        .from_string("sms://memory")
        .unwrap();

    let message = Message::from(Sms::new().from("+100").text("Nobody"));
    assert!(transport.send(&message, None).unwrap().is_none());
    assert!(inbox.is_empty());
}
