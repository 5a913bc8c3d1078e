//! `sms://memory`: keeps delivered messages in a shared [`Inbox`]
//!
//! Recipients listed in the `reject` option are refused with the `rejected`
//! code, which makes the whole send a partial failure:
//!
//! ```text
//! sms://memory?reject=%2B100,%2B200
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use smsgate_common::{Envelope, Phone, Sms, outgoing};

use crate::{
    Dsn,
    api::{Api, ApiDeliver, ApiTransport},
    error::{ResolveError, SendError},
    factory::{FactoryContext, TransportFactory},
    result::{ErrorResult, SendResult, SuccessResult},
    transport::Transport,
};

const HOST: &str = "memory";
const SCHEMES: &[&str] = &["sms"];
const REJECT_OPTION: &str = "reject";

/// One accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub from: Phone,
    pub recipients: Vec<Phone>,
    pub sms: Sms,
}

/// Messages accepted by memory transports, shared between clones
#[derive(Debug, Default, Clone)]
pub struct Inbox(Arc<Mutex<Vec<Delivered>>>);

impl Inbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Delivered> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    fn push(&self, delivered: Delivered) {
        self.0.lock().push(delivered);
    }
}

#[derive(Debug)]
pub struct MemoryApi {
    inbox: Inbox,
    reject: Vec<Phone>,
}

impl MemoryApi {
    pub const fn new(inbox: Inbox, reject: Vec<Phone>) -> Self {
        Self { inbox, reject }
    }
}

impl ApiDeliver for MemoryApi {
    fn name(&self) -> String {
        HOST.to_string()
    }

    fn send_sms(
        &self,
        sms: &Sms,
        envelope: &Envelope,
        result: &mut SendResult,
    ) -> Result<(), SendError> {
        let from = envelope.from()?.clone();
        let mut accepted = Vec::with_capacity(envelope.recipients().len());

        for recipient in envelope.recipients() {
            if self.reject.contains(recipient) {
                result.add(ErrorResult::new(
                    recipient.clone(),
                    "Recipient rejected",
                    "rejected",
                ));
            } else {
                result.add(SuccessResult::new(recipient.clone()));
                accepted.push(recipient.clone());
            }
        }

        if !accepted.is_empty() {
            outgoing!("Stored message from {from} for {} recipient(s)", accepted.len());
            self.inbox.push(Delivered {
                from,
                recipients: accepted,
                sms: sms.clone(),
            });
        }

        Ok(())
    }
}

pub type MemoryTransport = ApiTransport<MemoryApi>;

#[derive(Debug, Default, Clone)]
pub struct MemoryTransportFactory {
    context: FactoryContext,
    inbox: Inbox,
}

impl MemoryTransportFactory {
    /// Every transport created by this factory stores into `inbox`
    pub const fn new(context: FactoryContext, inbox: Inbox) -> Self {
        Self { context, inbox }
    }

    pub const fn inbox(&self) -> &Inbox {
        &self.inbox
    }
}

impl TransportFactory for MemoryTransportFactory {
    fn supports(&self, dsn: &Dsn) -> bool {
        dsn.host() == HOST
    }

    fn create(&self, dsn: &Dsn) -> Result<Arc<dyn Transport>, ResolveError> {
        if !SCHEMES.contains(&dsn.scheme()) {
            return Err(ResolveError::unsupported_scheme(dsn, SCHEMES));
        }

        let reject = dsn
            .option(REJECT_OPTION)
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(Phone::new)
            .collect();

        let api = MemoryApi::new(self.inbox.clone(), reject);
        Ok(Arc::new(self.context.pipeline(Api::new(api), dsn)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use smsgate_common::{EnvelopeError, Message};

    use super::*;
    use crate::error::FatalError;

    fn transport(dsn: &str) -> (Arc<dyn Transport>, Inbox) {
        let factory = MemoryTransportFactory::default();
        let transport = factory.create(&dsn.parse().unwrap()).unwrap();
        (transport, factory.inbox().clone())
    }

    #[test]
    fn test_stores_delivered_message() {
        let (transport, inbox) = transport("sms://memory");
        assert!(transport.has_required_sender());

        let sms = Sms::new().from("+100").to(["+200"]).text("Hello");
        let sent = transport
            .send(&Message::from(sms.clone()), None)
            .unwrap()
            .unwrap();

        assert!(sent.result().transport().ends_with("MemoryApi"));
        assert_eq!(
            inbox.messages(),
            vec![Delivered {
                from: Phone::new("+100"),
                recipients: vec![Phone::new("+200")],
                sms,
            }]
        );
    }

    #[test]
    fn test_rejected_recipients() {
        let (transport, inbox) = transport("sms://memory?reject=%2B200,%2B300");
        let message = Message::from(Sms::new().from("+100").to(["+200", "+400"]));

        let err = transport.send(&message, None).unwrap_err();
        let result = err.result().unwrap();

        assert_eq!(result.successes().len(), 1);
        assert_eq!(result.errors()[0].code(), "rejected");
        assert_eq!(inbox.messages()[0].recipients, vec![Phone::new("+400")]);
    }

    #[test]
    fn test_missing_sender_is_fatal() {
        let (transport, inbox) = transport("sms://memory");
        let message = Message::from(Sms::new().to(["+200"]));

        let err = transport.send(&message, None).unwrap_err();
        assert!(matches!(
            err,
            SendError::Fatal(FatalError::Envelope(EnvelopeError::UnknownSender))
        ));
        assert!(inbox.is_empty());
    }
}
