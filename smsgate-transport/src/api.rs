//! Adapter for backends that talk to an HTTP-style SMS API
//!
//! Such backends only understand structured messages and report one outcome
//! per recipient. Any per-recipient error turns the whole send into a
//! [`TransportResultError`], even when other recipients went through.

use std::fmt::Debug;

use smsgate_common::{Envelope, Message, Sms, outgoing};

use crate::{
    error::{InvalidArgument, SendError, TransportError, TransportResultError},
    pipeline::Deliver,
    result::SendResult,
    transport::SentMessage,
};

/// The wire call of an API backend
pub trait ApiDeliver: Send + Sync + Debug {
    fn name(&self) -> String;

    fn has_required_sender(&self) -> bool {
        true
    }

    /// Send `sms` to every recipient of `envelope`, recording each outcome
    ///
    /// # Errors
    ///
    /// A failure of the call as a whole; per-recipient failures belong in
    /// `result` instead.
    fn send_sms(
        &self,
        sms: &Sms,
        envelope: &Envelope,
        result: &mut SendResult,
    ) -> Result<(), SendError>;
}

/// Turns an [`ApiDeliver`] into a [`Deliver`]
#[derive(Debug)]
pub struct Api<A>(pub A);

impl<A: ApiDeliver> Api<A> {
    pub const fn new(api: A) -> Self {
        Self(api)
    }

    pub const fn inner(&self) -> &A {
        &self.0
    }
}

impl<A: ApiDeliver> Deliver for Api<A> {
    fn name(&self) -> String {
        self.0.name()
    }

    fn has_required_sender(&self) -> bool {
        self.0.has_required_sender()
    }

    fn identity(&self) -> &'static str {
        std::any::type_name::<A>()
    }

    fn deliver(&self, sent: &mut SentMessage) -> Result<(), SendError> {
        let (message, envelope, result) = sent.parts_mut();

        let Message::Structured(sms) = message else {
            return Err(TransportError::UnsupportedMessage {
                transport: self.0.name(),
                source: InvalidArgument(format!(
                    "The message must be an Sms ({} message given).",
                    message.kind()
                )),
            }
            .into());
        };

        self.0.send_sms(sms, envelope, result)?;

        if result.has_errors() {
            outgoing!(
                level = WARN,
                "{} of {} recipient(s) failed via {}",
                result.errors().len(),
                envelope.recipients().len(),
                self.0.name()
            );
            return Err(TransportResultError::new(result.clone()).into());
        }

        Ok(())
    }
}

/// A pipeline transport around an API backend
pub type ApiTransport<A> = crate::pipeline::PipelineTransport<Api<A>>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use smsgate_common::{Phone, RawMessage};

    use super::*;
    use crate::{
        pipeline::PipelineTransport,
        result::{ErrorResult, SuccessResult},
        transport::Transport,
    };

    /// Rejects every recipient ending in `0`
    #[derive(Debug)]
    struct Picky;

    impl ApiDeliver for Picky {
        fn name(&self) -> String {
            "picky".to_string()
        }

        fn send_sms(
            &self,
            _sms: &Sms,
            envelope: &Envelope,
            result: &mut SendResult,
        ) -> Result<(), SendError> {
            for recipient in envelope.recipients() {
                if recipient.ends_with('0') {
                    result.add(ErrorResult::new(recipient.clone(), "Refused", "refused"));
                } else {
                    result.add(SuccessResult::new(recipient.clone()));
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_raw_message_is_rejected() {
        let transport = PipelineTransport::new(Api::new(Picky));
        let envelope = Envelope::new("+1", ["+2"]);

        let err = transport
            .send(&Message::from(RawMessage::from("payload")), Some(&envelope))
            .unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            r#"Unable to send message with the "picky" transport: The message must be an Sms (raw message given)."#
        );
    }

    #[test]
    fn test_all_recipients_accepted() {
        let transport: ApiTransport<Picky> = PipelineTransport::new(Api::new(Picky));
        let message = Message::from(Sms::new().from("+1").to(["+21", "+31"]));

        let sent = transport.send(&message, None).unwrap().unwrap();
        assert_eq!(sent.result().successes().len(), 2);
        assert!(sent.result().transport().ends_with("Picky"));
    }

    #[test]
    fn test_partial_failure_carries_result() {
        let transport = PipelineTransport::new(Api::new(Picky));
        let message = Message::from(Sms::new().from("+1").to(["+21", "+30"]));

        let err = transport.send(&message, None).unwrap_err();
        let result = err.result().unwrap();

        assert_eq!(result.successes()[0].recipient(), &Phone::new("+21"));
        assert_eq!(result.errors()[0].recipient(), &Phone::new("+30"));
        assert_eq!(
            err.to_string(),
            "Unable to send an SMS for recipients:\n- +30: Refused (refused)"
        );
    }
}
