//! `sms://null`: accepts everything, delivers nothing

use std::sync::Arc;

use smsgate_common::tracing;

use crate::{
    Dsn,
    error::{ResolveError, SendError},
    factory::{FactoryContext, TransportFactory},
    pipeline::{Deliver, PipelineTransport},
    result::SuccessResult,
    transport::{SentMessage, Transport},
};

const HOST: &str = "null";
const SCHEMES: &[&str] = &["sms"];

/// Records a success for every recipient
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDeliver;

impl Deliver for NullDeliver {
    fn name(&self) -> String {
        HOST.to_string()
    }

    fn has_required_sender(&self) -> bool {
        false
    }

    fn deliver(&self, sent: &mut SentMessage) -> Result<(), SendError> {
        let (_, envelope, result) = sent.parts_mut();

        for recipient in envelope.recipients() {
            tracing::trace!(%recipient, "Discarding message");
            result.add(SuccessResult::new(recipient.clone()));
        }

        Ok(())
    }
}

pub type NullTransport = PipelineTransport<NullDeliver>;

#[derive(Debug, Default, Clone)]
pub struct NullTransportFactory {
    context: FactoryContext,
}

impl NullTransportFactory {
    pub const fn new(context: FactoryContext) -> Self {
        Self { context }
    }
}

impl TransportFactory for NullTransportFactory {
    fn supports(&self, dsn: &Dsn) -> bool {
        dsn.host() == HOST
    }

    fn create(&self, dsn: &Dsn) -> Result<Arc<dyn Transport>, ResolveError> {
        if !SCHEMES.contains(&dsn.scheme()) {
            return Err(ResolveError::unsupported_scheme(dsn, SCHEMES));
        }

        Ok(Arc::new(self.context.pipeline(NullDeliver, dsn)?))
    }
}
