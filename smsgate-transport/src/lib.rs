//! Transport resolution and delivery routing for smsgate
//!
//! ```text
//! "sms://a || sms://b"  --Transports::from_string-->  FailoverTransport
//!                                                     +- PipelineTransport<A>
//!                                                     +- PipelineTransport<B>
//! ```
//!
//! Every leaf transport runs the shared [`pipeline`]; composite [`router`]s
//! rotate or fail over between them.

pub mod api;
pub mod backends;
pub mod clock;
pub mod dsn;
pub mod error;
pub mod factory;
pub mod hooks;
pub mod pipeline;
pub mod resolver;
pub mod result;
pub mod router;
pub mod throttle;
pub mod transport;

pub use api::{Api, ApiDeliver, ApiTransport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dsn::Dsn;
pub use error::{
    DsnError, FatalError, InvalidArgument, ResolveError, SendError, TransportError,
    TransportResultError,
};
pub use factory::{FactoryContext, TransportFactory};
pub use hooks::{DefaultHeaders, HookChain, MessageHooks, NoHooks};
pub use pipeline::{Deliver, PipelineTransport};
pub use resolver::Transports;
pub use result::{ErrorResult, ResultItem, SendResult, SuccessResult};
pub use router::{FailoverTransport, RoundRobinTransport, RouterState};
pub use throttle::Throttle;
pub use transport::{SentMessage, Transport};
