pub mod baggage;
pub mod cancellation;
pub mod compensation;
pub mod executor;
pub mod faq;
pub mod flight_status;
pub mod registry;
pub mod schema;
pub mod seat;

pub use baggage::{BaggageInfo, FileBaggageClaim};
pub use cancellation::CancelFlight;
pub use compensation::{IssueVoucher, OpenCompensationCase};
pub use executor::{ActionExecutor, ActionOutcome};
pub use faq::FaqLookup;
pub use flight_status::FlightStatus;
pub use registry::{parse_args, Action, ActionError, ActionRegistry, ActionSpec};
pub use schema::args_schema;
pub use seat::{DisplaySeatMap, UpdateSeat};
