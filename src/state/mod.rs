//! Reactive keyed state shared between fetch logic and render functions.

mod sequence;
mod store;
mod value;

pub use sequence::{FetchTicket, QuerySlot};
pub use store::{StateMap, Store, Subscriber, Subscription};
pub use value::{RowMap, Rows, StateValue};
