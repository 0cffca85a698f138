//! Search module options: FT.AGGREGATE pipelines and cursors.

mod aggregate;
mod cursor;
mod load;
mod operation;
mod param;

pub use aggregate::{AggregateOptions, AggregateOptionsBuilder};
pub use cursor::CursorOptions;
pub use load::{LOAD_ALL_IDENTIFIER, Load, LoadBuilder, Loads};
pub use operation::{
    AggregateOperation, Apply, Filter, Group, Limit, Order, ReduceFunction, Reducer, SortBy,
};
pub use param::{Parameter, Params};
