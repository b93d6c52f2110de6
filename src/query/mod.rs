mod filter;
mod pagination;

pub use filter::{build_filter, Condition, Filter, Ordering, Predicate, SortDirection};
pub use pagination::Page;
