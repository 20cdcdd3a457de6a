pub mod results;

pub use results::{SearchResultSet, Source};
