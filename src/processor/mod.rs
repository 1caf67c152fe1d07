pub mod listing_processor;
pub mod text_scorer;
pub mod trend_analyzer;

pub use listing_processor::*;
pub use text_scorer::*;
pub use trend_analyzer::*;
