pub mod catalog;
pub mod config;
pub mod error;
pub mod features;
pub mod fuzzy;
pub mod index;
pub mod persist;
pub mod poster;
pub mod rank;
pub mod recommend;
pub mod resolve;
pub mod tokenizer;

pub use catalog::{Catalog, Item, RawRecord};
pub use config::RecommenderConfig;
pub use error::{ConfigError, IndexError, RecommendError};
pub use index::VectorIndex;
pub use recommend::{Recommendation, Recommendations, Recommender, SharedRecommender};

pub type TermId = u32;
pub type ItemId = u32;
