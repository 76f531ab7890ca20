pub mod description;

pub use description::DescriptionLoader;
