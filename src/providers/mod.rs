pub mod fred;
pub mod treasury;

pub use fred::FredProvider;
pub use treasury::TreasuryMtsProvider;
