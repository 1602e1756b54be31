// Technical indicators
pub mod bollinger;
