pub mod delta;
pub mod health;
pub mod indexes;
pub mod matching;
pub mod positions;
pub mod ranking;
