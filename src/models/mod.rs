pub mod detection;
pub mod image;
pub mod language;
pub mod search;
pub mod word;
