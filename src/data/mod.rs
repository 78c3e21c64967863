pub mod detection_repository;
pub mod image_repository;
pub mod migrations;
pub mod preferences_repository;
pub mod search_repository;
pub mod word_repository;
