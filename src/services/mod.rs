pub mod detection_gateway;
pub mod detection_service;
pub mod dictionary_gateway;
pub mod http;
pub mod translation_gateway;
pub mod word_service;

#[cfg(test)]
pub(crate) mod test_support;
