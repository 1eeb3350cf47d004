//! Polku API: the opportunity matching and filtering service tier of the
//! competence-path application, plus the build-time translation-key
//! extractor shared by the `i18n-scan` binary.

pub mod backend;
pub mod codeset;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod matching;
pub mod models;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod stores;
