pub mod check_config;
pub mod inspect;
pub mod search;
