mod common;
mod config_loading;
mod token_refresh_and_retry;
