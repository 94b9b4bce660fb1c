pub mod ad_handler;
pub mod search_handler;
pub mod tags_handler;
