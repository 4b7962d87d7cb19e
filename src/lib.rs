pub mod api;
pub mod attendance;
pub mod config;
pub mod evaluation;
pub mod evaluation_view;
pub mod feed;
pub mod http_client;
pub mod month;
pub mod player_view;
pub mod rating;
pub mod roster;
pub mod roster_fetch;
pub mod skills;
pub mod state;
