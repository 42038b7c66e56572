pub mod counters;
pub mod debug_routes;
pub mod plan;
pub mod points;
pub mod portal;
pub mod rollback;
pub mod run;
