pub mod mutation_planner;
pub mod path_service;
pub mod plan_limits;
