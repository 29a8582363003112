pub mod actor;
pub mod thing;
