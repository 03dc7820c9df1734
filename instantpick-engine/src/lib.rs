pub mod ajax;
pub mod history;
pub mod hot_cold;
pub mod payload;
pub mod pool;
pub mod rules;
pub mod sampler;
pub mod skip_hit;
pub mod strategy;
