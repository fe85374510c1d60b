pub mod adjust;
pub mod export;
pub mod generate;
pub mod reorder;
pub mod retention;
pub mod task_ops;
