pub mod daily_ops;
pub mod move_ops;
pub mod section_ops;
pub mod undo;
