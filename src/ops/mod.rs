pub mod item_ops;
