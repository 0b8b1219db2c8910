pub mod duplicate_group;
