pub use dense_slot_map::DenseSlotMap;
pub use slot::Slot;
pub use sparse_slot_map::SparseSlotMap;

pub mod dense_slot_map;
pub mod slot;
pub mod sparse_slot_map;

