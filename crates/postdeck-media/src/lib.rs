mod storage;

pub use storage::{MediaStorage, StoredObject};
