// Selection store - synchronized cross-view selection

pub mod store;

pub use store::{Selection, SelectionChange, SelectionStore};
