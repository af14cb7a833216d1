//! Ownership lists for posterm
//!
//! Every collection in the terminal engine (layers, layer objects, list
//! items) lives in one of these containers. A list owns what is inserted into
//! it: dropping or purging the list drops the elements, and unlinking an
//! element hands ownership back to the caller.
//!
//! Link fields are kept in an arena owned by the list rather than on the
//! payload type, so any `T` can be stored. Elements are addressed by
//! generational [`NodeId`] handles that are tagged with the owning list.

mod arena;
pub mod dlist;
pub mod slist;

pub use arena::NodeId;
pub use dlist::DList;
pub use slist::SList;
