//! Component storage: generational handles and fixed-capacity tables.
//!
//! Every component kind lives in its own [`ComponentTable`], owned by the
//! scene rather than by process-wide statics, so multiple scenes can coexist
//! and tests get deterministic teardown.

pub mod handle;
pub mod table;

pub use handle::Handle;
pub use table::ComponentTable;
