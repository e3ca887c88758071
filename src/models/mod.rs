pub mod row;
pub mod table;

pub use row::{Cell, CollisionPolicy, FieldMap, Row, COLLECT_SEPARATOR};
pub use table::BatchTable;
