//! Form understanding and filling: extraction, label resolution, value
//! matching, format normalization and the fill engine.

pub mod extractor;
pub mod field_model;
pub mod fill;
pub mod label;
pub mod matcher;
pub mod normalize;

pub use extractor::extract_fields;
pub use field_model::{FieldDescriptor, FieldKind, FillInstruction, FillMapping, FillValue, SelectOption};
pub use fill::{FillReport, fill_document, inject_fill};
pub use label::resolve_label;
pub use matcher::{MatchOptions, apply_value};
pub use normalize::{DateOrder, normalize_date, normalize_time};
