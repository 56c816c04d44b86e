//! Request validation subsystem.
//!
//! # Data Flow
//! ```text
//! JSON body
//!     → pipeline.rs (Valid<T> extractor, fixed strict policy)
//!     → shape.rs (declared fields of T: names, kinds, required)
//!     → registry.rs (application rules, then built-ins; unknown rule rejects)
//!     → T handed to the handler, or 400 with every problem listed
//! ```

pub mod pipeline;
pub mod registry;
pub mod shape;

pub use pipeline::{Valid, ValidationPipeline, ValidationPolicy, ValidationRejection};
pub use registry::{FieldValidator, ValidatorRegistry};
pub use shape::{FieldKind, FieldSpec, RequestShape};
