pub mod allocator;
pub mod api;
pub mod bounds;
pub mod config;
pub mod constraints;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod materializer;
pub mod model;
pub mod parser;
pub mod scanner;
pub mod template;
pub mod text;
pub mod writer;

pub use allocator::{Allocation, PlaceholderToken, TokenStyle};
pub use api::{prepare_instance, prepare_template, ModelFile, PreparedTemplate};
pub use bounds::{Bound, BoundSet};
pub use config::{BoundsPolicy, Config, MaterializeOptions, PrepareOptions};
pub use error::{ParamForgeError, PfResult};
pub use format::FormatDescriptor;
pub use materializer::{Trial, TrialMaterializer, ValueMap};
pub use model::{Group, ParamId, ParameterRecord, UnitId};
pub use parser::ParsedFile;
pub use template::{TemplateContext, TemplateManifest};
