//! # pathobuild_templates
//!
//! Build template parsing and expansion for pathobuild.
//!
//! A build template names its variables inside an identifier format string.
//! Expansion takes the Cartesian product of the variable values and produces
//! one concrete build per combination, keyed by the formatted identifier.
//!
//! ## Example
//!
//! ```rust
//! use pathobuild_templates::{BuildExpander, BuildTemplate, ExpandOptions};
//!
//! let template = BuildTemplate::new()
//!     .with("stem", "{virus}_{lineage}")
//!     .with("virus", vec!["flu"])
//!     .with("lineage", vec!["h3n2", "vic"])
//!     .with("reference", "refs/{lineage}.gb");
//!
//! let expander = BuildExpander::new(ExpandOptions::new().identifier_field("stem"));
//! let expansion = expander.expand(&[template]).unwrap();
//!
//! assert_eq!(expansion.identifiers().collect::<Vec<_>>(), vec!["flu_h3n2", "flu_vic"]);
//! assert_eq!(
//!     expansion.get("flu_vic").unwrap().get_str("reference"),
//!     Some("refs/vic.gb")
//! );
//! ```

pub mod error;
pub mod expander;
pub mod format;
pub mod loader;
pub mod template;

pub use error::{TemplateError, TemplateResult};
pub use expander::{
    prepare_builds, BuildExpander, Collision, ExpandOptions, Expansion, NonStringPolicy,
    TemplateFailure, VariablePolicy, DEFAULT_IDENTIFIER_FIELD,
};
pub use format::{format_template, parse_variables_from_template, TemplateString};
pub use loader::{TemplateFormat, TemplateLoader};
pub use template::{BuildConfig, BuildTemplate, FieldValue};
