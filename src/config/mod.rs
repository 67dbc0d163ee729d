//! Pipeline configuration
//!
//! Loads YAML pipeline files: named APIs, sources, targets, validation
//! rule sets, transform pipelines and jobs. `${NAME}` tokens are
//! substituted before the file is interpreted.
//!
//! # Example
//!
//! ```yaml
//! name: demo
//! vars:
//!   BASE: https://api.example.com
//! apis:
//!   example:
//!     base_url: ${BASE}
//!     endpoints:
//!       users: { path: /users, pagination: { type: page, page_size: 50 } }
//! sources:
//!   - { name: users, type: api, api: example, endpoint: users }
//! targets:
//!   - { name: out, type: file, path: out/users.json }
//! jobs:
//!   - name: sync
//!     extract: { source: users }
//!     load: { target: out }
//! ```

mod parser;
mod resolve;
mod template;
mod types;

pub use parser::{load_pipeline, load_pipeline_with_env, parse_pipeline, DEFAULT_CONFIG_PATH};
pub use resolve::ResolvedValidation;
pub use template::{has_tokens, token_names, Variables};
pub use types::{
    ApiConfig, EndpointConfig, ExtractOptions, ExtractRef, JobConfig, LoadOverrides, LoadRef,
    PipelineConfig, SourceConfig, TargetConfig, TransformRef, ValidationRef,
};

#[cfg(test)]
mod tests;
