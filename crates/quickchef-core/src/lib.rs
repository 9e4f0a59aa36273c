//! Request coordination and caching for LLM-generated meal plans.
//!
//! ```text
//! consumer --obtain_plan(request)--> PlanCoordinator
//!                                        |  validate
//!                                        |  PlanCache (identity, 30 min TTL)
//!                                        |  in-flight map (one generation per identity)
//!                                        v
//!                            prompt + schema --> dyn Generator (Gemini)
//!                                        |
//!                            decode --> refine schedule --> cache
//! ```

pub mod cache;
pub mod calendar;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod generator;
pub mod identity;
pub mod model;
pub mod prompt;
pub mod schedule;
pub mod schema;
pub mod validate;

pub use cache::PlanCache;
pub use config::PlannerConfig;
pub use coordinator::PlanCoordinator;
pub use error::{GenerationError, PlanError, RescheduleError, SpliceError, ValidationError};
pub use generator::{GeminiGenerator, Generator};
pub use identity::{RequestIdentity, identity};
