//! Tool-calling mediation for FinSight.
//!
//! This crate owns the contract between free-text financial questions and
//! the two structured retrievals the assistant can perform:
//!
//! - **Tool catalog**: the two fixed declarations and the closed invocation
//!   variant parsed from the model's selection
//! - **Mediator**: the two-round protocol of constrained tool selection,
//!   dispatch, then unconstrained answer synthesis

pub mod error;
pub mod mediator;
pub mod tools;

pub use error::{AdvisorError, ContractViolation};
pub use mediator::Mediator;
pub use tools::{FINANCIAL_INFO_TOOL, STOCK_PRICE_TOOL, ToolInvocation, declarations};
