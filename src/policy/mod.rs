//! Policy evaluation: operator matching, dotted-path lookup, invocation
//! gating, and result-side trust classification.

pub mod invocation;
pub mod operator;
pub mod path;
pub mod trusted_data;

pub use invocation::{evaluate, InvocationDecision, PolicyAction, ToolInvocationPolicy};
pub use operator::Operator;
pub use trusted_data::{classify, Classification, TrustedDataAction, TrustedDataPolicy};
