//! Interception layer: derived reads and validated writes over a plain
//! attribute store.
//!
//! [`Intercepted`] owns an [`AttributeStore`] and sends every `get`/`set`
//! through an [`InterceptPolicy`]. Policies compute virtual fields
//! ([`CompositeField`]), refuse writes ([`LowerBound`], [`Validate`]),
//! observe access ([`AccessLog`]) or combine ([`PolicyChain`]).
//!
//! A refused write is a normal outcome: `set` returns `false`, logs at
//! `warn`, and the target keeps its prior value.

pub mod layer;
pub mod policy;
pub mod store;

pub use layer::Intercepted;
pub use policy::{
    AccessLog, CompositeField, InterceptPolicy, LowerBound, PassThrough, PolicyChain, SetAction,
    Validate,
};
pub use store::AttributeStore;
