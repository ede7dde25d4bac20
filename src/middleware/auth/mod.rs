pub mod access;
pub mod exclusion;

pub use access::AuthError;
pub use exclusion::ExclusionRules;
