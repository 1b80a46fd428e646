pub mod importance;
pub mod json;
pub mod kinds;
pub mod onboarding;
pub mod profile_facts;
pub mod text;

pub use kinds::{MemoryType, ParseKindError, ResponderKind};
