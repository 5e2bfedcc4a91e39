//! Filter modules compiled into the crate.

pub mod string;

use strum::{Display, EnumIter, EnumString};

use crate::descriptor::Registration;

/// Module references available in every [`crate::ModuleCatalog::builtin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BuiltinModule {
    String,
}

impl BuiltinModule {
    #[must_use]
    pub fn registration(self) -> Registration {
        match self {
            Self::String => string::registration(),
        }
    }
}
