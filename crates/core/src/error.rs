use thiserror::Error;

use crate::model::UnitError;
use crate::reminder::SettingsError;
use crate::state::StateError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    State(#[from] StateError),
}
