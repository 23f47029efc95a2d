mod ids;
mod topic;
mod unit;

pub use ids::{ParseUnitIdError, UnitId};
pub use topic::Topic;
pub use unit::{Unit, UnitDraft, UnitError, ValidatedUnit};
