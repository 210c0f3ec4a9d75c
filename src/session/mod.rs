pub(crate) mod experience;
pub(crate) mod simulation;
