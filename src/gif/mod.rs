pub(crate) mod patch;
