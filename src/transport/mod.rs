pub(crate) mod dual;
pub(crate) mod handle;
pub(crate) mod segment;
pub(crate) mod sim;
