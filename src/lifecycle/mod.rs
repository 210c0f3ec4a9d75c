pub(crate) mod readiness;
