pub(crate) mod cancel;
pub(crate) mod job;
pub(crate) mod orchestrator;
