pub(crate) mod external;
pub(crate) mod filter;
pub(crate) mod mode;
pub(crate) mod motion;
pub(crate) mod paste;
pub(crate) mod photometric;
pub(crate) mod pipeline;
pub(crate) mod poisson;
