pub(crate) mod augment;
pub(crate) mod decode;
pub(crate) mod source;
pub(crate) mod splits;
