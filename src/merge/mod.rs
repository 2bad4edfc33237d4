pub(crate) mod merger;
