pub(crate) mod lights;
pub(crate) mod serve;
