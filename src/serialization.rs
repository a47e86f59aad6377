//! Binary encoding of finished feature tables.
//!
//! `prepare` writes each [`FeatureTable`](crate::pipeline::FeatureTable) as
//! bincode next to its CSV so `split` and the model process can reload the
//! exact columns, kinds and missing values without re-parsing text.

use std::error::Error;

/// Plain-data values with a bincode byte form.
pub trait BinaryEncoding: Sized {
    type Error: Error + Send + Sync + 'static;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> BinaryEncoding for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}
