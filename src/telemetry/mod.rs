pub mod source;

pub use source::{
    DelimitedFileSource, DelimitedFormat, SampleSource, VecSource, dedup_timestamps,
    read_delimited, write_delimited,
};
