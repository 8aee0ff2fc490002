//! Result fragment reading
//!
//! Discovers and parses the per-worker result files a run leaves behind.

mod reader;

pub use reader::{
    is_result_file, worker_id, FragmentReader, ReadError, WorkerIdPolicy, RESULT_FILE_TOKEN,
};
