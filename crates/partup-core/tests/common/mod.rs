pub mod flaky_stream;
pub mod recording_session;
