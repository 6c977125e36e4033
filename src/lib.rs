// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the search commands.
//
// Module responsibilities:
// - `api`: Encapsulates HTTP interactions with the trace.moe search
//   service (multipart file upload, URL search) and the response model.
// - `ui`: Implements the terminal presentation: spinner, cursor handling,
//   interrupt cleanup and colored rendering of the best match.
//
// Keeping this separation makes it possible to test the API logic against
// a local HTTP fixture without driving a terminal.
pub mod api;
pub mod ui;
